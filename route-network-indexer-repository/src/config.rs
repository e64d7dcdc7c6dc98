//! Collection naming for versioned index generations.

use uuid::Uuid;

use crate::errors::SearchIndexError;

/// Configuration for the route node collections.
///
/// Every process start builds a new collection generation named
/// `<alias>-<generation id>`. Readers only ever query the alias, which is
/// repointed once a generation has been fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    /// The stable alias name queried by readers.
    pub alias: String,
}

impl CollectionConfig {
    /// Create a new collection configuration.
    ///
    /// The alias must be non-empty and lowercase, since OpenSearch rejects
    /// index and alias names containing uppercase characters.
    ///
    /// # Arguments
    ///
    /// * `alias` - The alias name
    ///
    /// # Returns
    ///
    /// * `Ok(CollectionConfig)` - A valid configuration
    /// * `Err(SearchIndexError)` - If the alias is invalid
    pub fn new(alias: impl Into<String>) -> Result<Self, SearchIndexError> {
        let alias = alias.into();
        if alias.trim().is_empty() {
            return Err(SearchIndexError::validation("alias is required"));
        }
        if alias.chars().any(|c| c.is_uppercase() || c.is_whitespace()) {
            return Err(SearchIndexError::validation(format!(
                "alias '{}' must be lowercase and contain no whitespace",
                alias
            )));
        }
        Ok(Self { alias })
    }

    /// The prefix shared by every generation of this alias.
    pub fn generation_prefix(&self) -> String {
        format!("{}-", self.alias)
    }

    /// Name of the generation with the given id.
    pub fn generation_name(&self, generation_id: Uuid) -> String {
        format!("{}{}", self.generation_prefix(), generation_id)
    }

    /// Name for a brand-new generation.
    pub fn new_generation(&self) -> String {
        self.generation_name(Uuid::new_v4())
    }

    /// Whether a collection name belongs to a generation of this alias.
    pub fn is_generation(&self, collection: &str) -> bool {
        collection.starts_with(&self.generation_prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_name() {
        let config = CollectionConfig::new("route-nodes").unwrap();
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();

        assert_eq!(
            config.generation_name(id),
            "route-nodes-550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_new_generations_are_unique() {
        let config = CollectionConfig::new("route-nodes").unwrap();

        let first = config.new_generation();
        let second = config.new_generation();

        assert_ne!(first, second);
        assert!(config.is_generation(&first));
        assert!(config.is_generation(&second));
    }

    #[test]
    fn test_is_generation() {
        let config = CollectionConfig::new("route-nodes").unwrap();

        assert!(config.is_generation("route-nodes-a"));
        assert!(!config.is_generation("route-nodes"));
        assert!(!config.is_generation("route-segments-a"));
        assert!(!config.is_generation(".kibana"));
    }

    #[test]
    fn test_invalid_alias() {
        assert!(matches!(
            CollectionConfig::new(""),
            Err(SearchIndexError::ValidationError(_))
        ));
        assert!(matches!(
            CollectionConfig::new("RouteNodes"),
            Err(SearchIndexError::ValidationError(_))
        ));
        assert!(matches!(
            CollectionConfig::new("route nodes"),
            Err(SearchIndexError::ValidationError(_))
        ));
    }
}
