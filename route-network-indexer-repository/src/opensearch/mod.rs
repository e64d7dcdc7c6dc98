//! OpenSearch implementation of the search index provider.
//!
//! Collections map to OpenSearch indices and the collection alias maps to an
//! OpenSearch index alias.

mod index_config;
mod provider;

pub use index_config::get_index_settings;
pub use provider::OpenSearchProvider;
