//! Route node processor implementation.
//!
//! Translates one route network event into at most one mutation of the route
//! node index. The processor is pure: it performs no I/O.

use crate::consumer::{NamingInfo, RouteNetworkEvent};
use route_network_indexer_shared::RouteNodeDocument;

/// Aggregate type of route nodes in `NamingInfoModified` events, compared
/// case-insensitively.
const ROUTE_NODE_AGGREGATE_TYPE: &str = "routenode";

/// A mutation of the route node index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentMutation {
    /// Create a new document.
    Create(RouteNodeDocument),
    /// Create the document or replace an existing one.
    Upsert(RouteNodeDocument),
    /// Delete the document with the given id.
    Delete { id: String },
}

impl DocumentMutation {
    /// The id of the document the mutation targets.
    pub fn document_id(&self) -> &str {
        match self {
            Self::Create(doc) | Self::Upsert(doc) => doc.document_id(),
            Self::Delete { id } => id,
        }
    }
}

/// The trimmed name, or `None` when the name is absent, empty or whitespace.
///
/// This is the single place deciding whether a node has a searchable name.
pub fn normalized_name(naming_info: Option<&NamingInfo>) -> Option<String> {
    naming_info
        .and_then(|info| info.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Processor that maps route network events onto index mutations.
///
/// - Nodes without a name are never indexed.
/// - A node losing its name is removed from the index (a tombstone), so it is
///   no longer searchable.
/// - Naming changes of aggregates other than route nodes are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteNodeProcessor;

impl RouteNodeProcessor {
    /// Create a new route node processor.
    pub fn new() -> Self {
        Self
    }

    /// Map a single event onto zero or one mutation.
    pub fn process_event(&self, event: &RouteNetworkEvent) -> Option<DocumentMutation> {
        match event {
            RouteNetworkEvent::RouteNodeAdded {
                node_id,
                naming_info,
            } => normalized_name(naming_info.as_ref())
                .map(|name| DocumentMutation::Create(RouteNodeDocument::new(node_id, name))),
            RouteNetworkEvent::RouteNodeMarkedForDeletion { node_id } => {
                Some(DocumentMutation::Delete {
                    id: node_id.clone(),
                })
            }
            RouteNetworkEvent::NamingInfoModified {
                aggregate_type,
                aggregate_id,
                naming_info,
            } => {
                if !aggregate_type.eq_ignore_ascii_case(ROUTE_NODE_AGGREGATE_TYPE) {
                    return None;
                }
                Some(match normalized_name(naming_info.as_ref()) {
                    Some(name) => DocumentMutation::Upsert(RouteNodeDocument::new(aggregate_id, name)),
                    None => DocumentMutation::Delete {
                        id: aggregate_id.clone(),
                    },
                })
            }
            RouteNetworkEvent::Unknown => None,
        }
    }
}
