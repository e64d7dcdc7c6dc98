//! Message types for the consumer.
//!
//! Defines the route network edit operations read from the event log. Batches
//! are JSON documents with camelCase field names; each route network event is
//! tagged by its `eventType` field.

use serde::Deserialize;

/// Naming information attached to a route network element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single edit against the route network.
///
/// Only the kinds relevant to the route node index are decoded; every other
/// `eventType` becomes [`RouteNetworkEvent::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "eventType", rename_all_fields = "camelCase")]
pub enum RouteNetworkEvent {
    /// A route node was added to the network.
    RouteNodeAdded {
        node_id: String,
        #[serde(default)]
        naming_info: Option<NamingInfo>,
    },
    /// A route node was marked for deletion.
    RouteNodeMarkedForDeletion { node_id: String },
    /// The naming info of some aggregate changed.
    NamingInfoModified {
        aggregate_type: String,
        aggregate_id: String,
        #[serde(default)]
        naming_info: Option<NamingInfo>,
    },
    /// Any event kind the indexer does not project.
    #[serde(other)]
    Unknown,
}

impl RouteNetworkEvent {
    /// The event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RouteNodeAdded { .. } => "RouteNodeAdded",
            Self::RouteNodeMarkedForDeletion { .. } => "RouteNodeMarkedForDeletion",
            Self::NamingInfoModified { .. } => "NamingInfoModified",
            Self::Unknown => "Unknown",
        }
    }

    /// Id of the aggregate the event applies to, for logging.
    pub fn aggregate_id(&self) -> Option<&str> {
        match self {
            Self::RouteNodeAdded { node_id, .. }
            | Self::RouteNodeMarkedForDeletion { node_id } => Some(node_id),
            Self::NamingInfoModified { aggregate_id, .. } => Some(aggregate_id),
            Self::Unknown => None,
        }
    }
}

/// A command issued by a user, producing an ordered list of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNetworkCommand {
    #[serde(default)]
    pub cmd_type: Option<String>,
    #[serde(default)]
    pub cmd_id: Option<String>,
    #[serde(default)]
    pub route_network_events: Vec<RouteNetworkEvent>,
}

/// One entry of the event log: an edit operation and the commands it ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNetworkEditOperation {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub event_timestamp: Option<String>,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub work_task_mrid: Option<String>,
    #[serde(default)]
    pub route_network_commands: Vec<RouteNetworkCommand>,
}

impl RouteNetworkEditOperation {
    /// Build an operation holding a single command with the given events.
    pub fn from_events(events: Vec<RouteNetworkEvent>) -> Self {
        Self {
            route_network_commands: vec![RouteNetworkCommand {
                route_network_events: events,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Decode an operation from its JSON wire form.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// All events of the operation, commands in order, then events in order.
    pub fn events(&self) -> impl Iterator<Item = &RouteNetworkEvent> {
        self.route_network_commands
            .iter()
            .flat_map(|command| command.route_network_events.iter())
    }

    /// Number of events across all commands.
    pub fn event_count(&self) -> usize {
        self.route_network_commands
            .iter()
            .map(|command| command.route_network_events.len())
            .sum()
    }
}
