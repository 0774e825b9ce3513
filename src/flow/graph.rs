//! Pure graph operations over a [`ScreenFlow`].
//!
//! Every operation takes the current flow by reference and returns a new
//! flow value (or the error from the taxonomy in [`crate::error`]). The
//! authoritative flow always lives with the owning collaborator; nothing
//! here keeps hidden state, so operations are safe to replay on stale data.

use std::collections::HashSet;

use crate::error::GraphError;
use crate::flow::model::{BoundingBox, Connection, NodePosition, Screen, ScreenFlow, ScreenNode};

/// Appends a new node for `screen_id` with a fresh id. The first node added
/// to an empty flow becomes the start node.
///
/// Duplicate screens are accepted here: "one node per screen" is an editor
/// policy, enforced where the screen picker lives, not a graph invariant.
pub fn add_screen_node(
    flow: &ScreenFlow,
    screen_id: &str,
    position: Option<NodePosition>,
) -> ScreenFlow {
    let mut next = flow.clone();
    let node = ScreenNode {
        id: next_node_id(flow),
        screen_id: screen_id.to_string(),
        position: position.unwrap_or_default(),
    };
    tracing::debug!(flow = %flow.id, node = %node.id, screen = screen_id, "add screen node");
    if next.screens.is_empty() {
        next.start_screen_id = Some(node.id.clone());
    }
    next.screens.push(node);
    next
}

/// Removes a node and every connection touching it. If the removed node was
/// the start node, the first remaining node becomes the start (or the start
/// is unset when the flow is now empty). Removing an unknown node is a
/// no-op, so stale delete gestures are harmless.
pub fn remove_screen_node(flow: &ScreenFlow, node_id: &str) -> ScreenFlow {
    if !flow.contains_node(node_id) {
        return flow.clone();
    }
    let mut next = flow.clone();
    next.screens.retain(|n| n.id != node_id);
    next.connections
        .retain(|c| c.from != node_id && c.to != node_id);
    if next.start_screen_id.as_deref() == Some(node_id) {
        next.start_screen_id = next.screens.first().map(|n| n.id.clone());
    }
    tracing::debug!(flow = %flow.id, node = node_id, "remove screen node");
    next
}

/// Adds a directed connection between two existing nodes.
pub fn add_connection(
    flow: &ScreenFlow,
    from_node_id: &str,
    to_node_id: &str,
    label: Option<&str>,
) -> Result<ScreenFlow, GraphError> {
    if !flow.contains_node(from_node_id) {
        return Err(GraphError::InvalidNodeReference(from_node_id.to_string()));
    }
    if !flow.contains_node(to_node_id) {
        return Err(GraphError::InvalidNodeReference(to_node_id.to_string()));
    }
    let mut next = flow.clone();
    let connection = Connection {
        id: next_connection_id(flow),
        from: from_node_id.to_string(),
        to: to_node_id.to_string(),
        label: label.map(str::to_string),
        interaction_area: None,
    };
    tracing::debug!(
        flow = %flow.id,
        connection = %connection.id,
        from = from_node_id,
        to = to_node_id,
        "add connection"
    );
    next.connections.push(connection);
    Ok(next)
}

/// Removes a connection if present; removing an unknown id is a no-op.
pub fn remove_connection(flow: &ScreenFlow, connection_id: &str) -> ScreenFlow {
    let mut next = flow.clone();
    next.connections.retain(|c| c.id != connection_id);
    next
}

/// Replaces a connection's label. An empty label clears it.
pub fn relabel_connection(
    flow: &ScreenFlow,
    connection_id: &str,
    label: &str,
) -> Result<ScreenFlow, GraphError> {
    let mut next = flow.clone();
    let connection = next
        .connections
        .iter_mut()
        .find(|c| c.id == connection_id)
        .ok_or_else(|| GraphError::InvalidConnectionReference(connection_id.to_string()))?;
    connection.label = if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    };
    Ok(next)
}

/// Attaches a normalized interaction hotspot to a connection.
pub fn set_interaction_area(
    flow: &ScreenFlow,
    connection_id: &str,
    area: BoundingBox,
) -> Result<ScreenFlow, GraphError> {
    let mut next = flow.clone();
    let connection = next
        .connections
        .iter_mut()
        .find(|c| c.id == connection_id)
        .ok_or_else(|| GraphError::InvalidConnectionReference(connection_id.to_string()))?;
    tracing::debug!(flow = %flow.id, connection = connection_id, "set interaction area");
    connection.interaction_area = Some(area);
    Ok(next)
}

/// Designates an existing node as the flow's entry point.
pub fn set_start_screen(flow: &ScreenFlow, node_id: &str) -> Result<ScreenFlow, GraphError> {
    if !flow.contains_node(node_id) {
        return Err(GraphError::InvalidNodeReference(node_id.to_string()));
    }
    let mut next = flow.clone();
    next.start_screen_id = Some(node_id.to_string());
    Ok(next)
}

/// Pure position update; no change to the graph shape. Moving an unknown
/// node is a no-op.
pub fn move_node(flow: &ScreenFlow, node_id: &str, position: NodePosition) -> ScreenFlow {
    let mut next = flow.clone();
    if let Some(node) = next.screens.iter_mut().find(|n| n.id == node_id) {
        node.position = position;
    }
    next
}

fn next_node_id(flow: &ScreenFlow) -> String {
    format!("node_{}", next_index(flow.screens.iter().map(|n| n.id.as_str()), "node_"))
}

fn next_connection_id(flow: &ScreenFlow) -> String {
    format!(
        "conn_{}",
        next_index(flow.connections.iter().map(|c| c.id.as_str()), "conn_")
    )
}

// Ids are derived from the flow contents rather than a counter so the
// operations stay pure; the max numeric suffix + 1 is unique for the
// lifetime of the editing session.
fn next_index<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u32 {
    ids.filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .map(|n| n + 1)
        .max()
        .unwrap_or(0)
}

/// A broken invariant found in a persisted flow.
///
/// Flows mutated exclusively through this module cannot violate the first
/// four; they show up when documents are edited by hand or written by older
/// tooling. An unknown screen reference is the one non-fatal case: the
/// editor renders such nodes degraded instead of rejecting the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    DanglingConnection {
        connection_id: String,
        node_id: String,
    },
    InvalidStart {
        start_id: String,
    },
    DuplicateNodeId {
        node_id: String,
    },
    DuplicateConnectionId {
        connection_id: String,
    },
    UnknownScreen {
        node_id: String,
        screen_id: String,
    },
}

impl InvariantViolation {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, InvariantViolation::UnknownScreen { .. })
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::DanglingConnection {
                connection_id,
                node_id,
            } => write!(f, "connection {connection_id} references missing node {node_id}"),
            InvariantViolation::InvalidStart { start_id } => {
                write!(f, "start screen {start_id} is not a node of the flow")
            }
            InvariantViolation::DuplicateNodeId { node_id } => {
                write!(f, "node id {node_id} appears more than once")
            }
            InvariantViolation::DuplicateConnectionId { connection_id } => {
                write!(f, "connection id {connection_id} appears more than once")
            }
            InvariantViolation::UnknownScreen { node_id, screen_id } => {
                write!(f, "node {node_id} references unknown screen {screen_id}")
            }
        }
    }
}

/// Checks every structural invariant of a flow against the project's
/// screen list.
pub fn check_invariants(flow: &ScreenFlow, screens: &[Screen]) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let mut node_ids = HashSet::new();
    for node in &flow.screens {
        if !node_ids.insert(node.id.as_str()) {
            violations.push(InvariantViolation::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
        if !screens.iter().any(|s| s.id == node.screen_id) {
            violations.push(InvariantViolation::UnknownScreen {
                node_id: node.id.clone(),
                screen_id: node.screen_id.clone(),
            });
        }
    }

    let mut connection_ids = HashSet::new();
    for connection in &flow.connections {
        if !connection_ids.insert(connection.id.as_str()) {
            violations.push(InvariantViolation::DuplicateConnectionId {
                connection_id: connection.id.clone(),
            });
        }
        for endpoint in [&connection.from, &connection.to] {
            if !node_ids.contains(endpoint.as_str()) {
                violations.push(InvariantViolation::DanglingConnection {
                    connection_id: connection.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }

    if let Some(start) = flow.start_screen_id.as_deref() {
        if !node_ids.contains(start) {
            violations.push(InvariantViolation::InvalidStart {
                start_id: start.to_string(),
            });
        }
    }

    violations
}
