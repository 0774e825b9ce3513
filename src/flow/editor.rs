//! View-agnostic editor controller.
//!
//! [`FlowEditorState`] holds the transient UI state of one open flow editor
//! (selection, in-progress drags, the screen picked in the available-screens
//! panel) and turns gestures into graph mutations. It never owns the flow:
//! each completed mutating gesture yields exactly one
//! [`EditorOutcome::Updated`] carrying the new flow value, which the owning
//! collaborator persists and passes back in on the next gesture.
//!
//! Both presentation strategies (the node-link canvas and the hierarchical
//! tree list) drive this same controller; [`ViewMode`] only selects how the
//! flow is drawn.

use crate::flow::graph;
use crate::flow::model::{BoundingBox, NodePosition, Screen, ScreenFlow, ScreenNode};

/// Label given to connections created by drag-to-connect and quick-add.
pub const DEFAULT_CONNECTION_LABEL: &str = "Navigate";

/// Where a quick-added node lands relative to its source node.
const QUICK_ADD_OFFSET: NodePosition = NodePosition { x: 260.0, y: 40.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Canvas,
    Tree,
}

/// A user gesture, already mapped out of the toolkit's event types.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// Pick (or clear) the screen-to-add in the available-screens panel.
    SelectScreen(Option<String>),
    /// Add a screen to the flow, optionally pre-connected from an existing
    /// node when it was dropped onto one.
    AddScreen {
        screen_id: String,
        position: Option<NodePosition>,
        connect_from: Option<String>,
    },
    /// Delete a node via its explicit affordance.
    RemoveNode(String),
    SetStartScreen(String),
    SelectNode(Option<String>),
    BeginNodeDrag(String),
    DragNodeTo(NodePosition),
    EndNodeDrag,
    /// Pointer-down on a node's output anchor.
    BeginConnection(String),
    /// Pointer-up; `None` means the drag ended on empty canvas.
    CompleteConnection(Option<String>),
    ToggleConnectionSelected(String),
    ClearConnectionSelection,
    /// Delete/Backspace with one or more connections marked selected.
    DeleteSelectedConnections,
    RelabelConnection { connection_id: String, label: String },
    SetInteractionArea {
        connection_id: String,
        area: BoundingBox,
    },
    /// Spawn a new node pre-connected from `from`, using the currently
    /// selected screen-to-add as template.
    QuickAdd { from: String },
    RenameFlow(String),
    SetDescription(String),
    /// Whole-flow deletion; interpreted by the owner, not the editor.
    RequestDelete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorOutcome {
    Updated(ScreenFlow),
    DeleteRequested,
}

#[derive(Debug, Clone)]
struct NodeDrag {
    node_id: String,
    position: NodePosition,
    moved: bool,
}

/// Everything a node's visual chrome needs, with the degraded-rendering
/// fallback applied when the screen reference no longer resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeChrome {
    pub node_id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub is_start: bool,
}

#[derive(Debug, Default)]
pub struct FlowEditorState {
    view: ViewMode,
    selected_node: Option<String>,
    selected_screen: Option<String>,
    selected_connections: Vec<String>,
    drag: Option<NodeDrag>,
    pending_connection: Option<String>,
}

impl FlowEditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    /// The screen currently picked as the quick-add template, if any.
    pub fn selected_screen(&self) -> Option<&str> {
        self.selected_screen.as_deref()
    }

    pub fn selected_connections(&self) -> &[String] {
        &self.selected_connections
    }

    pub fn is_connection_selected(&self, connection_id: &str) -> bool {
        self.selected_connections.iter().any(|c| c == connection_id)
    }

    /// Source node of an in-progress drag-to-connect gesture.
    pub fn pending_connection(&self) -> Option<&str> {
        self.pending_connection.as_deref()
    }

    /// Live position of a node mid-drag. The flow itself only learns the
    /// final position on pointer-release.
    pub fn dragged_position(&self, node_id: &str) -> Option<NodePosition> {
        self.drag
            .as_ref()
            .filter(|d| d.node_id == node_id)
            .map(|d| d.position)
    }

    /// Quick-add only means something once a screen-to-add is picked.
    pub fn quick_add_enabled(&self) -> bool {
        self.selected_screen.is_some()
    }

    /// Processes one gesture against the latest flow value. Returns at most
    /// one outcome; `None` means the gesture changed only transient UI state
    /// or referenced something that no longer exists (stale gestures are
    /// dropped silently, per the error policy).
    pub fn apply(&mut self, flow: &ScreenFlow, event: EditorEvent) -> Option<EditorOutcome> {
        match event {
            EditorEvent::SelectScreen(screen_id) => {
                self.selected_screen = screen_id;
                None
            }
            EditorEvent::AddScreen {
                screen_id,
                position,
                connect_from,
            } => self.add_screen(flow, &screen_id, position, connect_from.as_deref()),
            EditorEvent::RemoveNode(node_id) => {
                if !flow.contains_node(&node_id) {
                    tracing::debug!(node = %node_id, "stale delete gesture dropped");
                    return None;
                }
                if self.selected_node.as_deref() == Some(node_id.as_str()) {
                    self.selected_node = None;
                }
                let next = graph::remove_screen_node(flow, &node_id);
                self.prune_selection(&next);
                Some(EditorOutcome::Updated(next))
            }
            EditorEvent::SetStartScreen(node_id) => match graph::set_start_screen(flow, &node_id) {
                Ok(next) => Some(EditorOutcome::Updated(next)),
                Err(err) => {
                    tracing::debug!(%err, "stale set-start gesture dropped");
                    None
                }
            },
            EditorEvent::SelectNode(node_id) => {
                self.selected_node = node_id;
                None
            }
            EditorEvent::BeginNodeDrag(node_id) => {
                let Some(node) = flow.node(&node_id) else {
                    return None;
                };
                self.selected_node = Some(node_id.clone());
                self.drag = Some(NodeDrag {
                    node_id,
                    position: node.position,
                    moved: false,
                });
                None
            }
            EditorEvent::DragNodeTo(position) => {
                if let Some(drag) = &mut self.drag {
                    drag.position = position;
                    drag.moved = true;
                }
                None
            }
            EditorEvent::EndNodeDrag => {
                let drag = self.drag.take()?;
                if !drag.moved {
                    return None;
                }
                Some(EditorOutcome::Updated(graph::move_node(
                    flow,
                    &drag.node_id,
                    drag.position,
                )))
            }
            EditorEvent::BeginConnection(from) => {
                if flow.contains_node(&from) {
                    self.pending_connection = Some(from);
                }
                None
            }
            EditorEvent::CompleteConnection(to) => {
                let from = self.pending_connection.take()?;
                let to = to?;
                match graph::add_connection(flow, &from, &to, Some(DEFAULT_CONNECTION_LABEL)) {
                    Ok(next) => Some(EditorOutcome::Updated(next)),
                    Err(err) => {
                        tracing::debug!(%err, "stale connect gesture dropped");
                        None
                    }
                }
            }
            EditorEvent::ToggleConnectionSelected(connection_id) => {
                if let Some(idx) = self
                    .selected_connections
                    .iter()
                    .position(|c| *c == connection_id)
                {
                    self.selected_connections.remove(idx);
                } else if flow.connection(&connection_id).is_some() {
                    self.selected_connections.push(connection_id);
                }
                None
            }
            EditorEvent::ClearConnectionSelection => {
                self.selected_connections.clear();
                None
            }
            EditorEvent::DeleteSelectedConnections => {
                if self.selected_connections.is_empty() {
                    return None;
                }
                let mut next = flow.clone();
                for connection_id in self.selected_connections.drain(..) {
                    next = graph::remove_connection(&next, &connection_id);
                }
                Some(EditorOutcome::Updated(next))
            }
            EditorEvent::RelabelConnection {
                connection_id,
                label,
            } => match graph::relabel_connection(flow, &connection_id, &label) {
                Ok(next) => Some(EditorOutcome::Updated(next)),
                Err(err) => {
                    tracing::debug!(%err, "stale relabel gesture dropped");
                    None
                }
            },
            EditorEvent::SetInteractionArea {
                connection_id,
                area,
            } => match graph::set_interaction_area(flow, &connection_id, area) {
                Ok(next) => Some(EditorOutcome::Updated(next)),
                Err(err) => {
                    tracing::debug!(%err, "stale interaction-area gesture dropped");
                    None
                }
            },
            EditorEvent::QuickAdd { from } => self.quick_add(flow, &from),
            EditorEvent::RenameFlow(name) => {
                let mut next = flow.clone();
                next.name = name;
                Some(EditorOutcome::Updated(next))
            }
            EditorEvent::SetDescription(description) => {
                let mut next = flow.clone();
                next.description = if description.is_empty() {
                    None
                } else {
                    Some(description)
                };
                Some(EditorOutcome::Updated(next))
            }
            EditorEvent::RequestDelete => Some(EditorOutcome::DeleteRequested),
        }
    }

    fn add_screen(
        &mut self,
        flow: &ScreenFlow,
        screen_id: &str,
        position: Option<NodePosition>,
        connect_from: Option<&str>,
    ) -> Option<EditorOutcome> {
        // Defensive duplicate check. The picker already omits screens that
        // are in the flow, so hitting this means a stale panel entry.
        if flow.screens.iter().any(|n| n.screen_id == screen_id) {
            tracing::debug!(screen = screen_id, "duplicate screen add dropped");
            return None;
        }
        let next = graph::add_screen_node(flow, screen_id, position);
        let next = match connect_from {
            Some(from) => {
                let new_node = next.screens.last()?.id.clone();
                match graph::add_connection(&next, from, &new_node, Some(DEFAULT_CONNECTION_LABEL))
                {
                    Ok(connected) => connected,
                    Err(err) => {
                        tracing::debug!(%err, "drop-target vanished; adding node unconnected");
                        next
                    }
                }
            }
            None => next,
        };
        if self.selected_screen.as_deref() == Some(screen_id) {
            self.selected_screen = None;
        }
        Some(EditorOutcome::Updated(next))
    }

    fn quick_add(&mut self, flow: &ScreenFlow, from: &str) -> Option<EditorOutcome> {
        let screen_id = self.selected_screen.clone()?;
        let source = flow.node(from)?;
        let position = NodePosition::new(
            source.position.x + QUICK_ADD_OFFSET.x,
            source.position.y + QUICK_ADD_OFFSET.y,
        );
        self.add_screen(flow, &screen_id, Some(position), Some(from))
    }

    // Drops selection entries that no longer resolve after a mutation.
    fn prune_selection(&mut self, flow: &ScreenFlow) {
        self.selected_connections
            .retain(|id| flow.connection(id).is_some());
    }
}

/// Screens not yet placed in the flow, in upload order. This is where the
/// "no duplicate screen per flow" policy lives.
pub fn available_screens<'a>(flow: &ScreenFlow, screens: &'a [Screen]) -> Vec<&'a Screen> {
    screens
        .iter()
        .filter(|screen| !flow.screens.iter().any(|n| n.screen_id == screen.id))
        .collect()
}

/// Presentation data for one node. A dangling screen reference renders as
/// "Untitled Screen" with no thumbnail instead of crashing or being removed.
pub fn node_chrome(flow: &ScreenFlow, screens: &[Screen], node: &ScreenNode) -> NodeChrome {
    let screen = screens.iter().find(|s| s.id == node.screen_id);
    NodeChrome {
        node_id: node.id.clone(),
        title: screen
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "Untitled Screen".to_string()),
        image_url: screen.map(|s| s.url.clone()),
        is_start: flow.start_screen_id.as_deref() == Some(node.id.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::graph;

    fn screens() -> Vec<Screen> {
        ["s1", "s2", "s3"]
            .iter()
            .map(|id| Screen {
                id: id.to_string(),
                name: format!("Screen {id}"),
                url: format!("blob:{id}"),
            })
            .collect()
    }

    fn updated(outcome: Option<EditorOutcome>) -> ScreenFlow {
        match outcome {
            Some(EditorOutcome::Updated(flow)) => flow,
            other => panic!("expected an update, got {other:?}"),
        }
    }

    #[test]
    fn add_then_connect_then_remove_source() {
        let mut editor = FlowEditorState::new();
        let flow = ScreenFlow::new("main", "Main Flow");

        let flow = updated(editor.apply(
            &flow,
            EditorEvent::AddScreen {
                screen_id: "s1".into(),
                position: None,
                connect_from: None,
            },
        ));
        let flow = updated(editor.apply(
            &flow,
            EditorEvent::AddScreen {
                screen_id: "s2".into(),
                position: None,
                connect_from: None,
            },
        ));

        editor.apply(&flow, EditorEvent::BeginConnection("node_0".into()));
        let flow = updated(editor.apply(
            &flow,
            EditorEvent::CompleteConnection(Some("node_1".into())),
        ));
        assert_eq!(flow.connections.len(), 1);
        assert_eq!(
            flow.connections[0].label.as_deref(),
            Some(DEFAULT_CONNECTION_LABEL)
        );

        let flow = updated(editor.apply(&flow, EditorEvent::RemoveNode("node_0".into())));
        assert_eq!(flow.screens.len(), 1);
        assert!(flow.connections.is_empty());
        assert_eq!(flow.start_screen_id.as_deref(), Some("node_1"));
    }

    #[test]
    fn connect_dropped_on_empty_canvas_is_cancelled() {
        let mut editor = FlowEditorState::new();
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "s1", None);

        editor.apply(&flow, EditorEvent::BeginConnection("node_0".into()));
        assert_eq!(editor.pending_connection(), Some("node_0"));
        assert_eq!(editor.apply(&flow, EditorEvent::CompleteConnection(None)), None);
        assert_eq!(editor.pending_connection(), None);
    }

    #[test]
    fn drag_reports_one_update_on_release() {
        let mut editor = FlowEditorState::new();
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "s1", None);

        editor.apply(&flow, EditorEvent::BeginNodeDrag("node_0".into()));
        for step in 1..=5 {
            let outcome = editor.apply(
                &flow,
                EditorEvent::DragNodeTo(NodePosition::new(step as f32 * 10.0, 5.0)),
            );
            assert_eq!(outcome, None);
        }
        assert_eq!(
            editor.dragged_position("node_0"),
            Some(NodePosition::new(50.0, 5.0))
        );

        let flow = updated(editor.apply(&flow, EditorEvent::EndNodeDrag));
        assert_eq!(
            flow.node("node_0").unwrap().position,
            NodePosition::new(50.0, 5.0)
        );
        assert_eq!(editor.dragged_position("node_0"), None);
    }

    #[test]
    fn drag_without_movement_reports_nothing() {
        let mut editor = FlowEditorState::new();
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "s1", None);
        editor.apply(&flow, EditorEvent::BeginNodeDrag("node_0".into()));
        assert_eq!(editor.apply(&flow, EditorEvent::EndNodeDrag), None);
    }

    #[test]
    fn duplicate_screen_add_is_refused() {
        let mut editor = FlowEditorState::new();
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "s1", None);
        let outcome = editor.apply(
            &flow,
            EditorEvent::AddScreen {
                screen_id: "s1".into(),
                position: None,
                connect_from: None,
            },
        );
        assert_eq!(outcome, None);
    }

    #[test]
    fn quick_add_requires_a_selected_screen() {
        let mut editor = FlowEditorState::new();
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "s1", None);

        assert!(!editor.quick_add_enabled());
        assert_eq!(
            editor.apply(&flow, EditorEvent::QuickAdd { from: "node_0".into() }),
            None
        );

        editor.apply(&flow, EditorEvent::SelectScreen(Some("s2".into())));
        assert!(editor.quick_add_enabled());
        let flow = updated(editor.apply(&flow, EditorEvent::QuickAdd { from: "node_0".into() }));
        assert_eq!(flow.screens.len(), 2);
        assert_eq!(flow.connections.len(), 1);
        assert_eq!(flow.connections[0].from, "node_0");
        assert_eq!(flow.connections[0].to, "node_1");
        // The template screen is consumed by the add.
        assert_eq!(editor.selected_screen(), None);
    }

    #[test]
    fn delete_key_removes_each_selected_connection() {
        let mut editor = FlowEditorState::new();
        let mut flow = ScreenFlow::new("main", "Main");
        for screen in ["s1", "s2", "s3"] {
            flow = graph::add_screen_node(&flow, screen, None);
        }
        flow = graph::add_connection(&flow, "node_0", "node_1", None).unwrap();
        flow = graph::add_connection(&flow, "node_1", "node_2", None).unwrap();
        flow = graph::add_connection(&flow, "node_2", "node_0", None).unwrap();

        editor.apply(&flow, EditorEvent::ToggleConnectionSelected("conn_0".into()));
        editor.apply(&flow, EditorEvent::ToggleConnectionSelected("conn_2".into()));
        let flow = updated(editor.apply(&flow, EditorEvent::DeleteSelectedConnections));
        assert_eq!(flow.connections.len(), 1);
        assert_eq!(flow.connections[0].id, "conn_1");
        assert!(editor.selected_connections().is_empty());
        // Nothing selected: a second delete press reports nothing.
        assert_eq!(editor.apply(&flow, EditorEvent::DeleteSelectedConnections), None);
    }

    #[test]
    fn available_screens_omits_placed_ones() {
        let screens = screens();
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "s2", None);
        let available = available_screens(&flow, &screens);
        assert_eq!(
            available.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["s1", "s3"]
        );
    }

    #[test]
    fn node_chrome_degrades_on_missing_screen() {
        let screens = screens();
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "gone", None);
        let chrome = node_chrome(&flow, &screens, &flow.screens[0]);
        assert_eq!(chrome.title, "Untitled Screen");
        assert_eq!(chrome.image_url, None);
        assert!(chrome.is_start);

        let flow = graph::add_screen_node(&flow, "s1", None);
        let chrome = node_chrome(&flow, &screens, &flow.screens[1]);
        assert_eq!(chrome.title, "Screen s1");
        assert_eq!(chrome.image_url.as_deref(), Some("blob:s1"));
        assert!(!chrome.is_start);
    }

    #[test]
    fn rename_and_description_round_trip() {
        let mut editor = FlowEditorState::new();
        let flow = ScreenFlow::new("main", "Main Flow");
        let flow = updated(editor.apply(&flow, EditorEvent::RenameFlow("Onboarding".into())));
        assert_eq!(flow.name, "Onboarding");
        let flow = updated(editor.apply(&flow, EditorEvent::SetDescription("Signup path".into())));
        assert_eq!(flow.description.as_deref(), Some("Signup path"));
        let flow = updated(editor.apply(&flow, EditorEvent::SetDescription(String::new())));
        assert_eq!(flow.description, None);
        assert_eq!(
            editor.apply(&flow, EditorEvent::RequestDelete),
            Some(EditorOutcome::DeleteRequested)
        );
    }
}
