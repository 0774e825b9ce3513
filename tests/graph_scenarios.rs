use componentcraft::flow::graph;
use componentcraft::{
    BoundingBox, EditorEvent, EditorOutcome, FlowEditorState, FlowSimulator, GraphError,
    NodePosition, ScreenFlow, SimulatorState,
};

fn updated(outcome: Option<EditorOutcome>) -> ScreenFlow {
    match outcome {
        Some(EditorOutcome::Updated(flow)) => flow,
        other => panic!("expected an update, got {other:?}"),
    }
}

#[test]
fn empty_flow_has_no_start_and_previews_as_empty() {
    let flow = ScreenFlow::new("main", "Main Flow");
    assert_eq!(flow.start_screen_id, None);
    assert!(flow.start_node().is_none());

    let simulator = FlowSimulator::new(&flow);
    assert_eq!(simulator.state(), SimulatorState::Empty);
}

#[test]
fn first_screen_becomes_the_start() {
    let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main Flow"), "s1", None);
    assert_eq!(flow.screens.len(), 1);
    assert_eq!(
        flow.start_screen_id.as_deref(),
        Some(flow.screens[0].id.as_str())
    );
}

#[test]
fn removing_the_start_cascades_and_reassigns() {
    let flow = ScreenFlow::new("main", "Main Flow");
    let flow = graph::add_screen_node(&flow, "s1", None);
    let flow = graph::add_screen_node(&flow, "s2", None);
    let flow = graph::add_connection(&flow, "node_0", "node_1", Some("Next"))
        .expect("both endpoints exist");
    assert_eq!(flow.connections[0].label.as_deref(), Some("Next"));

    let flow = graph::remove_screen_node(&flow, "node_0");
    assert_eq!(flow.screens.len(), 1);
    assert_eq!(flow.screens[0].id, "node_1");
    assert!(flow.connections.is_empty());
    assert_eq!(flow.start_screen_id.as_deref(), Some("node_1"));
}

#[test]
fn interaction_area_is_stored_verbatim() {
    let flow = ScreenFlow::new("main", "Main Flow");
    let flow = graph::add_screen_node(&flow, "s1", None);
    let flow = graph::add_screen_node(&flow, "s2", None);
    let flow = graph::add_connection(&flow, "node_0", "node_1", None).expect("valid endpoints");

    let area = BoundingBox {
        x: 10.0,
        y: 20.0,
        width: 30.0,
        height: 15.0,
    };
    let flow = graph::set_interaction_area(&flow, "conn_0", area).expect("connection exists");
    assert_eq!(flow.connections[0].interaction_area, Some(area));
}

#[test]
fn connecting_from_an_unknown_node_fails_and_changes_nothing() {
    let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main Flow"), "s2", None);
    let before = flow.clone();

    let err = graph::add_connection(&flow, "nonexistent", "node_0", None)
        .expect_err("unknown source must be rejected");
    assert_eq!(err, GraphError::InvalidNodeReference("nonexistent".into()));
    assert_eq!(flow, before);
}

// A whole session driven through the controller: build a three-screen flow,
// annotate it, walk it in the preview, then tear part of it down.
#[test]
fn editor_session_end_to_end() {
    let mut editor = FlowEditorState::new();
    let mut flow = ScreenFlow::new("main", "Main Flow");

    for (screen, x) in [("login", 40.0), ("home", 320.0), ("settings", 600.0)] {
        flow = updated(editor.apply(
            &flow,
            EditorEvent::AddScreen {
                screen_id: screen.into(),
                position: Some(NodePosition::new(x, 60.0)),
                connect_from: None,
            },
        ));
    }

    editor.apply(&flow, EditorEvent::BeginConnection("node_0".into()));
    flow = updated(editor.apply(&flow, EditorEvent::CompleteConnection(Some("node_1".into()))));
    editor.apply(&flow, EditorEvent::BeginConnection("node_1".into()));
    flow = updated(editor.apply(&flow, EditorEvent::CompleteConnection(Some("node_2".into()))));

    flow = updated(editor.apply(
        &flow,
        EditorEvent::RelabelConnection {
            connection_id: "conn_0".into(),
            label: "Sign in".into(),
        },
    ));
    flow = updated(editor.apply(
        &flow,
        EditorEvent::SetInteractionArea {
            connection_id: "conn_0".into(),
            area: BoundingBox {
                x: 40.0,
                y: 80.0,
                width: 20.0,
                height: 10.0,
            },
        },
    ));

    let mut simulator = FlowSimulator::new(&flow);
    assert!(simulator.navigate("conn_0"));
    assert!(simulator.navigate("conn_1"));
    assert_eq!(
        simulator.state(),
        SimulatorState::EndOfFlow {
            node_id: "node_2".into()
        }
    );

    // Tearing down the middle node drops both of its connections.
    flow = updated(editor.apply(&flow, EditorEvent::RemoveNode("node_1".into())));
    assert_eq!(flow.screens.len(), 2);
    assert!(flow.connections.is_empty());
    assert_eq!(flow.start_screen_id.as_deref(), Some("node_0"));
}

#[test]
fn node_ids_are_not_reused_after_removal() {
    let flow = ScreenFlow::new("main", "Main Flow");
    let flow = graph::add_screen_node(&flow, "s1", None);
    let flow = graph::add_screen_node(&flow, "s2", None);
    let flow = graph::remove_screen_node(&flow, "node_0");
    let flow = graph::add_screen_node(&flow, "s3", None);

    // node_1 survives, so the next id counts up from it.
    let ids: Vec<&str> = flow.screens.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["node_1", "node_2"]);
}
