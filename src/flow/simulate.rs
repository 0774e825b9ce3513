//! Interactive flow preview.
//!
//! The simulator walks a flow the way an end user would: it sits on one
//! node, offers the outgoing connections as navigation choices, and moves
//! one step at a time when the user picks one. It keeps its own copy of the
//! flow and a transient cursor; it never mutates anything, and reopening
//! the preview always starts over from the start node.

use crate::flow::model::{Screen, ScreenFlow, ScreenNode};

/// Where the simulation currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatorState {
    /// The flow has no screens at all.
    Empty,
    /// Sitting on a node with at least one outgoing connection.
    AtScreen { node_id: String },
    /// Sitting on a node with no outgoing connections. Terminal, not an
    /// error: the preview reports "end of flow".
    EndOfFlow { node_id: String },
}

/// One navigation choice out of the current node.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationOption {
    pub connection_id: String,
    pub node_id: String,
    pub screen_id: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FlowSimulator {
    flow: ScreenFlow,
    current: Option<String>,
}

impl FlowSimulator {
    /// Starts a simulation at the flow's start node (the designated start
    /// if present, otherwise the first node).
    pub fn new(flow: &ScreenFlow) -> Self {
        let current = flow.start_node().map(|n| n.id.clone());
        tracing::debug!(flow = %flow.id, start = ?current, "simulation started");
        Self {
            flow: flow.clone(),
            current,
        }
    }

    /// Rewinds to the start node.
    pub fn reset(&mut self) {
        self.current = self.flow.start_node().map(|n| n.id.clone());
    }

    pub fn state(&self) -> SimulatorState {
        match self.current.as_deref().and_then(|id| self.flow.node(id)) {
            None => SimulatorState::Empty,
            Some(node) => {
                if self.options().is_empty() {
                    SimulatorState::EndOfFlow {
                        node_id: node.id.clone(),
                    }
                } else {
                    SimulatorState::AtScreen {
                        node_id: node.id.clone(),
                    }
                }
            }
        }
    }

    pub fn current_node(&self) -> Option<&ScreenNode> {
        self.current.as_deref().and_then(|id| self.flow.node(id))
    }

    /// The screen shown for the current node, if its reference resolves.
    pub fn current_screen<'a>(&self, screens: &'a [Screen]) -> Option<&'a Screen> {
        let node = self.current_node()?;
        screens.iter().find(|s| s.id == node.screen_id)
    }

    /// Outgoing connections from the current node. Connections whose target
    /// node no longer exists are filtered out rather than offered.
    pub fn options(&self) -> Vec<NavigationOption> {
        let Some(current) = self.current.as_deref() else {
            return Vec::new();
        };
        self.flow
            .outgoing(current)
            .filter_map(|connection| {
                let target = self.flow.node(&connection.to)?;
                Some(NavigationOption {
                    connection_id: connection.id.clone(),
                    node_id: target.id.clone(),
                    screen_id: target.screen_id.clone(),
                    label: connection.label.clone(),
                })
            })
            .collect()
    }

    /// Follows one outgoing connection of the current node. Returns whether
    /// the step was taken; an id that is not among the current options is
    /// ignored. Self-loops take a single step like any other edge — there
    /// is no automatic replay.
    pub fn navigate(&mut self, connection_id: &str) -> bool {
        let Some(option) = self
            .options()
            .into_iter()
            .find(|o| o.connection_id == connection_id)
        else {
            tracing::debug!(connection = connection_id, "stale navigation ignored");
            return false;
        };
        tracing::debug!(flow = %self.flow.id, to = %option.node_id, "navigate");
        self.current = Some(option.node_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::graph;

    fn linear_flow() -> ScreenFlow {
        let mut flow = ScreenFlow::new("main", "Main Flow");
        for screen in ["login", "home", "settings"] {
            flow = graph::add_screen_node(&flow, screen, None);
        }
        flow = graph::add_connection(&flow, "node_0", "node_1", Some("Sign in")).unwrap();
        flow = graph::add_connection(&flow, "node_1", "node_2", Some("Open settings")).unwrap();
        flow
    }

    #[test]
    fn empty_flow_reports_no_screens() {
        let simulator = FlowSimulator::new(&ScreenFlow::new("main", "Main"));
        assert_eq!(simulator.state(), SimulatorState::Empty);
        assert!(simulator.options().is_empty());
    }

    #[test]
    fn walks_to_the_end_of_a_linear_flow() {
        let mut simulator = FlowSimulator::new(&linear_flow());
        assert_eq!(
            simulator.state(),
            SimulatorState::AtScreen { node_id: "node_0".into() }
        );

        let options = simulator.options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label.as_deref(), Some("Sign in"));
        assert!(simulator.navigate(&options[0].connection_id));

        let options = simulator.options();
        assert_eq!(options[0].screen_id, "settings");
        assert!(simulator.navigate(&options[0].connection_id));

        assert_eq!(
            simulator.state(),
            SimulatorState::EndOfFlow { node_id: "node_2".into() }
        );
        assert!(simulator.options().is_empty());
    }

    #[test]
    fn falls_back_to_first_node_without_a_start() {
        let mut flow = linear_flow();
        flow.start_screen_id = None;
        let simulator = FlowSimulator::new(&flow);
        assert_eq!(simulator.current_node().map(|n| n.id.as_str()), Some("node_0"));
    }

    #[test]
    fn honors_a_designated_start() {
        let flow = graph::set_start_screen(&linear_flow(), "node_1").unwrap();
        let simulator = FlowSimulator::new(&flow);
        assert_eq!(simulator.current_node().map(|n| n.id.as_str()), Some("node_1"));
    }

    #[test]
    fn self_loop_takes_exactly_one_step() {
        let flow = graph::add_screen_node(&ScreenFlow::new("main", "Main"), "s1", None);
        let flow = graph::add_connection(&flow, "node_0", "node_0", Some("Refresh")).unwrap();
        let mut simulator = FlowSimulator::new(&flow);

        assert!(simulator.navigate("conn_0"));
        assert_eq!(
            simulator.state(),
            SimulatorState::AtScreen { node_id: "node_0".into() }
        );
    }

    #[test]
    fn stale_navigation_is_ignored() {
        let mut simulator = FlowSimulator::new(&linear_flow());
        assert!(!simulator.navigate("conn_99"));
        // conn_1 leaves node_1, not the current node_0.
        assert!(!simulator.navigate("conn_1"));
        assert_eq!(
            simulator.state(),
            SimulatorState::AtScreen { node_id: "node_0".into() }
        );
    }

    #[test]
    fn dangling_targets_are_not_offered() {
        let mut flow = linear_flow();
        // Simulate upstream corruption: drop node_1 without the cascade.
        flow.screens.retain(|n| n.id != "node_1");
        let simulator = FlowSimulator::new(&flow);
        assert!(simulator.options().is_empty());
        assert_eq!(
            simulator.state(),
            SimulatorState::EndOfFlow { node_id: "node_0".into() }
        );
    }

    #[test]
    fn reset_rewinds_to_the_start() {
        let mut simulator = FlowSimulator::new(&linear_flow());
        assert!(simulator.navigate("conn_0"));
        simulator.reset();
        assert_eq!(simulator.current_node().map(|n| n.id.as_str()), Some("node_0"));
    }

    #[test]
    fn terminates_within_node_count_steps_on_acyclic_flows() {
        let flow = linear_flow();
        let mut simulator = FlowSimulator::new(&flow);
        let mut steps = 0;
        while let Some(option) = simulator.options().first().cloned() {
            assert!(simulator.navigate(&option.connection_id));
            steps += 1;
            assert!(steps <= flow.screens.len() + 1);
        }
        assert!(matches!(simulator.state(), SimulatorState::EndOfFlow { .. }));
    }
}
