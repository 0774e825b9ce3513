pub mod error;
pub mod flow;

pub use error::GraphError;
pub use flow::detect::DetectionCache;
pub use flow::graph::{check_invariants, InvariantViolation};
pub use flow::editor::{
    available_screens, node_chrome, EditorEvent, EditorOutcome, FlowEditorState, NodeChrome,
    ViewMode, DEFAULT_CONNECTION_LABEL,
};
pub use flow::model::{
    BoundingBox, ColorToken, ComponentType, Connection, DesignComponent, DesignTemplate,
    DesignTokens, DetectedComponent, NodePosition, Project, ProjectDocument, ProjectSchemaError,
    Screen, ScreenFlow, ScreenNode, SpacingToken, TypographyToken,
};
pub use flow::select_area::AreaSelector;
pub use flow::simulate::{FlowSimulator, NavigationOption, SimulatorState};
pub use flow::templates::{builtin_templates, template_by_id};
pub use schemars::JsonSchema;
