use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_version() -> String {
    "0.1".to_string()
}

#[derive(Debug, Error)]
pub enum ProjectSchemaError {
    #[error("failed to parse project YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level document wrapping one project, as persisted by the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectDocument {
    #[serde(default = "default_version")]
    pub version: String,
    pub project: Project,
}

impl ProjectDocument {
    pub fn from_yaml_str(input: &str) -> Result<Self, ProjectSchemaError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ProjectSchemaError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<DesignTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screens: Vec<Screen>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<ScreenFlow>,
}

/// An uploaded screenshot. Owned by the upload step; the flow editor only
/// ever reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Screen {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// One placement of a [`Screen`] within a flow. A screen may appear in
/// several flows, or several times within one flow, each time as a distinct
/// node with its own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenNode {
    pub id: String,
    pub screen_id: String,
    #[serde(default)]
    pub position: NodePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct NodePosition {
    pub x: f32,
    pub y: f32,
}

impl NodePosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A directed, labeled edge between two screen nodes, optionally annotated
/// with the hotspot on the source screenshot that triggers the navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Connection {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_area: Option<BoundingBox>,
}

/// Rectangle in percentage-of-image coordinates (0–100). Always normalized:
/// origin at the min corner, non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A named, directed graph of screens representing one user journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenFlow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screens: Vec<ScreenNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_screen_id: Option<String>,
}

impl ScreenFlow {
    /// An empty flow with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            screens: Vec::new(),
            connections: Vec::new(),
            start_screen_id: None,
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&ScreenNode> {
        self.screens.iter().find(|n| n.id == node_id)
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node(node_id).is_some()
    }

    pub fn connection(&self, connection_id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == connection_id)
    }

    /// Connections leaving the given node.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> {
        self.connections.iter().filter(move |c| c.from == node_id)
    }

    /// The node the flow starts at: the designated start node if it is
    /// still present, otherwise the first node, otherwise nothing.
    pub fn start_node(&self) -> Option<&ScreenNode> {
        self.start_screen_id
            .as_deref()
            .and_then(|id| self.node(id))
            .or_else(|| self.screens.first())
    }
}

/// Closed classification of detected UI components. Matching behavior for
/// similar components depends on this staying a closed set, so free-form
/// strings are not accepted; anything unrecognized is `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Button,
    Input,
    Card,
    Navigation,
    Header,
    Footer,
    Modal,
    Form,
    List,
    Table,
    Menu,
    Tab,
    Dropdown,
    Toggle,
    Avatar,
    Badge,
    Alert,
    Tooltip,
    Progress,
    Custom,
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ComponentType::Button => "button",
            ComponentType::Input => "input",
            ComponentType::Card => "card",
            ComponentType::Navigation => "navigation",
            ComponentType::Header => "header",
            ComponentType::Footer => "footer",
            ComponentType::Modal => "modal",
            ComponentType::Form => "form",
            ComponentType::List => "list",
            ComponentType::Table => "table",
            ComponentType::Menu => "menu",
            ComponentType::Tab => "tab",
            ComponentType::Dropdown => "dropdown",
            ComponentType::Toggle => "toggle",
            ComponentType::Avatar => "avatar",
            ComponentType::Badge => "badge",
            ComponentType::Alert => "alert",
            ComponentType::Tooltip => "tooltip",
            ComponentType::Progress => "progress",
            ComponentType::Custom => "custom",
        };
        write!(f, "{name}")
    }
}

/// A component found on a screen by the (mocked) detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedComponent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub bounding_box: BoundingBox,
    pub confidence: f32,
    pub screen_id: String,
    pub preview: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similar_components: Vec<DetectedComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DesignTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub preview: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<DesignComponent>,
    #[serde(default)]
    pub styles: DesignTokens,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DesignComponent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct DesignTokens {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<ColorToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub typography: Vec<TypographyToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spacing: Vec<SpacingToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub border_radius: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shadows: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorToken {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TypographyToken {
    pub name: String,
    pub size: String,
    pub weight: u32,
    pub line_height: String,
    pub letter_spacing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpacingToken {
    pub name: String,
    pub value: String,
}
