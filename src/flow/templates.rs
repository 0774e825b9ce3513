//! Built-in design-system templates offered by the "start from template"
//! path of the wizard.

use once_cell::sync::Lazy;

use crate::flow::model::{ColorToken, DesignTemplate, DesignTokens, SpacingToken};

static BUILTIN_TEMPLATES: Lazy<Vec<DesignTemplate>> = Lazy::new(|| {
    vec![
        DesignTemplate {
            id: "minimal".to_string(),
            name: "Minimal UI".to_string(),
            description: "Clean, modern interface with essential components".to_string(),
            preview: "/templates/minimal.png".to_string(),
            components: Vec::new(),
            styles: DesignTokens {
                colors: vec![
                    ColorToken {
                        name: "foreground".to_string(),
                        value: "#111111".to_string(),
                        usage: vec!["text".to_string()],
                    },
                    ColorToken {
                        name: "background".to_string(),
                        value: "#ffffff".to_string(),
                        usage: vec!["surface".to_string()],
                    },
                ],
                spacing: vec![SpacingToken {
                    name: "base".to_string(),
                    value: "8px".to_string(),
                }],
                ..DesignTokens::default()
            },
        },
        DesignTemplate {
            id: "dashboard".to_string(),
            name: "Dashboard Kit".to_string(),
            description: "Data-dense layouts, tables, and navigation chrome".to_string(),
            preview: "/templates/dashboard.png".to_string(),
            components: Vec::new(),
            styles: DesignTokens::default(),
        },
    ]
});

pub fn builtin_templates() -> &'static [DesignTemplate] {
    &BUILTIN_TEMPLATES
}

pub fn template_by_id(id: &str) -> Option<&'static DesignTemplate> {
    BUILTIN_TEMPLATES.iter().find(|t| t.id == id)
}
