use componentcraft::{check_invariants, ProjectDocument};

#[test]
fn sample_project_roundtrips_through_yaml() {
    let document = ProjectDocument::from_yaml_str(include_str!("data/sample_project.yaml"))
        .expect("failed to parse sample project");

    let yaml = document
        .to_yaml_string()
        .expect("failed to serialize project back to yaml");

    let round_trip = ProjectDocument::from_yaml_str(&yaml)
        .expect("failed to parse round-trip serialized project");

    assert_eq!(document, round_trip);
    assert_eq!(document.version, "0.1");
    assert_eq!(document.project.screens.len(), 4);
    assert_eq!(
        document
            .project
            .flows
            .first()
            .and_then(|flow| flow.start_screen_id.as_deref()),
        Some("node_0")
    );
}

#[test]
fn sample_project_passes_the_invariant_check() {
    let document = ProjectDocument::from_yaml_str(include_str!("data/sample_project.yaml"))
        .expect("failed to parse sample project");

    for flow in &document.project.flows {
        let violations = check_invariants(flow, &document.project.screens);
        assert!(
            violations.is_empty(),
            "flow {} has violations: {violations:?}",
            flow.id
        );
    }
}

#[test]
fn optional_fields_are_omitted_when_empty() {
    let document = ProjectDocument::from_yaml_str(include_str!("data/sample_project.yaml"))
        .expect("failed to parse sample project");
    let yaml = document.to_yaml_string().expect("failed to serialize");

    // The recovery flow has no description, connections, or start screen;
    // none of those keys should appear for it.
    assert_eq!(yaml.matches("description:").count(), 2);
    assert_eq!(yaml.matches("connections:").count(), 1);
    assert_eq!(yaml.matches("start_screen_id:").count(), 1);
    assert_eq!(yaml.matches("interaction_area:").count(), 1);
}

#[test]
fn missing_version_defaults() {
    let document = ProjectDocument::from_yaml_str(
        "project:\n  name: Bare\n  screens: []\n  flows: []\n",
    )
    .expect("failed to parse minimal project");
    assert_eq!(document.version, "0.1");
    assert!(document.project.flows.is_empty());
}
