//! Mock component detection.
//!
//! Real detection happens server-side; this stands in for it with
//! deterministic placeholder components so the preview step can be built
//! and tested. The cache is an explicit object owned by one wizard session,
//! not process-wide state: two sessions never see each other's results.

use std::collections::HashMap;

use crate::flow::model::{BoundingBox, ComponentType, DetectedComponent, Screen};

/// Similarity threshold for treating two components as variants of the
/// same design-system component.
const NAME_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Per-session store of detection results and the user's approve/reject
/// decisions from the review step.
#[derive(Debug, Default)]
pub struct DetectionCache {
    components: HashMap<String, Vec<DetectedComponent>>,
    decisions: HashMap<String, bool>,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detection results for a screen, computed once and memoized.
    pub fn detect(&mut self, screen: &Screen) -> &[DetectedComponent] {
        self.components
            .entry(screen.id.clone())
            .or_insert_with(|| {
                tracing::debug!(screen = %screen.id, "running mock detection");
                mock_components(&screen.id)
            })
    }

    /// Records the user's verdict on one detected component.
    pub fn record_decision(&mut self, component_id: &str, approved: bool) {
        self.decisions.insert(component_id.to_string(), approved);
    }

    pub fn decision(&self, component_id: &str) -> Option<bool> {
        self.decisions.get(component_id).copied()
    }

    /// All components the user approved, across every screen.
    pub fn approved(&self) -> Vec<&DetectedComponent> {
        self.components
            .values()
            .flatten()
            .filter(|c| self.decision(&c.id) == Some(true))
            .collect()
    }

    /// Components elsewhere in the session that look like the given one:
    /// identical closed-set type, near-identical name. Classification never
    /// falls back to fuzzy type matching — `ComponentType` stays closed
    /// precisely so this comparison is exact.
    pub fn similar_components(&self, target: &DetectedComponent) -> Vec<&DetectedComponent> {
        self.components
            .values()
            .flatten()
            .filter(|candidate| {
                candidate.id != target.id
                    && candidate.kind == target.kind
                    && strsim::jaro_winkler(&candidate.name, &target.name)
                        >= NAME_SIMILARITY_THRESHOLD
            })
            .collect()
    }
}

fn mock_components(screen_id: &str) -> Vec<DetectedComponent> {
    vec![
        DetectedComponent {
            id: format!("button-{screen_id}"),
            name: "Primary Button".to_string(),
            kind: ComponentType::Button,
            bounding_box: BoundingBox {
                x: 20.0,
                y: 30.0,
                width: 15.0,
                height: 8.0,
            },
            confidence: 0.95,
            screen_id: screen_id.to_string(),
            preview: "/mock-component.png".to_string(),
            similar_components: Vec::new(),
        },
        DetectedComponent {
            id: format!("card-{screen_id}"),
            name: "Content Card".to_string(),
            kind: ComponentType::Card,
            bounding_box: BoundingBox {
                x: 10.0,
                y: 45.0,
                width: 80.0,
                height: 30.0,
            },
            confidence: 0.88,
            screen_id: screen_id.to_string(),
            preview: "/mock-component.png".to_string(),
            similar_components: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(id: &str) -> Screen {
        Screen {
            id: id.to_string(),
            name: format!("Screen {id}"),
            url: format!("blob:{id}"),
        }
    }

    #[test]
    fn detection_is_memoized_per_screen() {
        let mut cache = DetectionCache::new();
        let first = cache.detect(&screen("s1")).to_vec();
        let second = cache.detect(&screen("s1")).to_vec();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].kind, ComponentType::Button);
        assert_eq!(first[0].confidence, 0.95);
    }

    #[test]
    fn sessions_do_not_share_results() {
        let mut a = DetectionCache::new();
        let mut b = DetectionCache::new();
        a.detect(&screen("s1"));
        a.record_decision("button-s1", true);
        b.detect(&screen("s1"));
        assert_eq!(b.decision("button-s1"), None);
    }

    #[test]
    fn approvals_override_earlier_rejections() {
        let mut cache = DetectionCache::new();
        cache.detect(&screen("s1"));
        cache.record_decision("button-s1", false);
        cache.record_decision("button-s1", true);
        cache.record_decision("card-s1", false);

        let approved = cache.approved();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, "button-s1");
    }

    #[test]
    fn similar_components_match_type_and_name() {
        let mut cache = DetectionCache::new();
        cache.detect(&screen("s1"));
        cache.detect(&screen("s2"));

        let target = cache.detect(&screen("s1"))[0].clone();
        let similar = cache.similar_components(&target);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].id, "button-s2");
        // The card on the same screen shares nothing; it never matches.
        assert!(similar.iter().all(|c| c.kind == ComponentType::Button));
    }
}
