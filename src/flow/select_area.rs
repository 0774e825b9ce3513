//! Rectangle selection over a screenshot.
//!
//! Backs the modal overlay that lets the user mark which region of a screen
//! triggers a navigation. The machine is idle → selecting → committed;
//! whichever direction the pointer is dragged, the resulting box is
//! normalized (origin at the min corner, absolute extent) so it is always
//! well-formed. Cancelling at any point hands control back without a box.

use crate::flow::model::BoundingBox;

#[derive(Debug, Clone, PartialEq)]
enum SelectorState {
    Idle,
    Selecting {
        anchor: (f32, f32),
        current: (f32, f32),
    },
    Committed(BoundingBox),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaSelector {
    state: SelectorState,
}

impl Default for AreaSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AreaSelector {
    pub fn new() -> Self {
        Self {
            state: SelectorState::Idle,
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectorState::Selecting { .. })
    }

    /// Pointer-down: records the anchor and starts a live rectangle.
    /// Ignored once a box has been committed.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if matches!(self.state, SelectorState::Committed(_)) {
            return;
        }
        self.state = SelectorState::Selecting {
            anchor: (x, y),
            current: (x, y),
        };
    }

    /// Pointer-move: updates the live rectangle while selecting.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let SelectorState::Selecting { current, .. } = &mut self.state {
            *current = (x, y);
        }
    }

    /// Pointer-up: commits and returns the normalized box. Returns `None`
    /// when no selection was in progress.
    pub fn pointer_up(&mut self) -> Option<BoundingBox> {
        let SelectorState::Selecting { anchor, current } = self.state else {
            return None;
        };
        let area = normalized(anchor, current);
        self.state = SelectorState::Committed(area);
        Some(area)
    }

    /// The rectangle to draw while the drag is in progress.
    pub fn live_area(&self) -> Option<BoundingBox> {
        match self.state {
            SelectorState::Selecting { anchor, current } => Some(normalized(anchor, current)),
            _ => None,
        }
    }

    pub fn committed_area(&self) -> Option<BoundingBox> {
        match self.state {
            SelectorState::Committed(area) => Some(area),
            _ => None,
        }
    }

    /// Abandons any in-progress or committed selection.
    pub fn cancel(&mut self) {
        self.state = SelectorState::Idle;
    }
}

fn normalized(anchor: (f32, f32), current: (f32, f32)) -> BoundingBox {
    BoundingBox {
        x: anchor.0.min(current.0),
        y: anchor.1.min(current.1),
        width: (current.0 - anchor.0).abs(),
        height: (current.1 - anchor.1).abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(from: (f32, f32), to: (f32, f32)) -> BoundingBox {
        let mut selector = AreaSelector::new();
        selector.pointer_down(from.0, from.1);
        selector.pointer_move(to.0, to.1);
        selector.pointer_up().expect("drag should commit a box")
    }

    #[test]
    fn all_drag_directions_normalize_to_the_same_box() {
        let expected = BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 15.0,
        };
        assert_eq!(drag((10.0, 20.0), (40.0, 35.0)), expected);
        assert_eq!(drag((40.0, 35.0), (10.0, 20.0)), expected);
        assert_eq!(drag((10.0, 35.0), (40.0, 20.0)), expected);
        assert_eq!(drag((40.0, 20.0), (10.0, 35.0)), expected);
    }

    #[test]
    fn zero_drag_commits_an_empty_box() {
        let area = drag((25.0, 25.0), (25.0, 25.0));
        assert_eq!(area.width, 0.0);
        assert_eq!(area.height, 0.0);
    }

    #[test]
    fn live_area_tracks_the_pointer() {
        let mut selector = AreaSelector::new();
        assert_eq!(selector.live_area(), None);

        selector.pointer_down(0.0, 0.0);
        selector.pointer_move(50.0, 10.0);
        assert_eq!(
            selector.live_area(),
            Some(BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 50.0,
                height: 10.0,
            })
        );
    }

    #[test]
    fn moves_without_a_down_are_ignored() {
        let mut selector = AreaSelector::new();
        selector.pointer_move(50.0, 10.0);
        assert_eq!(selector.pointer_up(), None);
        assert_eq!(selector.committed_area(), None);
    }

    #[test]
    fn cancel_discards_the_selection() {
        let mut selector = AreaSelector::new();
        selector.pointer_down(0.0, 0.0);
        selector.pointer_move(30.0, 30.0);
        selector.cancel();
        assert!(!selector.is_selecting());
        assert_eq!(selector.pointer_up(), None);
    }

    #[test]
    fn committed_selector_ignores_further_input() {
        let mut selector = AreaSelector::new();
        selector.pointer_down(0.0, 0.0);
        selector.pointer_move(10.0, 10.0);
        let area = selector.pointer_up().unwrap();
        selector.pointer_down(90.0, 90.0);
        assert_eq!(selector.committed_area(), Some(area));
    }
}
