//! # Drop Position
//!
//! Classifies where a dragged item lands relative to the node under the
//! pointer. Containers get a generous middle band meaning "drop into me";
//! leaves are split in halves and only ever receive siblings.

use formwork_schema::FieldKind;
use serde::{Deserialize, Serialize};

/// Structural placement relative to a target node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    Before,
    After,
    Inside,
}

impl DropPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            DropPosition::Before => "before",
            DropPosition::After => "after",
            DropPosition::Inside => "inside",
        }
    }
}

/// On-screen vertical extent of the target node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropRect {
    pub top: f64,
    pub height: f64,
}

impl DropRect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Pointer offset as a fraction of the height. Degenerate rectangles
    /// report the midpoint.
    fn fraction(&self, pointer_y: f64) -> f64 {
        if self.height <= 0.0 || !self.height.is_finite() || !pointer_y.is_finite() {
            return 0.5;
        }
        (pointer_y - self.top) / self.height
    }
}

/// Container band edges
const CONTAINER_BEFORE: f64 = 0.25;
const CONTAINER_AFTER: f64 = 0.75;
/// Leaf split
const LEAF_SPLIT: f64 = 0.5;

/// Classify a drop on a target of `kind` at `pointer_y`
pub fn classify(kind: FieldKind, rect: DropRect, pointer_y: f64) -> DropPosition {
    let fraction = rect.fraction(pointer_y);

    if kind.is_container() {
        if fraction < CONTAINER_BEFORE {
            DropPosition::Before
        } else if fraction > CONTAINER_AFTER {
            DropPosition::After
        } else {
            DropPosition::Inside
        }
    } else if fraction < LEAF_SPLIT {
        DropPosition::Before
    } else {
        DropPosition::After
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: DropRect = DropRect {
        top: 100.0,
        height: 40.0,
    };

    #[test]
    fn test_section_bands() {
        assert_eq!(classify(FieldKind::Section, RECT, 105.0), DropPosition::Before);
        assert_eq!(classify(FieldKind::Section, RECT, 110.0), DropPosition::Inside);
        assert_eq!(classify(FieldKind::Section, RECT, 120.0), DropPosition::Inside);
        assert_eq!(classify(FieldKind::Section, RECT, 130.0), DropPosition::Inside);
        assert_eq!(classify(FieldKind::Section, RECT, 135.0), DropPosition::After);
    }

    #[test]
    fn test_leaf_halves() {
        assert_eq!(classify(FieldKind::Text, RECT, 100.0), DropPosition::Before);
        assert_eq!(classify(FieldKind::Text, RECT, 119.9), DropPosition::Before);
        assert_eq!(classify(FieldKind::Text, RECT, 120.0), DropPosition::After);
        assert_eq!(classify(FieldKind::Grid, RECT, 139.0), DropPosition::After);
    }

    #[test]
    fn test_leaf_never_inside() {
        for step in 0..=100 {
            let y = 90.0 + step as f64 * 0.6;
            assert_ne!(classify(FieldKind::Select, RECT, y), DropPosition::Inside);
        }
    }

    #[test]
    fn test_pointer_outside_rect() {
        assert_eq!(classify(FieldKind::Section, RECT, 50.0), DropPosition::Before);
        assert_eq!(classify(FieldKind::Section, RECT, 500.0), DropPosition::After);
    }

    #[test]
    fn test_degenerate_rect() {
        let flat = DropRect::new(10.0, 0.0);
        assert_eq!(classify(FieldKind::Section, flat, 10.0), DropPosition::Inside);
        assert_eq!(classify(FieldKind::Text, flat, 10.0), DropPosition::After);
    }
}
