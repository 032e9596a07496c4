//! Plate geometry and the size boundary.
//!
//! Dimensions are plate millimetres. The engraving layer renders fragments
//! into this coordinate space; the core only knows the plate outlines, the
//! safety margins, and the single user-facing failure: content that cannot
//! fit inside the safe area.

use serde::{Deserialize, Serialize};

use crate::error::BackupError;

/// Outer safety margin in plate millimetres; nothing is engraved closer to
/// the plate edge.
pub const OUTER_MARGIN: i32 = 3;

/// Inner margin in plate millimetres; clears the screw holes on the first
/// and last engraved lines.
pub const INNER_MARGIN: i32 = 10;

// All plates mount at the same x offset on the engraving bed.
const MOUNT_X: i32 = 97;

/// The supported plate blanks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateSize {
    /// 85 × 55 mm.
    Small,
    /// 85 × 85 mm.
    Square,
    /// 85 × 134 mm.
    Large,
}

impl PlateSize {
    /// Width and height in millimetres.
    #[must_use]
    pub const fn dims(self) -> (i32, i32) {
        match self {
            Self::Small => (85, 55),
            Self::Square => (85, 85),
            Self::Large => (85, 134),
        }
    }

    /// Mounting offset on the engraving bed.
    #[must_use]
    pub const fn offset(self) -> Point {
        match self {
            Self::Square => Point { x: MOUNT_X, y: 49 },
            Self::Small | Self::Large => Point { x: MOUNT_X, y: 0 },
        }
    }

    /// Plate outline in bed coordinates.
    #[must_use]
    pub const fn bounds(self) -> Rect {
        let (width, height) = self.dims();
        let origin = self.offset();
        Rect {
            min: origin,
            max: Point {
                x: origin.x + width,
                y: origin.y + height,
            },
        }
    }
}

/// A point in plate millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// An axis-aligned rectangle, `min` inclusive and `max` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    #[must_use]
    pub const fn width(self) -> i32 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub const fn height(self) -> i32 {
        self.max.y - self.min.y
    }

    /// Does `other` lie entirely within `self`?
    #[must_use]
    pub const fn contains(self, other: Rect) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }
}

/// The rectangle engraved content must stay inside, in plate-local
/// coordinates: the plate outline inset by [`OUTER_MARGIN`].
#[must_use]
pub const fn safe_area(size: PlateSize) -> Rect {
    let (width, height) = size.dims();
    Rect {
        min: Point {
            x: OUTER_MARGIN,
            y: OUTER_MARGIN,
        },
        max: Point {
            x: width - OUTER_MARGIN,
            y: height - OUTER_MARGIN,
        },
    }
}

/// The size boundary the engraving layer invokes once it has measured the
/// rendered fragments.
///
/// # Errors
///
/// Returns [`BackupError::DescriptorTooLarge`] when `content` escapes the
/// plate's safe area.
pub fn ensure_fits(size: PlateSize, content: Rect) -> Result<(), BackupError> {
    if safe_area(size).contains(content) {
        Ok(())
    } else {
        Err(BackupError::DescriptorTooLarge)
    }
}
