//! Per-axis activation of a region along the higher axes (Z, T, C).

use std::fmt;

use crate::geometry::Axis;

/// Position of a region on one higher axis.
///
/// Either universal (active at every coordinate, stored as `-1`) or pinned
/// to a single coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Attachment(i32);

impl Attachment {
    pub const UNIVERSAL: Attachment = Attachment(-1);

    /// Builds an attachment from its raw value; `-1` means universal.
    pub const fn from_value(value: i32) -> Self {
        Self(value)
    }

    /// Pins to `index`.
    pub const fn pinned(index: i32) -> Self {
        Self(index)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    pub const fn is_universal(self) -> bool {
        self.0 == -1
    }

    /// Whether the region is active at `coordinate` on this axis.
    pub const fn is_active_for(self, coordinate: i32) -> bool {
        self.is_universal() || self.0 == coordinate
    }
}

impl Default for Attachment {
    fn default() -> Self {
        Self::UNIVERSAL
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_universal() {
            f.write_str("*")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Attachments on the Z, T and C axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Attachments {
    pub z: Attachment,
    pub t: Attachment,
    pub c: Attachment,
}

impl Attachments {
    /// All three axes universal.
    pub const UNIVERSAL: Attachments = Attachments {
        z: Attachment::UNIVERSAL,
        t: Attachment::UNIVERSAL,
        c: Attachment::UNIVERSAL,
    };

    /// The attachment on `axis`; X and Y have none and read as universal.
    pub fn get(&self, axis: Axis) -> Attachment {
        match axis {
            Axis::Z => self.z,
            Axis::T => self.t,
            Axis::C => self.c,
            Axis::X | Axis::Y => Attachment::UNIVERSAL,
        }
    }

    /// Stores `value` on `axis`. Returns `true` if it changed.
    ///
    /// Writes to X or Y are ignored.
    pub fn set(&mut self, axis: Axis, value: Attachment) -> bool {
        let slot = match axis {
            Axis::Z => &mut self.z,
            Axis::T => &mut self.t,
            Axis::C => &mut self.c,
            Axis::X | Axis::Y => return false,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// Whether every attachment accepts the matching coordinate.
    pub fn is_active_for(&self, z: i32, t: i32, c: i32) -> bool {
        self.z.is_active_for(z) && self.t.is_active_for(t) && self.c.is_active_for(c)
    }
}
