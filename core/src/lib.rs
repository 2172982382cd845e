//! # HyperROI Core
//!
//! Region-of-interest spatial model for multi-dimensional images (X, Y, Z,
//! T, C): dense boolean masks, sparse slice stacks, per-axis attachments,
//! line splitting, coalesced change notification and an undo/redo log.

pub mod abstract_editor;
pub mod change;
pub mod config;
pub mod error;
pub mod geometry;
pub mod mask;
pub mod roi;
pub mod sequence;
pub mod split;

pub use config::SequenceConfig;
pub use error::{RoiError, RoiResult};
pub use geometry::{Axis, Bounds5, LineSegment, Point2, Point5};
pub use mask::{BooleanMask, BooleanMask2D, BooleanMask3D, MaskRect};
pub use roi::{Attachment, Color, Roi, RoiEvent, RoiId, Shape2D, SliceKind};
pub use sequence::{Sequence, SequenceEvent, SequenceState};
pub use split::split_roi;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
