pub mod grid_index;

pub use grid_index::{GridStats, SegmentGridIndex, segment_features};
