//! Cluster annotation against gene tables.

pub mod overlap;
pub mod proximity;

pub use overlap::detect_overlaps;
pub use proximity::detect_bidirectional;
