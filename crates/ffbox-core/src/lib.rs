//! ffbox Core - Progress snapshots and operation parameters shared by the ffbox crates.

mod types;

pub use types::*;
