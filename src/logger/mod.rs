//! Process-wide tracing setup. `bin/follow_demo.rs` shows the bootstrap and
//! reload sequence.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
