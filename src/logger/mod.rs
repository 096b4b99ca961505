//! Global `tracing` subscriber whose filter can be swapped once settings are
//! loaded.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
