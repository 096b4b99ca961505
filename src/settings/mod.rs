//! File-backed settings with environment overrides for secrets, lifetimes and
//! connection strings.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod duration;
pub use duration::*;

mod settings;
pub use settings::*;
