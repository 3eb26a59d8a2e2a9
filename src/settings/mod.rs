//! TOML settings loaded through `config`, with the file path taken from the
//! command line.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
