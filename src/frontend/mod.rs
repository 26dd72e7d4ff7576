//! Frontend components
//!
//! Configuration and the command line that drive a resolution run.

pub mod cli;
pub mod config;

pub use cli::main as cli_main;
pub use config::Config;
