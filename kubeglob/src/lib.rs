pub mod cli;
pub mod cluster;
pub mod load_config;

pub use cli::{run, Cli};
