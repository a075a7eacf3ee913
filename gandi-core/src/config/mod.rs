//! Configuration support shared by the CLI crates

mod paths;

pub use paths::default_config_path;
