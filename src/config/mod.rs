//! Configuration module for shellrun
//!
//! Provides XDG-compliant layered configuration loading with
//! environment variable overrides.

pub mod loader;
pub mod model;

pub use loader::{config_paths, figment, find_config_files, load_config};
pub use model::*;
