//! Configuration module for Dockyard
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence (remote endpoint, display preferences)

pub mod paths;
pub mod settings;

pub use paths::DockyardPaths;
pub use settings::{RemoteSettings, Settings};
