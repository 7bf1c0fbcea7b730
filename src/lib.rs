//! Dockyard - a library of Docker Compose service templates
//!
//! Templates are kept in a local JSON store, rendered as Compose YAML, and
//! reconciled on demand with a hosted PostgREST table.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Template model and its field codecs
//! - `storage`: JSON file storage with migrations and live queries
//! - `remote`: REST client and reachability probe
//! - `services`: Business logic, including reconciliation
//! - `state`: View models for the list, detail and form screens
//! - `export`: Compose rendering and library dumps
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use dockyard::config::{paths::DockyardPaths, settings::Settings};
//!
//! let paths = DockyardPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod storage;

pub use error::{DockyardError, DockyardResult};
