//! Core data models for Dockyard
//!
//! This module contains the service template record together with its
//! identifier, restart policy and environment-variable codec.

pub mod env_vars;
pub mod ids;
pub mod restart;
pub mod template;

pub use env_vars::EnvMap;
pub use ids::TemplateId;
pub use restart::RestartPolicy;
pub use template::{
    now_millis, ServiceTemplate, TemplateValidationError, DEFAULT_CATEGORY, MAX_NAME_LEN,
};
