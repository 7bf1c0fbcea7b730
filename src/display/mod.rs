//! Display formatting for terminal output
//!
//! Provides utilities for formatting templates for terminal display as
//! tables and detail views.

pub mod template;

pub use template::{format_home, format_template_details, format_template_list};
