//! Export module for Dockyard
//!
//! - `compose`: renders templates as a Compose `services:` document
//! - `library`: full library dump and import in YAML or JSON

pub mod compose;
pub mod library;

pub use compose::{format_template, format_templates, slugify, split_entries, SlugAllocator};
pub use library::{
    export_library, import_library, parse_library, ImportSummary, LibraryExport, LibraryFormat,
};
