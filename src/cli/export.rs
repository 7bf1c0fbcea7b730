//! CLI commands for export and import
//!
//! `export` writes either a Compose document or a full library dump;
//! `import` reads a library dump back.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use crate::error::{DockyardError, DockyardResult};
use crate::export::{export_library, format_templates, import_library, parse_library, LibraryFormat};
use crate::services::TemplateService;

use super::AppContext;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Compose `services:` document
    Compose,
    /// Library dump, YAML
    Yaml,
    /// Library dump, JSON
    Json,
}

/// Export/import subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export all templates
    Export {
        /// Output file path (stdout when omitted)
        output: Option<PathBuf>,

        /// Export format (guessed from the file extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
    },

    /// Import templates from a library dump
    Import {
        /// YAML or JSON file written by `export`
        file: PathBuf,

        /// Skip templates whose name already exists
        #[arg(long)]
        skip_existing: bool,
    },
}

/// Handle export and import commands
pub fn handle_export_command(ctx: &AppContext, cmd: ExportCommands) -> DockyardResult<()> {
    match cmd {
        ExportCommands::Export { output, format } => {
            let format = format.unwrap_or_else(|| guess_format(output.as_ref()));

            match output {
                Some(path) => {
                    let file = File::create(&path).map_err(|e| {
                        DockyardError::Export(format!("Failed to create {}: {}", path.display(), e))
                    })?;
                    let mut writer = BufWriter::new(file);
                    let count = write_export(ctx, format, &mut writer)?;
                    writer
                        .flush()
                        .map_err(|e| DockyardError::Export(e.to_string()))?;
                    println!("Exported {} templates to {}", count, path.display());
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    write_export(ctx, format, &mut handle)?;
                }
            }
        }

        ExportCommands::Import {
            file,
            skip_existing,
        } => {
            let contents = fs::read_to_string(&file).map_err(|e| {
                DockyardError::Import(format!("Failed to read {}: {}", file.display(), e))
            })?;
            let format = LibraryFormat::from_path(&file.to_string_lossy());
            let export = parse_library(&contents, format)?;

            let summary = import_library(&ctx.storage, export, skip_existing)?;
            println!("Imported {} templates", summary.imported);
            if !summary.skipped.is_empty() {
                println!("Skipped (already present): {}", summary.skipped.join(", "));
            }
        }
    }

    Ok(())
}

fn guess_format(output: Option<&PathBuf>) -> ExportFormat {
    let Some(path) = output else {
        return ExportFormat::Compose;
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
        _ => {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.contains("compose") {
                ExportFormat::Compose
            } else {
                ExportFormat::Yaml
            }
        }
    }
}

fn write_export<W: Write>(ctx: &AppContext, format: ExportFormat, writer: &mut W) -> DockyardResult<usize> {
    match format {
        ExportFormat::Compose => {
            let mut templates = TemplateService::new(&ctx.storage).list()?;
            templates.reverse();
            writer
                .write_all(format_templates(&templates).as_bytes())
                .map_err(|e| DockyardError::Export(e.to_string()))?;
            Ok(templates.len())
        }
        ExportFormat::Yaml => export_library(&ctx.storage, LibraryFormat::Yaml, writer),
        ExportFormat::Json => export_library(&ctx.storage, LibraryFormat::Json, writer),
    }
}
