//! Template CLI commands
//!
//! Implements the commands that create, inspect and remove templates.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use clap::Subcommand;

use crate::display::{format_home, format_template_details};
use crate::error::{DockyardError, DockyardResult};
use crate::export::compose::format_templates;
use crate::models::{ServiceTemplate, TemplateId};
use crate::services::TemplateService;
use crate::state::{DetailViewModel, FormViewModel, HomeViewModel, SortOption};

use super::AppContext;

/// Template subcommands
#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Add a new template
    Add {
        /// Template name
        name: String,
        /// Image reference, e.g. nginx:latest
        image: String,
        /// Port mappings, comma separated (e.g. "80:80,443:443")
        #[arg(short, long)]
        ports: Option<String>,
        /// Volume mappings, comma separated
        #[arg(short, long)]
        volumes: Option<String>,
        /// Environment variable as KEY=value (repeatable)
        #[arg(short, long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// Restart policy: no, always, on-failure
        #[arg(short, long)]
        restart: Option<String>,
        /// Category label
        #[arg(short, long)]
        category: Option<String>,
        /// Do not push the new template to the remote store
        #[arg(long)]
        no_push: bool,
    },

    /// Edit an existing template
    Edit {
        /// Template name or ID
        template: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New image reference
        #[arg(short, long)]
        image: Option<String>,
        /// New port mappings (replaces the old ones)
        #[arg(short, long)]
        ports: Option<String>,
        /// New volume mappings (replaces the old ones)
        #[arg(short, long)]
        volumes: Option<String>,
        /// Environment variable as KEY=value (repeatable, replaces the old set)
        #[arg(short, long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// Remove all environment variables
        #[arg(long, conflicts_with = "env")]
        clear_env: bool,
        /// New restart policy
        #[arg(short, long)]
        restart: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// Do not push the change to the remote store
        #[arg(long)]
        no_push: bool,
    },

    /// List templates
    #[command(alias = "ls")]
    List {
        /// Only templates whose name or image contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Only templates in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Sort order (defaults to the configured one)
        #[arg(long, value_enum)]
        sort: Option<SortOption>,
    },

    /// Show template details
    Show {
        /// Template name or ID
        template: String,
    },

    /// Print templates as a Compose document
    Yaml {
        /// Template names or IDs (all templates when omitted)
        templates: Vec<String>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete templates
    #[command(alias = "rm")]
    Delete {
        /// Template names or IDs
        #[arg(required = true)]
        templates: Vec<String>,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Toggle the favorite flag of a template
    #[command(alias = "fav")]
    Favorite {
        /// Template name or ID
        template: String,
    },

    /// List categories with template counts
    Categories,
}

/// Handle a template command
pub async fn handle_template_command(ctx: &AppContext, cmd: TemplateCommands) -> DockyardResult<()> {
    match cmd {
        TemplateCommands::Add {
            name,
            image,
            ports,
            volumes,
            env,
            restart,
            category,
            no_push,
        } => {
            let form = FormViewModel::create(ctx.storage.clone(), ctx.remote().cloned());
            form.set_name(name);
            form.set_image(image);
            if let Some(ports) = ports {
                form.set_ports(ports);
            }
            if let Some(volumes) = volumes {
                form.set_volumes(volumes);
            }
            form.set_env_vars(env_lines(&env)?);
            if let Some(restart) = restart {
                form.set_restart_policy(restart);
            }
            if let Some(category) = category {
                form.set_category(category);
            }

            let saved = form.save(ctx.settings.auto_push && !no_push).await?;
            println!("Created template: {} (ID: {})", saved.name, saved.id);
        }

        TemplateCommands::Edit {
            template,
            name,
            image,
            ports,
            volumes,
            env,
            clear_env,
            restart,
            category,
            no_push,
        } => {
            let existing = ctx.find_template(&template)?;
            let form = FormViewModel::edit(ctx.storage.clone(), ctx.remote().cloned(), existing.id)?;

            if let Some(name) = name {
                form.set_name(name);
            }
            if let Some(image) = image {
                form.set_image(image);
            }
            if let Some(ports) = ports {
                form.set_ports(ports);
            }
            if let Some(volumes) = volumes {
                form.set_volumes(volumes);
            }
            if clear_env {
                form.set_env_vars("");
            } else if !env.is_empty() {
                form.set_env_vars(env_lines(&env)?);
            }
            if let Some(restart) = restart {
                form.set_restart_policy(restart);
            }
            if let Some(category) = category {
                form.set_category(category);
            }

            let saved = form.save(ctx.settings.auto_push && !no_push).await?;
            println!("Updated template: {} (ID: {})", saved.name, saved.id);
        }

        TemplateCommands::List {
            search,
            category,
            sort,
        } => {
            let sort = sort.unwrap_or(ctx.settings.default_sort);
            let mut home = HomeViewModel::new(ctx.storage.clone(), ctx.remote().cloned(), sort);
            if let Some(query) = search {
                home.search(query);
            }
            if category.is_some() {
                home.select_category(category);
            }

            let state = home.loaded().await;
            print!("{}", format_home(&state));
        }

        TemplateCommands::Show { template } => {
            let detail = open_detail(ctx, &template)?;
            if let Some(t) = detail.state().template {
                print!("{}", format_template_details(&t));
                println!();
                print!("{}", detail.state().yaml);
            }
        }

        TemplateCommands::Yaml { templates, output } => {
            let selected = resolve_templates(ctx, &templates)?;
            if selected.is_empty() {
                return Err(DockyardError::Validation("No templates to render".into()));
            }

            let yaml = if let [single] = selected.as_slice() {
                let detail = DetailViewModel::new(ctx.storage.clone(), ctx.remote().cloned(), single.id)?;
                detail.mark_used()?;
                detail.state().yaml
            } else {
                let service = TemplateService::new(&ctx.storage);
                for t in &selected {
                    service.mark_used(t.id)?;
                }
                format_templates(&selected)
            };

            match output {
                Some(path) => {
                    fs::write(&path, &yaml)?;
                    println!(
                        "Wrote {} service(s) to {}",
                        selected.len(),
                        path.display()
                    );
                }
                None => print!("{}", yaml),
            }
        }

        TemplateCommands::Delete { templates, force } => {
            let selected = resolve_templates(ctx, &templates)?;

            if !force {
                for t in &selected {
                    println!("About to delete template: {}", t.name);
                }
                println!("Use --force to confirm deletion");
                return Ok(());
            }

            if let [single] = selected.as_slice() {
                let detail = DetailViewModel::new(ctx.storage.clone(), ctx.remote().cloned(), single.id)?;
                let removed = detail.delete().await?;
                println!("Deleted template: {}", removed.name);
            } else {
                let home = HomeViewModel::new(ctx.storage.clone(), ctx.remote().cloned(), SortOption::default());
                home.loaded().await;
                for t in &selected {
                    home.toggle_selection(t.id);
                }
                let removed = home.delete_selected().await?;
                println!("Deleted {} templates", removed);
            }
        }

        TemplateCommands::Favorite { template } => {
            let t = ctx.find_template(&template)?;
            let favorite = TemplateService::new(&ctx.storage).toggle_favorite(t.id)?;
            if favorite {
                println!("Marked '{}' as favorite", t.name);
            } else {
                println!("Removed '{}' from favorites", t.name);
            }
        }

        TemplateCommands::Categories => {
            let templates = TemplateService::new(&ctx.storage).list()?;
            if templates.is_empty() {
                println!("No categories found.");
                return Ok(());
            }

            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for t in &templates {
                *counts.entry(t.category.as_str()).or_default() += 1;
            }

            let width = counts.keys().map(|c| c.chars().count()).max().unwrap_or(8).max(8);
            println!("{:<width$}  {:>9}", "Category", "Templates");
            println!("{:-<width$}  {:->9}", "", "");
            for (category, count) in counts {
                println!("{:<width$}  {:>9}", category, count);
            }
        }
    }

    Ok(())
}

fn open_detail(ctx: &AppContext, identifier: &str) -> DockyardResult<DetailViewModel> {
    let t = ctx.find_template(identifier)?;
    DetailViewModel::new(ctx.storage.clone(), ctx.remote().cloned(), t.id)
}

/// Resolve identifiers in order, dropping repeats; no identifiers means all
fn resolve_templates(ctx: &AppContext, identifiers: &[String]) -> DockyardResult<Vec<ServiceTemplate>> {
    if identifiers.is_empty() {
        let mut all = TemplateService::new(&ctx.storage).list()?;
        all.reverse();
        return Ok(all);
    }

    let mut seen: Vec<TemplateId> = Vec::with_capacity(identifiers.len());
    let mut templates = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        let t = ctx.find_template(identifier)?;
        if !seen.contains(&t.id) {
            seen.push(t.id);
            templates.push(t);
        }
    }
    Ok(templates)
}

/// Join `KEY=value` arguments into editor lines, rejecting malformed ones
fn env_lines(pairs: &[String]) -> DockyardResult<String> {
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() => {}
            _ => {
                return Err(DockyardError::Validation(format!(
                    "Invalid environment variable '{}': expected KEY=value",
                    pair
                )))
            }
        }
    }
    Ok(pairs.join("\n"))
}
