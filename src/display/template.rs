//! Template display formatting
//!
//! Formats templates for terminal output in table and detail views.

use chrono::{DateTime, Local, Utc};

use crate::models::ServiceTemplate;
use crate::state::HomeUiState;

fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Format a list of templates as a table
pub fn format_template_list(templates: &[ServiceTemplate]) -> String {
    if templates.is_empty() {
        return "No templates found.".to_string();
    }

    let id_width = templates
        .iter()
        .map(|t| t.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);

    let name_width = templates
        .iter()
        .map(|t| t.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let image_width = templates
        .iter()
        .map(|t| t.image.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);

    let category_width = templates
        .iter()
        .map(|t| t.category.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>id_width$}  {:1}  {:<name_width$}  {:<image_width$}  {:<category_width$}  {:<10}  {}\n",
        "ID",
        "*",
        "Name",
        "Image",
        "Category",
        "Restart",
        "Last used",
    ));

    output.push_str(&format!(
        "{:->id_width$}  {:-<1}  {:-<name_width$}  {:-<image_width$}  {:-<category_width$}  {:-<10}  {:-<16}\n",
        "", "", "", "", "", "", "",
    ));

    for template in templates {
        output.push_str(&format!(
            "{:>id_width$}  {:1}  {:<name_width$}  {:<image_width$}  {:<category_width$}  {:<10}  {}\n",
            template.id.to_string(),
            if template.is_favorite { "*" } else { "" },
            template.name,
            template.image,
            template.category,
            template.restart_policy.to_string(),
            format_timestamp(template.last_used_utc()),
        ));
    }

    output
}

/// Format the list screen: filter line, table and pending message
pub fn format_home(state: &HomeUiState) -> String {
    let mut output = String::new();

    let mut filters = vec![format!("sort: {}", state.sort_option)];
    if !state.search_query.trim().is_empty() {
        filters.push(format!("search: \"{}\"", state.search_query.trim()));
    }
    if let Some(category) = &state.selected_category {
        filters.push(format!("category: {}", category));
    }
    output.push_str(&format!("Templates ({})\n", filters.join(", ")));
    output.push('\n');

    output.push_str(&format_template_list(&state.templates));
    if !state.templates.is_empty() {
        output.push_str(&format!("\n{} template(s)\n", state.templates.len()));
    }

    if let Some(message) = &state.user_message {
        output.push_str(&format!("\n{}\n", message));
    }

    output
}

/// Format a single template's details
pub fn format_template_details(template: &ServiceTemplate) -> String {
    let mut output = String::new();

    output.push_str(&format!("Template: {}\n", template.name));
    output.push_str(&format!("  ID:          {}\n", template.id));
    output.push_str(&format!("  Image:       {}\n", template.image));
    output.push_str(&format!("  Category:    {}\n", template.category));
    output.push_str(&format!("  Restart:     {}\n", template.restart_policy));
    output.push_str(&format!(
        "  Favorite:    {}\n",
        if template.is_favorite { "Yes" } else { "No" }
    ));
    output.push_str(&format!(
        "  Created:     {}\n",
        format_timestamp(template.created_at_utc())
    ));
    output.push_str(&format!(
        "  Last used:   {}\n",
        format_timestamp(template.last_used_utc())
    ));
    if let Some(remote_id) = template.remote_id {
        output.push_str(&format!("  Remote ID:   {}\n", remote_id));
    }

    let field_lines = |label: &str, value: &str, output: &mut String| {
        let entries: Vec<&str> = crate::export::compose::split_entries(value);
        if !entries.is_empty() {
            output.push_str(&format!("  {}:\n", label));
            for entry in entries {
                output.push_str(&format!("    - {}\n", entry));
            }
        }
    };
    field_lines("Ports", &template.ports, &mut output);
    field_lines("Volumes", &template.volumes, &mut output);

    let env = template.env_map();
    if !env.is_empty() {
        output.push_str("  Environment:\n");
        for (key, value) in &env {
            output.push_str(&format!("    {}={}\n", key, value));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RestartPolicy, TemplateId};

    fn sample() -> ServiceTemplate {
        let mut t = ServiceTemplate::new("nginx", "nginx:latest")
            .with_ports("80:80, 443:443")
            .with_restart_policy(RestartPolicy::Always);
        t.id = TemplateId::new(3);
        t.is_favorite = true;
        t.env_vars = r#"{"TZ":"UTC"}"#.into();
        t
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_template_list(&[]), "No templates found.");
    }

    #[test]
    fn test_list_columns() {
        let output = format_template_list(&[sample()]);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Name"));
        assert!(lines[2].contains("nginx:latest"));
        assert!(lines[2].contains("always"));
        assert!(lines[2].ends_with("never"));
    }

    #[test]
    fn test_details() {
        let output = format_template_details(&sample());
        assert!(output.starts_with("Template: nginx\n"));
        assert!(output.contains("  Favorite:    Yes\n"));
        assert!(output.contains("    - 443:443\n"));
        assert!(output.contains("    TZ=UTC\n"));
        assert!(!output.contains("Volumes"));
        assert!(!output.contains("Remote ID"));
    }

    #[test]
    fn test_home_shows_filters_and_message() {
        let state = HomeUiState {
            templates: vec![sample()],
            search_query: "ng".into(),
            selected_category: Some("General".into()),
            user_message: Some("Sync completed".into()),
            ..HomeUiState::default()
        };

        let output = format_home(&state);
        assert!(output.starts_with("Templates (sort: Newest first, search: \"ng\", category: General)"));
        assert!(output.contains("1 template(s)"));
        assert!(output.trim_end().ends_with("Sync completed"));
    }
}
