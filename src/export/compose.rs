//! Compose-file formatter
//!
//! Renders templates into a `services:` document. The output is plain text
//! built line by line; only port entries are quoted, nothing else is escaped,
//! so names, images or volumes containing YAML syntax can produce a document
//! Compose will reject.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::models::ServiceTemplate;

/// Slug used when a name has no ASCII letters or digits
const FALLBACK_SLUG: &str = "service";

/// Normalize a display name into a lowercase, hyphenated ASCII identifier
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Hands out slugs that are unique within one document
#[derive(Debug, Default)]
pub struct SlugAllocator {
    used: HashSet<String>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `name`, suffixed `-1`, `-2`, ... if already taken
    pub fn allocate(&mut self, name: &str) -> String {
        let base = slugify(name);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Split a ports/volumes field on commas and newlines, dropping blanks
pub fn split_entries(field: &str) -> Vec<&str> {
    field
        .split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Format a single template as a complete document
pub fn format_template(template: &ServiceTemplate) -> String {
    format_templates(std::slice::from_ref(template))
}

/// Format several templates as one document, in input order
pub fn format_templates(templates: &[ServiceTemplate]) -> String {
    let mut out = String::from("services:\n");
    let mut slugs = SlugAllocator::new();

    for template in templates {
        let key = slugs.allocate(&template.name);
        write_service(&mut out, &key, template);
    }

    out
}

fn write_service(out: &mut String, key: &str, template: &ServiceTemplate) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "  {}:", key);
    let _ = writeln!(out, "    image: {}", template.image);

    let ports = split_entries(&template.ports);
    if !ports.is_empty() {
        out.push_str("    ports:\n");
        for port in ports {
            let _ = writeln!(out, "      - \"{}\"", port);
        }
    }

    let volumes = split_entries(&template.volumes);
    if !volumes.is_empty() {
        out.push_str("    volumes:\n");
        for volume in volumes {
            let _ = writeln!(out, "      - {}", volume);
        }
    }

    let env = template.env_map();
    if !env.is_empty() {
        out.push_str("    environment:\n");
        for (key, value) in &env {
            let _ = writeln!(out, "      - {}={}", key, value);
        }
    }

    if !template.restart_policy.is_default() {
        let _ = writeln!(out, "    restart: {}", template.restart_policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnvMap, RestartPolicy};

    #[test]
    fn test_nginx_example() {
        let t = ServiceTemplate::new("nginx", "nginx:latest")
            .with_ports("80:80")
            .with_restart_policy(RestartPolicy::Always);

        let yaml = format_template(&t);
        let lines: Vec<&str> = yaml.lines().collect();
        assert_eq!(
            lines,
            vec![
                "services:",
                "  nginx:",
                "    image: nginx:latest",
                "    ports:",
                "      - \"80:80\"",
                "    restart: always",
            ]
        );
        assert!(!yaml.contains("environment:"));
    }

    #[test]
    fn test_blank_fields_omit_blocks() {
        let t = ServiceTemplate::new("bare", "alpine").with_ports("  ").with_volumes("\n");
        let yaml = format_template(&t);

        assert!(!yaml.contains("ports:"));
        assert!(!yaml.contains("volumes:"));
        assert!(!yaml.contains("environment:"));
        assert!(!yaml.contains("restart:"));
    }

    #[test]
    fn test_malformed_env_omits_block() {
        let mut t = ServiceTemplate::new("x", "y");
        t.env_vars = "{broken".into();
        assert!(!format_template(&t).contains("environment:"));
    }

    #[test]
    fn test_entries_split_on_comma_and_newline() {
        let t = ServiceTemplate::new("web", "nginx")
            .with_ports("80:80, 443:443\n8080:8080,")
            .with_volumes("./html:/usr/share/nginx/html\n ./conf:/etc/nginx/conf.d ");

        let yaml = format_template(&t);
        assert!(yaml.contains("      - \"80:80\"\n      - \"443:443\"\n      - \"8080:8080\"\n"));
        assert!(yaml.contains("    volumes:\n      - ./html:/usr/share/nginx/html\n      - ./conf:/etc/nginx/conf.d\n"));
    }

    #[test]
    fn test_environment_block() {
        let mut env = EnvMap::new();
        env.insert("POSTGRES_USER".into(), "admin".into());
        env.insert("POSTGRES_DB".into(), "app".into());
        let t = ServiceTemplate::new("db", "postgres:16").with_env(&env);

        let yaml = format_template(&t);
        assert!(yaml.contains(
            "    environment:\n      - POSTGRES_DB=app\n      - POSTGRES_USER=admin\n"
        ));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Web Server"), "my-web-server");
        assert_eq!(slugify("  --API__Gateway--  "), "api-gateway");
        assert_eq!(slugify("Café Crème"), "caf-cr-me");
        assert_eq!(slugify("日本語"), "service");
        assert_eq!(slugify("redis7"), "redis7");
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let templates = vec![
            ServiceTemplate::new("app", "a"),
            ServiceTemplate::new("App", "b"),
            ServiceTemplate::new("app", "c"),
        ];

        let yaml = format_templates(&templates);
        assert!(yaml.contains("  app:\n    image: a\n"));
        assert!(yaml.contains("  app-1:\n    image: b\n"));
        assert!(yaml.contains("  app-2:\n    image: c\n"));
        assert_eq!(yaml.matches("services:").count(), 1);
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let mut slugs = SlugAllocator::new();
        assert_eq!(slugs.allocate("db-1"), "db-1");
        assert_eq!(slugs.allocate("db"), "db");
        assert_eq!(slugs.allocate("db"), "db-2");
    }

    #[test]
    fn test_output_parses_as_yaml() {
        let mut env = EnvMap::new();
        env.insert("MODE".into(), "prod".into());
        let templates = vec![
            ServiceTemplate::new("web", "nginx:latest")
                .with_ports("80:80")
                .with_restart_policy(RestartPolicy::OnFailure),
            ServiceTemplate::new("cache", "redis:7")
                .with_volumes("redis-data:/data")
                .with_env(&env),
        ];

        let doc: serde_yaml::Value = serde_yaml::from_str(&format_templates(&templates)).unwrap();
        let web = &doc["services"]["web"];
        assert_eq!(web["image"].as_str(), Some("nginx:latest"));
        assert_eq!(web["ports"][0].as_str(), Some("80:80"));
        assert_eq!(web["restart"].as_str(), Some("on-failure"));
        assert_eq!(
            doc["services"]["cache"]["environment"][0].as_str(),
            Some("MODE=prod")
        );
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_templates(&[]), "services:\n");
    }
}
