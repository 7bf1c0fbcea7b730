//! Sort orders for the template list

use std::cmp::Reverse;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::models::ServiceTemplate;

/// How the home list is ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Name, case-insensitive
    NameAsc,
    /// Newest first
    #[default]
    DateDesc,
    /// Favorites first, then newest first
    FavoriteFirst,
    /// Most recently used first
    LastUsed,
}

impl SortOption {
    pub fn all() -> &'static [SortOption] {
        &[
            SortOption::NameAsc,
            SortOption::DateDesc,
            SortOption::FavoriteFirst,
            SortOption::LastUsed,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOption::NameAsc => "Name (A-Z)",
            SortOption::DateDesc => "Newest first",
            SortOption::FavoriteFirst => "Favorites first",
            SortOption::LastUsed => "Recently used",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Sort in place; ties keep their input order
pub fn sort_templates(templates: &mut [ServiceTemplate], option: SortOption) {
    match option {
        SortOption::NameAsc => templates.sort_by_cached_key(|t| t.name.to_lowercase()),
        SortOption::DateDesc => templates.sort_by_key(|t| Reverse(t.created_at)),
        SortOption::FavoriteFirst => {
            templates.sort_by_key(|t| (Reverse(t.is_favorite), Reverse(t.created_at)))
        }
        SortOption::LastUsed => templates.sort_by_key(|t| Reverse(t.last_used)),
    }
}

/// Filter by category (when given) and sort
pub fn derive_view(
    templates: &[ServiceTemplate],
    category: Option<&str>,
    option: SortOption,
) -> Vec<ServiceTemplate> {
    let mut view: Vec<ServiceTemplate> = templates
        .iter()
        .filter(|t| category.map_or(true, |c| t.category == c))
        .cloned()
        .collect();
    sort_templates(&mut view, option);
    view
}
