use std::fmt;

use serde::{Deserialize, Serialize};

/// Functional grouping of a table. Determines table order in the full schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Auth,
    Core,
    Business,
    Content,
    Analytics,
    System,
}

/// Keyword fallbacks for tables missing from the configured map, checked in
/// this order.
const KEYWORDS: &[(Category, &[&str])] = &[
    (Category::System, &["notification", "setting", "config", "audit", "job"]),
    (Category::Analytics, &["progress", "analytic", "event", "metric", "statistic"]),
    (
        Category::Business,
        &["payment", "order", "invoice", "subscription", "donation", "intention", "candle"],
    ),
    (
        Category::Content,
        &["post", "prayer", "course", "quiz", "lesson", "article", "comment", "media"],
    ),
    (Category::Auth, &["user", "profile", "session", "account", "role", "token"]),
];

impl Category {
    /// All categories in schema order.
    pub const ALL: [Category; 6] = [
        Category::Auth,
        Category::Core,
        Category::Business,
        Category::Content,
        Category::Analytics,
        Category::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Auth => "auth",
            Category::Core => "core",
            Category::Business => "business",
            Category::Content => "content",
            Category::Analytics => "analytics",
            Category::System => "system",
        }
    }

    /// Guess a category from a table name. Falls back to `Core`.
    pub fn infer(table: &str) -> Category {
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| table.contains(*w)))
            .map_or(Category::Core, |(category, _)| *category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
