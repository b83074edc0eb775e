use glance_core::{Category, Email};

pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagColor {
    Blue,
    Green,
    Purple,
    Orange,
    Gray,
    /// Anything outside the known categories.
    Slate,
}

impl TagColor {
    pub fn for_category(category: &Category) -> Self {
        match category {
            Category::Work => Self::Blue,
            Category::Personal => Self::Green,
            Category::Promotional => Self::Purple,
            Category::Social => Self::Orange,
            Category::Updates => Self::Gray,
            Category::Other(_) | Category::Uncategorized => Self::Slate,
        }
    }

    /// SGR parameter for terminal output.
    pub fn ansi(self) -> &'static str {
        match self {
            Self::Blue => "34",
            Self::Green => "32",
            Self::Purple => "35",
            Self::Orange => "33",
            Self::Gray => "90",
            Self::Slate => "37",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTag {
    pub label: String,
    pub color: TagColor,
}

impl CategoryTag {
    pub fn for_email(email: &Email) -> Self {
        let label = email
            .category
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string();
        Self {
            label,
            color: TagColor::for_category(&email.category()),
        }
    }
}
