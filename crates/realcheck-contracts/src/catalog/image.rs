use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    People,
    Nature,
    City,
    Interior,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::People,
        Category::Nature,
        Category::City,
        Category::Interior,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::People => "people",
            Category::Nature => "nature",
            Category::City => "city",
            Category::Interior => "interior",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("Unknown category '{}'.", value.trim()))
    }
}

/// Category selection made by the caller. `All` is resolved against the
/// catalog's available categories at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    #[serde(untagged)]
    Only(Category),
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => category.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        value.parse().map(CategoryFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Real,
    Ai,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Real => "real",
            ImageKind::Ai => "ai",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "real" => Ok(ImageKind::Real),
            "ai" | "fake" => Ok(ImageKind::Ai),
            other => Err(format!("Unknown image kind '{other}'.")),
        }
    }
}

/// One catalog entry. `id` is namespaced by category and kind, so two
/// images are the same image exactly when their ids are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub category: Category,
    pub kind: ImageKind,
    pub src: String,
}

impl Image {
    pub fn new(category: Category, kind: ImageKind, key: &str, src: impl Into<String>) -> Self {
        Self {
            id: image_id(category, kind, key),
            category,
            kind,
            src: src.into(),
        }
    }

    pub fn is_ai(&self) -> bool {
        self.kind == ImageKind::Ai
    }
}

pub fn image_id(category: Category, kind: ImageKind, key: &str) -> String {
    format!("{category}-{kind}-{}", key.trim())
}

/// The two-alternative round: exactly one real and one AI image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePair {
    pub real: Image,
    pub ai: Image,
    pub category: Category,
}
