use thiserror::Error;

use crate::catalog::{Category, ImageKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplerError {
    #[error("No categories available: no category has both real and AI images.")]
    NoCategoriesAvailable,

    #[error("Category '{category}' unavailable: it needs both real and AI images.")]
    CategoryUnavailable { category: Category },

    /// Availability passed but a partition read empty afterwards.
    #[error("Catalog inconsistency: '{category}' reported available but its {kind} pool is empty.")]
    StructuralInconsistency { category: Category, kind: ImageKind },

    #[error("Invalid sampler config: {0}")]
    InvalidConfig(String),
}

impl SamplerError {
    /// Missing content the caller should show to the user; never retried.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            SamplerError::NoCategoriesAvailable | SamplerError::CategoryUnavailable { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            SamplerError::NoCategoriesAvailable => "no_categories_available",
            SamplerError::CategoryUnavailable { .. } => "category_unavailable",
            SamplerError::StructuralInconsistency { .. } => "structural_inconsistency",
            SamplerError::InvalidConfig(_) => "invalid_config",
        }
    }
}
