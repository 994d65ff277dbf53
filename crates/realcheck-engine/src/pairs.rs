use std::sync::Arc;

use rand::Rng;
use realcheck_contracts::catalog::{AssetCatalog, Category, CategoryFilter, Image, ImageKind, ImagePair};
use realcheck_contracts::config::SamplerConfig;
use realcheck_contracts::error::SamplerError;
use realcheck_contracts::history::SessionHistory;

use crate::draw::{choose_category, draw_avoiding, resolve_categories};

/// Two-alternative mode: one real and one AI image per round.
#[derive(Debug, Clone)]
pub struct PairSampler {
    catalog: Arc<AssetCatalog>,
    config: SamplerConfig,
}

impl PairSampler {
    pub fn new(catalog: Arc<AssetCatalog>, config: SamplerConfig) -> Result<Self, SamplerError> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn next_pair<R: Rng + ?Sized>(
        &self,
        filter: CategoryFilter,
        history: &mut SessionHistory,
        rng: &mut R,
    ) -> Result<ImagePair, SamplerError> {
        let candidates = resolve_categories(&self.catalog, filter)?;
        let category = choose_category(&candidates, &self.config, rng)
            .ok_or(SamplerError::NoCategoriesAvailable)?;

        let real_pool = self.partition(category, ImageKind::Real)?;
        let ai_pool = self.partition(category, ImageKind::Ai)?;

        let real = draw_avoiding(real_pool, self.config.max_attempts, rng, |image| {
            history.contains(&image.id)
        })
        .ok_or(SamplerError::StructuralInconsistency {
            category,
            kind: ImageKind::Real,
        })?
        .clone();

        // A single AI image is shown no matter what.
        let distinct_required = ai_pool.len() > 1;
        let ai = draw_avoiding(ai_pool, self.config.max_attempts, rng, |image| {
            history.contains(&image.id) || (distinct_required && image.id == real.id)
        })
        .ok_or(SamplerError::StructuralInconsistency {
            category,
            kind: ImageKind::Ai,
        })?
        .clone();

        history.record_all([real.id.as_str(), ai.id.as_str()]);
        Ok(ImagePair { real, ai, category })
    }

    fn partition(&self, category: Category, kind: ImageKind) -> Result<&[Image], SamplerError> {
        let pool = self
            .catalog
            .pools(category)
            .map(|pool| pool.partition(kind))
            .unwrap_or_default();
        if pool.is_empty() {
            return Err(SamplerError::StructuralInconsistency { category, kind });
        }
        Ok(pool)
    }
}
