use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use realcheck_contracts::catalog::{AssetCatalog, CategoryFilter, Image, ImageKind};
use realcheck_contracts::config::SamplerConfig;
use realcheck_contracts::error::SamplerError;
use realcheck_contracts::history::SessionHistory;

use crate::draw::resolve_categories;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Uninitialized,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReshuffleTrigger {
    /// The cursor ran past the last image of the pass.
    EndOfPass,
    /// `unique_target` advances happened since the last shuffle.
    UniqueTarget,
}

impl ReshuffleTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReshuffleTrigger::EndOfPass => "end_of_pass",
            ReshuffleTrigger::UniqueTarget => "unique_target",
        }
    }
}

/// Swipe mode: walks a shuffled master ordering of the category pool.
///
/// Between two reshuffles no image is shown twice, so every run of
/// `min(unique_target, pool size)` results inside a pass is repeat-free.
#[derive(Debug, Clone)]
pub struct SequencePlanner {
    catalog: Arc<AssetCatalog>,
    config: SamplerConfig,
    filter: Option<CategoryFilter>,
    order: Vec<Image>,
    cursor: usize,
    seen_since_shuffle: usize,
    reshuffles: u64,
    last_reshuffle: Option<ReshuffleTrigger>,
}

impl SequencePlanner {
    pub fn new(catalog: Arc<AssetCatalog>, config: SamplerConfig) -> Result<Self, SamplerError> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            filter: None,
            order: Vec::new(),
            cursor: 0,
            seen_since_shuffle: 0,
            reshuffles: 0,
            last_reshuffle: None,
        })
    }

    pub fn state(&self) -> PlannerState {
        if self.order.is_empty() {
            PlannerState::Uninitialized
        } else {
            PlannerState::Ready
        }
    }

    pub fn filter(&self) -> Option<CategoryFilter> {
        self.filter
    }

    pub fn pool_len(&self) -> usize {
        self.order.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn seen_since_shuffle(&self) -> usize {
        self.seen_since_shuffle
    }

    pub fn reshuffles(&self) -> u64 {
        self.reshuffles
    }

    /// Trigger of the reshuffle performed by the latest `advance`, if any.
    pub fn last_reshuffle(&self) -> Option<ReshuffleTrigger> {
        self.last_reshuffle
    }

    /// Loads the merged real+AI pool for `filter` and shuffles it. On error
    /// the previous sequence is left untouched.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        filter: CategoryFilter,
        history: &mut SessionHistory,
        rng: &mut R,
    ) -> Result<(), SamplerError> {
        let mut pool = self.resolve_pool(filter)?;
        pool.shuffle(rng);

        self.filter = Some(filter);
        self.order = pool;
        self.cursor = 0;
        self.seen_since_shuffle = 0;
        self.reshuffles = 0;
        self.last_reshuffle = None;
        self.record_current(history);
        Ok(())
    }

    pub fn current(&self) -> Option<&Image> {
        self.order.get(self.cursor)
    }

    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        history: &mut SessionHistory,
        rng: &mut R,
    ) -> Option<&Image> {
        if self.order.is_empty() {
            return None;
        }
        self.last_reshuffle = None;
        self.cursor += 1;
        self.seen_since_shuffle += 1;

        if let Some(trigger) = self.reshuffle_trigger() {
            self.reshuffle(rng);
            self.last_reshuffle = Some(trigger);
        }
        self.record_current(history);
        self.current()
    }

    /// Drops the sequence and returns to `Uninitialized`.
    pub fn clear(&mut self) {
        self.filter = None;
        self.order.clear();
        self.cursor = 0;
        self.seen_since_shuffle = 0;
        self.reshuffles = 0;
        self.last_reshuffle = None;
    }

    fn resolve_pool(&self, filter: CategoryFilter) -> Result<Vec<Image>, SamplerError> {
        let mut pool = Vec::new();
        for category in resolve_categories(&self.catalog, filter)? {
            let Some(category_pool) = self.catalog.pools(category) else {
                return Err(SamplerError::StructuralInconsistency {
                    category,
                    kind: ImageKind::Real,
                });
            };
            for kind in [ImageKind::Real, ImageKind::Ai] {
                if category_pool.partition(kind).is_empty() {
                    return Err(SamplerError::StructuralInconsistency { category, kind });
                }
            }
            pool.extend(category_pool.combined().cloned());
        }
        Ok(pool)
    }

    fn reshuffle_trigger(&self) -> Option<ReshuffleTrigger> {
        if self.cursor >= self.order.len() {
            Some(ReshuffleTrigger::EndOfPass)
        } else if self.seen_since_shuffle >= self.config.unique_target {
            Some(ReshuffleTrigger::UniqueTarget)
        } else {
            None
        }
    }

    fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let last_shown = self
            .cursor
            .checked_sub(1)
            .and_then(|idx| self.order.get(idx))
            .map(|image| image.id.clone());

        self.order.shuffle(rng);
        let len = self.order.len();
        if len > 1 && last_shown.as_deref() == Some(self.order[0].id.as_str()) {
            let swap_with = rng.gen_range(1..len);
            self.order.swap(0, swap_with);
        }

        self.cursor = 0;
        self.seen_since_shuffle = 0;
        self.reshuffles += 1;
    }

    fn record_current(&self, history: &mut SessionHistory) {
        if let Some(image) = self.current() {
            history.record(&image.id);
        }
    }
}
