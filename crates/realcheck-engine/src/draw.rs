//! Draw primitives shared by the pair sampler and the sequence planner.

use rand::seq::SliceRandom;
use rand::Rng;
use realcheck_contracts::catalog::{AssetCatalog, Category, CategoryFilter, Image};
use realcheck_contracts::config::SamplerConfig;
use realcheck_contracts::error::SamplerError;

/// Categories a filter may draw from. Never empty on success.
pub fn resolve_categories(
    catalog: &AssetCatalog,
    filter: CategoryFilter,
) -> Result<Vec<Category>, SamplerError> {
    match filter {
        CategoryFilter::All => {
            let available = catalog.available_categories();
            if available.is_empty() {
                return Err(SamplerError::NoCategoriesAvailable);
            }
            Ok(available)
        }
        CategoryFilter::Only(category) => {
            if !catalog.is_available(category) {
                return Err(SamplerError::CategoryUnavailable { category });
            }
            Ok(vec![category])
        }
    }
}

/// Weighted category draw.
///
/// The primary category occupies `primary_weight` slots of a virtual list and
/// every other candidate one slot; a uniform index into that list picks the
/// category. Without a primary among several candidates the draw is uniform.
pub fn choose_category<R: Rng + ?Sized>(
    candidates: &[Category],
    config: &SamplerConfig,
    rng: &mut R,
) -> Option<Category> {
    if candidates.len() <= 1 {
        return candidates.first().copied();
    }
    let primary = config
        .primary_category
        .filter(|primary| candidates.contains(primary));
    let Some(primary) = primary else {
        return candidates.choose(rng).copied();
    };

    let weight = config.primary_weight.max(1);
    let slots = weight.saturating_add(candidates.len() - 1);
    let slot = rng.gen_range(0..slots);
    if slot < weight {
        return Some(primary);
    }
    candidates
        .iter()
        .copied()
        .filter(|category| *category != primary)
        .nth(slot - weight)
}

/// Bounded-retry rejection sampling.
///
/// Draws uniformly up to `max_attempts` times and returns the first image the
/// `reject` predicate accepts; when every attempt is rejected the last draw is
/// returned anyway. Returns `None` only for an empty pool.
pub fn draw_avoiding<'a, R, F>(
    pool: &'a [Image],
    max_attempts: usize,
    rng: &mut R,
    reject: F,
) -> Option<&'a Image>
where
    R: Rng + ?Sized,
    F: Fn(&Image) -> bool,
{
    let mut last = None;
    for _ in 0..max_attempts.max(1) {
        let pick = pool.choose(rng)?;
        if !reject(pick) {
            return Some(pick);
        }
        last = Some(pick);
    }
    last
}
