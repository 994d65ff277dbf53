use std::path::Path;

use anyhow::{bail, Context};
use indexmap::IndexMap;
use serde::Deserialize;

use super::image::{Category, Image, ImageKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPool {
    pub real: Vec<Image>,
    pub ai: Vec<Image>,
}

impl CategoryPool {
    pub fn is_available(&self) -> bool {
        !self.real.is_empty() && !self.ai.is_empty()
    }

    pub fn partition(&self, kind: ImageKind) -> &[Image] {
        match kind {
            ImageKind::Real => &self.real,
            ImageKind::Ai => &self.ai,
        }
    }

    pub fn len(&self) -> usize {
        self.real.len() + self.ai.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn combined(&self) -> impl Iterator<Item = &Image> {
        self.real.iter().chain(self.ai.iter())
    }
}

/// Immutable category index consumed by the samplers.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    pools: IndexMap<Category, CategoryPool>,
}

impl AssetCatalog {
    pub fn builder() -> AssetCatalogBuilder {
        AssetCatalogBuilder::default()
    }

    pub fn pools(&self, category: Category) -> Option<&CategoryPool> {
        self.pools.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (Category, &CategoryPool)> {
        self.pools.iter().map(|(category, pool)| (*category, pool))
    }

    /// Categories with both partitions populated, in catalog order.
    pub fn available_categories(&self) -> Vec<Category> {
        self.pools
            .iter()
            .filter(|(_, pool)| pool.is_available())
            .map(|(category, _)| *category)
            .collect()
    }

    pub fn is_available(&self, category: Category) -> bool {
        self.pools(category).is_some_and(CategoryPool::is_available)
    }

    pub fn image_count(&self) -> usize {
        self.pools.values().map(CategoryPool::len).sum()
    }

    pub fn from_manifest_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog manifest {}", path.display()))?;
        Self::from_manifest_str(&raw)
            .with_context(|| format!("invalid catalog manifest {}", path.display()))
    }

    pub fn from_manifest_str(raw: &str) -> anyhow::Result<Self> {
        let manifest: CatalogManifest = serde_json::from_str(raw)?;
        let mut builder = Self::builder();
        for (category, partitions) in manifest.categories {
            builder.declare(category);
            for entry in partitions.real {
                let (key, src) = entry.into_parts();
                builder.insert(category, ImageKind::Real, &key, src)?;
            }
            for entry in partitions.ai {
                let (key, src) = entry.into_parts();
                builder.insert(category, ImageKind::Ai, &key, src)?;
            }
        }
        Ok(builder.build())
    }
}

#[derive(Debug, Default)]
pub struct AssetCatalogBuilder {
    pools: IndexMap<Category, CategoryPool>,
}

impl AssetCatalogBuilder {
    /// Registers a category without images so it is reported as unavailable
    /// rather than unknown.
    pub fn declare(&mut self, category: Category) -> &mut Self {
        self.pools.entry(category).or_default();
        self
    }

    pub fn insert(
        &mut self,
        category: Category,
        kind: ImageKind,
        key: &str,
        src: impl Into<String>,
    ) -> anyhow::Result<&mut Self> {
        if key.trim().is_empty() {
            bail!("empty image key in {category}/{kind}");
        }
        let image = Image::new(category, kind, key, src);
        let pool = self.pools.entry(category).or_default();
        let partition = match kind {
            ImageKind::Real => &mut pool.real,
            ImageKind::Ai => &mut pool.ai,
        };
        if partition.iter().any(|existing| existing.id == image.id) {
            bail!("duplicate image id '{}'", image.id);
        }
        partition.push(image);
        Ok(self)
    }

    pub fn build(self) -> AssetCatalog {
        AssetCatalog { pools: self.pools }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogManifest {
    #[serde(default)]
    categories: IndexMap<Category, ManifestPartitions>,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestPartitions {
    #[serde(default)]
    real: Vec<ManifestEntry>,
    #[serde(default)]
    ai: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestEntry {
    Src(String),
    Keyed { key: String, src: String },
}

impl ManifestEntry {
    fn into_parts(self) -> (String, String) {
        match self {
            ManifestEntry::Src(src) => (key_from_src(&src), src),
            ManifestEntry::Keyed { key, src } => (key, src),
        }
    }
}

fn key_from_src(src: &str) -> String {
    Path::new(src)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(src)
        .to_string()
}
