mod image;
mod registry;

pub use image::{image_id, Category, CategoryFilter, Image, ImageKind, ImagePair};
pub use registry::{AssetCatalog, AssetCatalogBuilder, CategoryPool};
