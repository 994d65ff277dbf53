pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod play;
pub mod runs;

pub use catalog::{AssetCatalog, Category, CategoryFilter, Image, ImageKind, ImagePair};
pub use config::SamplerConfig;
pub use error::SamplerError;
pub use events::{EventLog, SessionEvent};
pub use history::SessionHistory;
