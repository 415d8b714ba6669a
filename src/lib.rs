// Library exports for testing and reuse

pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod extract;
pub mod geo;
pub mod geotiff;
pub mod io;
pub mod metadata;
pub mod pipeline;
pub mod processor;
pub mod tags;
pub mod tiling;

// Re-export commonly used types
pub use config::TilerConfig;
pub use coverage::cloud_coverage;
pub use error::{Result, TilerError};
pub use extract::{embed_tile, extract_tile, verify_tile};
pub use geo::{GeoBounds, GeoTransform, Georeference};
pub use metadata::{assemble_dataset, assemble_subscene, DatasetMetadata, SensorVariant, SubsceneMetadata, TileRecord};
pub use processor::{Mask, Subscene, TiledImage};
pub use tags::{MissingTagsPolicy, TagTable};
pub use tiling::{TileGrid, TileSize, TileWindow};
