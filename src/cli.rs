use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "s2-tiler")]
#[command(about = "Tile the Sentinel-2 cloud mask catalogue into training samples with JSON metadata")]
#[command(version)]
pub struct Args {
    /// Directory with subscene arrays (*.npy)
    #[arg(long, env = "INPUT_SUBSCENE_DIR", value_name = "DIR")]
    pub subscene_dir: PathBuf,

    /// Directory with mask arrays, same file names as the subscenes
    #[arg(long, env = "INPUT_MASK_DIR", value_name = "DIR")]
    pub mask_dir: PathBuf,

    /// Classification tags CSV (one row per subscene, keyed by `scene`)
    #[arg(long, env = "INPUT_CLASSIF_TAGS", value_name = "FILE")]
    pub classification_tags: PathBuf,

    /// Directory with footprint shapefiles laid out as {id}/{id}.shp
    #[arg(long, env = "SHAPEFILE_DIR", value_name = "DIR")]
    pub shapefile_dir: Option<PathBuf>,

    /// Tile height in pixels
    #[arg(long, env = "TILE_SIZE_X", default_value_t = 512)]
    pub tile_rows: usize,

    /// Tile width in pixels
    #[arg(long, env = "TILE_SIZE_Y", default_value_t = 512)]
    pub tile_cols: usize,

    /// Only process the first N subscenes (0 = all)
    #[arg(long, env = "FIRST_N", default_value_t = 0)]
    pub first_n: usize,

    /// Output directory for subscene tiles
    #[arg(long, env = "OUTPUT_SUBSCENE_DIR", value_name = "DIR")]
    pub output_subscene_dir: PathBuf,

    /// Output directory for mask tiles
    #[arg(long, env = "OUTPUT_MASKS_DIR", value_name = "DIR")]
    pub output_mask_dir: PathBuf,

    /// Output directory for per-subscene metadata
    #[arg(long, env = "OUTPUT_METADATA_SUBSCENES_DIR", value_name = "DIR")]
    pub output_subscene_metadata_dir: PathBuf,

    /// Output directory for dataset metadata
    #[arg(long, env = "OUTPUT_METADATA_DIR", value_name = "DIR")]
    pub output_metadata_dir: PathBuf,

    /// GeoTIFF compression (DEFLATE, LZW, ZSTD, NONE)
    #[arg(long, env = "TILE_COMPRESSION", default_value = "NONE")]
    pub compression: String,

    /// Use empty classification tags for subscenes missing from the CSV
    /// instead of failing them
    #[arg(long)]
    pub allow_missing_tags: bool,

    /// Number of threads (default: all available)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
