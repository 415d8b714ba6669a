use clap::Parser;
use env_logger::Env;
use log::{error, info};

use s2_tiler::cli::Args;
use s2_tiler::pipeline;
use s2_tiler::{Result, TilerConfig};

fn main() -> Result<()> {
    // Paths and tile size may come from a .env file next to the catalogue
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Sentinel-2 Cloud Mask Tiler ===");

    // Set thread pool size if specified
    if let Some(n_threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
        {
            error!("Failed to build thread pool: {}", e);
        } else {
            info!("Using {} threads", n_threads);
        }
    } else {
        info!("Using all available threads");
    }

    let config = TilerConfig::try_from(args)?;
    info!(
        "Tile size: {}x{}, compression: {}, georeferencing: {}",
        config.tile_size.rows,
        config.tile_size.cols,
        config.compression,
        config
            .shapefile_dir
            .as_ref()
            .map_or("off".to_string(), |dir| dir.display().to_string())
    );

    let summary = pipeline::run(&config)?;

    info!("Subscene tiles saved to {}", config.output_subscene_dir.display());
    info!("Mask tiles saved to {}", config.output_mask_dir.display());
    info!("Metadata saved to {}", config.output_subscene_metadata_dir.display());

    if !summary.is_success() {
        for failure in &summary.failures {
            error!("  {}: {}", failure.id, failure.error);
        }
        error!("{} of {} subscenes failed", summary.failures.len(), summary.total);
        std::process::exit(1);
    }

    info!("=== Done! ===");
    Ok(())
}
