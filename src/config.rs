use crate::cli::Args;
use crate::error::{Result, TilerError};
use crate::tags::MissingTagsPolicy;
use crate::tiling::TileSize;
use std::path::PathBuf;

/// GeoTIFF codecs accepted for subscene tiles
pub const TILE_COMPRESSION: [&str; 4] = ["DEFLATE", "LZW", "ZSTD", "NONE"];

/// Validated settings for one catalogue run
#[derive(Debug, Clone)]
pub struct TilerConfig {
    pub subscene_dir: PathBuf,
    pub mask_dir: PathBuf,
    pub tags_path: PathBuf,
    pub shapefile_dir: Option<PathBuf>,
    pub tile_size: TileSize,
    /// `None` processes every subscene
    pub first_n: Option<usize>,
    pub output_subscene_dir: PathBuf,
    pub output_mask_dir: PathBuf,
    pub output_subscene_metadata_dir: PathBuf,
    pub output_metadata_dir: PathBuf,
    pub compression: String,
    pub missing_tags: MissingTagsPolicy,
    pub show_progress: bool,
}

impl TryFrom<Args> for TilerConfig {
    type Error = TilerError;

    fn try_from(args: Args) -> Result<Self> {
        let tile_size = TileSize::new(args.tile_rows, args.tile_cols)?;

        let compression = args.compression.to_uppercase();
        if !TILE_COMPRESSION.contains(&compression.as_str()) {
            return Err(TilerError::InvalidCompression(args.compression));
        }

        // Ungeoreferenced subscene tiles and mask tiles share file names
        if args.output_subscene_dir == args.output_mask_dir {
            return Err(TilerError::InvalidConfig(format!(
                "subscene and mask tiles would both be written to {}",
                args.output_mask_dir.display()
            )));
        }

        Ok(Self {
            subscene_dir: args.subscene_dir,
            mask_dir: args.mask_dir,
            tags_path: args.classification_tags,
            // An empty SHAPEFILE_DIR in a .env file means "not set"
            shapefile_dir: args.shapefile_dir.filter(|dir| !dir.as_os_str().is_empty()),
            tile_size,
            first_n: (args.first_n > 0).then_some(args.first_n),
            output_subscene_dir: args.output_subscene_dir,
            output_mask_dir: args.output_mask_dir,
            output_subscene_metadata_dir: args.output_subscene_metadata_dir,
            output_metadata_dir: args.output_metadata_dir,
            compression,
            missing_tags: if args.allow_missing_tags {
                MissingTagsPolicy::Empty
            } else {
                MissingTagsPolicy::Fail
            },
            show_progress: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> std::result::Result<Args, clap::Error> {
        let mut argv = vec![
            "s2-tiler",
            "--subscene-dir",
            "in/subscenes",
            "--mask-dir",
            "in/masks",
            "--classification-tags",
            "in/tags.csv",
            "--output-subscene-dir",
            "out/subscenes",
            "--output-mask-dir",
            "out/masks",
            "--output-subscene-metadata-dir",
            "out/metadata/subscenes",
            "--output-metadata-dir",
            "out/metadata",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = TilerConfig::try_from(parse(&[]).unwrap()).unwrap();
        assert_eq!(config.tile_size, TileSize::square(512).unwrap());
        assert_eq!(config.first_n, None);
        assert_eq!(config.compression, "NONE");
        assert_eq!(config.missing_tags, MissingTagsPolicy::Fail);
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--tile-rows",
            "256",
            "--tile-cols",
            "128",
            "--first-n",
            "5",
            "--compression",
            "deflate",
            "--allow-missing-tags",
            "--shapefile-dir",
            "in/shapefiles",
        ])
        .unwrap();
        let config = TilerConfig::try_from(args).unwrap();
        assert_eq!(config.tile_size, TileSize::new(256, 128).unwrap());
        assert_eq!(config.first_n, Some(5));
        assert_eq!(config.compression, "DEFLATE");
        assert_eq!(config.missing_tags, MissingTagsPolicy::Empty);
        assert_eq!(config.shapefile_dir, Some(PathBuf::from("in/shapefiles")));
    }

    #[test]
    fn test_invalid_values() {
        let args = parse(&["--tile-rows", "0"]).unwrap();
        assert!(matches!(TilerConfig::try_from(args), Err(TilerError::InvalidWindow(_))));

        let args = parse(&["--compression", "jpeg"]).unwrap();
        assert!(matches!(
            TilerConfig::try_from(args),
            Err(TilerError::InvalidCompression(c)) if c == "jpeg"
        ));
    }

    #[test]
    fn test_compression_is_case_insensitive() {
        for codec in ["lzw", "Zstd", "NONE"] {
            let config = TilerConfig::try_from(parse(&["--compression", codec]).unwrap()).unwrap();
            assert!(TILE_COMPRESSION.contains(&config.compression.as_str()));
        }
    }

    #[test]
    fn test_shared_tile_directory_rejected() {
        let mut args = parse(&[]).unwrap();
        args.output_mask_dir = PathBuf::from("out/subscenes/");
        assert!(matches!(TilerConfig::try_from(args), Err(TilerError::InvalidConfig(_))));
    }
}
