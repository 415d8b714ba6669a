//! Fixture catalogue for integration tests
//!
//! Builds a throwaway catalogue layout (subscenes, masks, tags CSV and
//! output directories) inside a temporary directory.

#![allow(dead_code)]

use ndarray::Array3;
use ndarray_npy::write_npy;
use s2_tiler::{MissingTagsPolicy, TileSize, TilerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Catalogue {
    pub root: TempDir,
}

impl Catalogue {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        for dir in ["subscenes", "masks"] {
            fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        Self { root }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Subscene with distinct values per pixel and band
    pub fn add_subscene(&self, id: &str, rows: usize, cols: usize, bands: usize) -> Array3<u16> {
        let data = Array3::from_shape_fn((rows, cols, bands), |(r, c, b)| {
            ((r * 7 + c * 3 + b * 1000) % 60000) as u16 + 1
        });
        write_npy(self.path("subscenes").join(format!("{}.npy", id)), &data).unwrap();
        data
    }

    /// One-hot mask whose first `cloud_rows` rows are cloud, the rest clear
    pub fn add_mask(&self, id: &str, rows: usize, cols: usize, cloud_rows: usize) -> Array3<u8> {
        let data = Array3::from_shape_fn((rows, cols, 3), |(r, _, ch)| {
            let class = if r < cloud_rows { 1 } else { 0 };
            u8::from(ch == class)
        });
        write_npy(self.path("masks").join(format!("{}.npy", id)), &data).unwrap();
        data
    }

    pub fn write_tags(&self, scenes: &[&str]) {
        let mut csv = String::from("scene,difficulty,shadows_marked\n");
        for scene in scenes {
            csv.push_str(&format!("{},2,1\n", scene));
        }
        fs::write(self.path("tags.csv"), csv).unwrap();
    }

    /// Number of tile files written for `id` under `dir`
    pub fn tiles_of(&self, dir: &str, id: &str) -> usize {
        let prefix = format!("{}_TL_", id);
        match fs::read_dir(self.path(dir)) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
                .count(),
            Err(_) => 0,
        }
    }

    pub fn config(&self, tile_size: usize) -> TilerConfig {
        TilerConfig {
            subscene_dir: self.path("subscenes"),
            mask_dir: self.path("masks"),
            tags_path: self.path("tags.csv"),
            shapefile_dir: None,
            tile_size: TileSize::square(tile_size).unwrap(),
            first_n: None,
            output_subscene_dir: self.path("out/subscenes"),
            output_mask_dir: self.path("out/masks"),
            output_subscene_metadata_dir: self.path("out/metadata/subscenes"),
            output_metadata_dir: self.path("out/metadata"),
            compression: "NONE".to_string(),
            missing_tags: MissingTagsPolicy::Fail,
            show_progress: false,
        }
    }
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}
