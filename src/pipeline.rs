use crate::config::TilerConfig;
use crate::error::{Result, TilerError};
use crate::io::image_id;
use crate::metadata::{assemble_dataset, assemble_subscene, SensorVariant, SubsceneMetadata};
use crate::processor::{Mask, Subscene, TiledImage};
use crate::tags::TagTable;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A subscene array and the mask array with the same file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscenePair {
    pub id: String,
    pub subscene_path: PathBuf,
    pub mask_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SubsceneFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub tiles: usize,
    pub sensors: Vec<SensorVariant>,
    pub failures: Vec<SubsceneFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// `*.npy` files in `dir`, sorted by file name
pub fn list_npy_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| TilerError::file_load(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "npy") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Subscenes to process, each paired with its mask by file name
pub fn discover_pairs(subscene_dir: &Path, mask_dir: &Path, first_n: Option<usize>) -> Result<Vec<SubscenePair>> {
    let mut subscenes = list_npy_files(subscene_dir)?;
    if let Some(n) = first_n {
        subscenes.truncate(n);
    }

    subscenes
        .into_iter()
        .map(|subscene_path| {
            let id = image_id(&subscene_path)?;
            let mask_path = match subscene_path.file_name() {
                Some(name) => mask_dir.join(name),
                None => return Err(TilerError::file_load(&subscene_path, "not a file")),
            };
            if !mask_path.exists() {
                warn!("No mask found for {} at {}", id, mask_path.display());
            }
            Ok(SubscenePair {
                id,
                subscene_path,
                mask_path,
            })
        })
        .collect()
}

/// Write dataset metadata once for every sensor variant among `pairs`
pub fn write_dataset_metadata(pairs: &[SubscenePair], output_dir: &Path) -> Result<Vec<SensorVariant>> {
    let mut sensors = BTreeSet::new();
    for pair in pairs {
        match SensorVariant::from_identifier(&pair.id) {
            Ok(sensor) => {
                sensors.insert(sensor);
            }
            Err(e) => warn!("{}", e),
        }
    }

    for sensor in &sensors {
        assemble_dataset(*sensor).save(output_dir)?;
    }
    Ok(sensors.into_iter().collect())
}

/// Tile one subscene and its mask, then write the subscene metadata.
///
/// Everything that can reject the pair (inputs, shapes, tags) is checked
/// before the first tile is written. Metadata is only written once every
/// tile of the pair is on disk.
pub fn process_subscene(pair: &SubscenePair, config: &TilerConfig, tags: &TagTable) -> Result<SubsceneMetadata> {
    let subscene = Subscene::load(
        &pair.subscene_path,
        config.tile_size,
        config.shapefile_dir.as_deref(),
    )?;
    let mask = Mask::load(&pair.mask_path, config.tile_size)?;

    let (subscene_rows, subscene_cols) = (subscene.image().rows(), subscene.image().cols());
    let (mask_rows, mask_cols) = (mask.image().rows(), mask.image().cols());
    if (subscene_rows, subscene_cols) != (mask_rows, mask_cols) {
        return Err(TilerError::TileMismatch(format!(
            "subscene {} is {}x{} but its mask is {}x{}",
            pair.id, subscene_rows, subscene_cols, mask_rows, mask_cols
        )));
    }

    let classification_tags = tags.resolve(&pair.id, config.missing_tags)?;

    let subscene_tiles = subscene.save_tiles(&config.output_subscene_dir, &config.compression)?;
    drop(subscene);
    let mask_tiles = mask.save_tiles(&config.output_mask_dir)?;
    drop(mask);

    let metadata = assemble_subscene(&pair.id, classification_tags, &subscene_tiles, &mask_tiles)?;
    metadata.save(&config.output_subscene_metadata_dir)?;
    Ok(metadata)
}

/// Process the whole catalogue.
///
/// A failing subscene is logged and recorded in the summary; the remaining
/// subscenes are still processed.
pub fn run(config: &TilerConfig) -> Result<RunSummary> {
    info!("----- Processing Sentinel-2 catalogue -----");
    let tags = TagTable::from_csv(&config.tags_path)?;
    let pairs = discover_pairs(&config.subscene_dir, &config.mask_dir, config.first_n)?;
    if pairs.is_empty() {
        warn!("No subscenes found in {}", config.subscene_dir.display());
    }

    let sensors = write_dataset_metadata(&pairs, &config.output_metadata_dir)?;
    info!("Processing {} subscenes and masks", pairs.len());

    let progress = if config.show_progress {
        ProgressBar::new(pairs.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} {msg}")
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let results: Vec<(String, Result<SubsceneMetadata>)> = pairs
        .par_iter()
        .map(|pair| {
            let result = process_subscene(pair, config, &tags);
            progress.inc(1);
            (pair.id.clone(), result)
        })
        .collect();
    progress.finish_with_message("done");

    let mut summary = RunSummary {
        total: pairs.len(),
        sensors,
        ..Default::default()
    };
    for (id, result) in results {
        match result {
            Ok(metadata) => {
                summary.processed += 1;
                summary.tiles += metadata.tiles.len();
            }
            Err(e) => {
                error!("Failed to process {}: {}", id, e);
                summary.failures.push(SubsceneFailure {
                    id,
                    error: e.to_string(),
                });
            }
        }
    }

    info!("----- Processing finished -----");
    info!(
        "Processed {}/{} subscenes ({} tiles, {} failed)",
        summary.processed,
        summary.total,
        summary.tiles,
        summary.failures.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn test_list_npy_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "S2B_b.npy");
        touch(dir.path(), "S2A_a.npy");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("nested.npy")).unwrap();

        let files = list_npy_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["S2A_a.npy", "S2B_b.npy"]);
    }

    #[test]
    fn test_discover_pairs_first_n() {
        let subscenes = tempfile::tempdir().unwrap();
        let masks = tempfile::tempdir().unwrap();
        for name in ["S2A_1.npy", "S2A_2.npy", "S2B_3.npy"] {
            touch(subscenes.path(), name);
            touch(masks.path(), name);
        }

        let pairs = discover_pairs(subscenes.path(), masks.path(), Some(2)).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].id, "S2A_1");
        assert_eq!(pairs[1].mask_path, masks.path().join("S2A_2.npy"));

        let all = discover_pairs(subscenes.path(), masks.path(), None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_missing_input_dir() {
        let result = discover_pairs(Path::new("/nonexistent/in"), Path::new("/nonexistent/m"), None);
        assert!(matches!(result, Err(TilerError::FileLoad { .. })));
    }

    #[test]
    fn test_dataset_metadata_once_per_sensor() {
        let out = tempfile::tempdir().unwrap();
        let pair = |id: &str| SubscenePair {
            id: id.to_string(),
            subscene_path: PathBuf::from(format!("{}.npy", id)),
            mask_path: PathBuf::from(format!("{}.npy", id)),
        };
        let pairs = vec![pair("S2A_1"), pair("S2A_2"), pair("S2B_1"), pair("odd")];

        let sensors = write_dataset_metadata(&pairs, out.path()).unwrap();
        assert_eq!(sensors, vec![SensorVariant::S2A, SensorVariant::S2B]);
        assert!(out.path().join("dataset_metadata_S2A.json").exists());
        assert!(out.path().join("dataset_metadata_S2B.json").exists());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 2);
    }
}
