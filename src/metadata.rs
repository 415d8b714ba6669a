use crate::coverage::{CLEAR_CHANNEL, CLOUD_CHANNEL, CLOUD_SHADOW_CHANNEL};
use crate::error::{Result, TilerError};
use crate::geo::GeoBounds;
use crate::io::write_json_atomic;
use crate::processor::{MaskTile, SubsceneTile};
use crate::tags::{ClassificationTags, SCENE_COLUMN};
use crate::tiling::TileWindow;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Metadata of one training sample (subscene tile + mask tile)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub id: String,
    pub image_filename: String,
    pub mask_filename: String,
    pub product_id: String,
    pub original_coords: TileWindow,
    pub geospatial_bounds: Option<GeoBounds>,
    pub cloud_coverage: Option<f64>,
}

/// All tiles of one subscene, in row-major window order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsceneMetadata {
    pub id: String,
    pub product_id: String,
    pub classification_tags: ClassificationTags,
    pub tiles: Vec<TileRecord>,
}

impl SubsceneMetadata {
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }

    /// Write `{id}.json` into `dir`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        write_json_atomic(dir, &self.file_name(), self)
    }
}

/// Merge the tile outputs of a subscene and its mask into one record.
///
/// Subscene and mask tiles are paired by position and must cover the same
/// windows.
pub fn assemble_subscene(
    subscene_id: &str,
    classification_tags: ClassificationTags,
    subscene_tiles: &[SubsceneTile],
    mask_tiles: &[MaskTile],
) -> Result<SubsceneMetadata> {
    let product_id = classification_tags
        .get(SCENE_COLUMN)
        .cloned()
        .unwrap_or_else(|| subscene_id.to_string());

    if subscene_tiles.len() != mask_tiles.len() {
        return Err(TilerError::TileMismatch(format!(
            "{} has {} subscene tiles but {} mask tiles",
            subscene_id,
            subscene_tiles.len(),
            mask_tiles.len()
        )));
    }

    let tiles = subscene_tiles
        .iter()
        .zip(mask_tiles)
        .map(|(image, mask)| {
            if image.window != mask.window {
                return Err(TilerError::TileMismatch(format!(
                    "subscene tile {} and mask tile {} cover different windows",
                    image.id, mask.id
                )));
            }
            Ok(TileRecord {
                id: image.id.clone(),
                image_filename: image.filename.clone(),
                mask_filename: mask.filename.clone(),
                product_id: product_id.clone(),
                original_coords: image.window,
                geospatial_bounds: image.geospatial_bounds,
                cloud_coverage: Some(mask.cloud_coverage),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SubsceneMetadata {
        id: subscene_id.to_string(),
        product_id,
        classification_tags,
        tiles,
    })
}

/// Sentinel-2 satellite of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorVariant {
    S2A,
    S2B,
}

impl SensorVariant {
    /// Sensor from the `S2A`/`S2B` prefix of a subscene or mask id
    pub fn from_identifier(id: &str) -> Result<Self> {
        match id.get(..3) {
            Some("S2A") => Ok(SensorVariant::S2A),
            Some("S2B") => Ok(SensorVariant::S2B),
            _ => Err(TilerError::UnknownSensor(id.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorVariant::S2A => "S2A",
            SensorVariant::S2B => "S2B",
        }
    }
}

impl fmt::Display for SensorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spectral band of the MSI instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandInfo {
    pub band_id: String,
    pub name: String,
    /// nm
    pub center_wavelength: f64,
    /// nm
    pub bandwidth: u32,
    /// Ground sampling distance in metres
    #[serde(rename = "GSD")]
    pub gsd: u32,
}

type BandRow = (&'static str, &'static str, f64, u32, u32);

// Sources: ESA Sentinel-2 MSI spectral response (NASA Earthdata instrument page)
const S2A_BANDS: [BandRow; 13] = [
    ("B01", "Coastal aerosol", 442.7, 20, 60),
    ("B02", "Blue", 492.7, 65, 10),
    ("B03", "Green", 559.8, 35, 10),
    ("B04", "Red", 664.6, 30, 10),
    ("B05", "Vegetation Red Edge", 704.1, 14, 20),
    ("B06", "Vegetation Red Edge", 740.5, 14, 20),
    ("B07", "Vegetation Red Edge", 782.8, 19, 20),
    ("B08", "NIR", 832.8, 105, 10),
    ("B08A", "Vegetation Red Edge", 864.7, 21, 20),
    ("B09", "Water vapour", 945.1, 19, 60),
    ("B10", "SWIR - Cirrus", 1373.5, 29, 60),
    ("B11", "SWIR", 1613.7, 90, 20),
    ("B12", "SWIR", 2202.4, 174, 20),
];

const S2B_BANDS: [BandRow; 13] = [
    ("B01", "Coastal aerosol", 442.3, 20, 60),
    ("B02", "Blue", 492.3, 65, 10),
    ("B03", "Green", 558.9, 35, 10),
    ("B04", "Red", 664.9, 31, 10),
    ("B05", "Vegetation Red Edge", 703.8, 15, 20),
    ("B06", "Vegetation Red Edge", 739.1, 13, 20),
    ("B07", "Vegetation Red Edge", 779.7, 19, 20),
    ("B08", "NIR", 832.9, 104, 10),
    ("B08A", "Vegetation Red Edge", 864.0, 21, 20),
    ("B09", "Water vapour", 943.2, 20, 60),
    ("B10", "SWIR - Cirrus", 1376.9, 29, 60),
    ("B11", "SWIR", 1610.4, 94, 20),
    ("B12", "SWIR", 2185.7, 184, 20),
];

/// Dataset-level constants for one sensor variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub sensor: SensorVariant,
    pub class_mapping: BTreeMap<String, usize>,
    pub bands: Vec<BandInfo>,
}

impl DatasetMetadata {
    pub fn file_name(&self) -> String {
        format!("dataset_metadata_{}.json", self.sensor)
    }

    /// Write `dataset_metadata_{sensor}.json` into `dir`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = write_json_atomic(dir, &self.file_name(), self)?;
        info!("Dataset metadata for {} saved to {}", self.sensor, path.display());
        Ok(path)
    }
}

pub fn class_mapping() -> BTreeMap<String, usize> {
    BTreeMap::from([
        ("CLEAR".to_string(), CLEAR_CHANNEL),
        ("CLOUD".to_string(), CLOUD_CHANNEL),
        ("CLOUD_SHADOW".to_string(), CLOUD_SHADOW_CHANNEL),
    ])
}

pub fn assemble_dataset(sensor: SensorVariant) -> DatasetMetadata {
    let table = match sensor {
        SensorVariant::S2A => &S2A_BANDS,
        SensorVariant::S2B => &S2B_BANDS,
    };

    let bands = table
        .iter()
        .map(|&(band_id, name, center_wavelength, bandwidth, gsd)| BandInfo {
            band_id: band_id.to_string(),
            name: name.to_string(),
            center_wavelength,
            bandwidth,
            gsd,
        })
        .collect();

    DatasetMetadata {
        sensor,
        class_mapping: class_mapping(),
        bands,
    }
}
