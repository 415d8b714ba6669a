use crate::coverage::{cloud_coverage, CLOUD_CHANNEL};
use crate::error::{Result, TilerError};
use crate::extract::extract_tile;
use crate::geo::{load_georeference, locate, GeoBounds, Georeference};
use crate::geotiff::{create_dataset_options, write_geotiff_tile};
use crate::io::{ensure_dir, load_image, to_u16, to_u8, write_npy_tile, Image};
use crate::tiling::{TileGrid, TileSize, TileWindow};
use log::{debug, info};
use ndarray::Array3;
use std::path::Path;

/// Capabilities shared by subscenes and masks: an owned source array cut
/// into a fixed tile grid
pub trait TiledImage {
    fn image(&self) -> &Image;

    fn tile_size(&self) -> TileSize;

    fn id(&self) -> &str {
        &self.image().id
    }

    fn grid(&self) -> Result<TileGrid> {
        let image = self.image();
        TileGrid::new(image.rows(), image.cols(), self.tile_size())
    }

    fn windows(&self) -> Result<Vec<TileWindow>> {
        Ok(self.grid()?.windows())
    }

    fn extract(&self, window: &TileWindow) -> Result<Array3<f32>> {
        extract_tile(&self.image().view(), window)
    }

    fn tile_id(&self, window: &TileWindow) -> String {
        window.tile_id(self.id())
    }
}

/// Output of one written subscene tile
#[derive(Debug, Clone, PartialEq)]
pub struct SubsceneTile {
    pub id: String,
    pub filename: String,
    pub window: TileWindow,
    pub geospatial_bounds: Option<GeoBounds>,
}

/// Output of one written mask tile
#[derive(Debug, Clone, PartialEq)]
pub struct MaskTile {
    pub id: String,
    pub filename: String,
    pub window: TileWindow,
    pub cloud_coverage: f64,
}

/// Multispectral subscene with optional georeferencing
#[derive(Debug)]
pub struct Subscene {
    image: Image,
    tile_size: TileSize,
    georeference: Option<Georeference>,
}

impl Subscene {
    /// Load a subscene array. With a shapefile directory the subscene's
    /// footprint must exist there.
    pub fn load(path: &Path, tile_size: TileSize, shapefile_dir: Option<&Path>) -> Result<Self> {
        let image = load_image(path)?;
        let georeference = match shapefile_dir {
            Some(dir) => Some(load_georeference(dir, &image.id, image.rows(), image.cols())?),
            None => None,
        };
        Ok(Self::new(image, tile_size, georeference))
    }

    pub fn new(image: Image, tile_size: TileSize, georeference: Option<Georeference>) -> Self {
        Self {
            image,
            tile_size,
            georeference,
        }
    }

    pub fn georeference(&self) -> Option<&Georeference> {
        self.georeference.as_ref()
    }

    /// Write every tile to `output_dir` in row-major order.
    ///
    /// Georeferenced subscenes produce `{tile_id}.tif`, the rest
    /// `{tile_id}.npy`; both hold uint16 values.
    pub fn save_tiles(&self, output_dir: &Path, compression: &str) -> Result<Vec<SubsceneTile>> {
        ensure_dir(output_dir)?;
        let options = create_dataset_options(compression);
        let grid = self.grid()?;
        let mut tiles = Vec::with_capacity(grid.total_tiles);

        for (idx, window) in grid.iter() {
            let tile = self.extract(&window)?;
            let id = self.tile_id(&window);

            let geospatial_bounds = match locate(self.georeference(), &window) {
                Ok(bounds) => Some(bounds),
                Err(TilerError::MissingTransform) => None,
                Err(e) => return Err(e),
            };

            let filename = match self.georeference() {
                Some(geo) => {
                    let filename = format!("{}.tif", id);
                    write_geotiff_tile(
                        &output_dir.join(&filename),
                        &tile.view(),
                        &geo.transform.for_window(&window),
                        &geo.projection,
                        &options,
                    )?;
                    filename
                }
                None => {
                    let filename = format!("{}.npy", id);
                    write_npy_tile(&output_dir.join(&filename), &tile.view(), to_u16)?;
                    filename
                }
            };

            debug!("Subscene tile {} ({}/{})", id, idx + 1, grid.total_tiles);
            tiles.push(SubsceneTile {
                id,
                filename,
                window,
                geospatial_bounds,
            });
        }

        info!(
            "Saved {} subscene tiles for {} ({})",
            tiles.len(),
            self.id(),
            if self.georeference.is_some() { "georeferenced" } else { "no georeference" }
        );
        Ok(tiles)
    }
}

impl TiledImage for Subscene {
    fn image(&self) -> &Image {
        &self.image
    }

    fn tile_size(&self) -> TileSize {
        self.tile_size
    }
}

/// One-hot cloud mask paired with a subscene
#[derive(Debug)]
pub struct Mask {
    image: Image,
    tile_size: TileSize,
}

impl Mask {
    pub fn load(path: &Path, tile_size: TileSize) -> Result<Self> {
        Self::new(load_image(path)?, tile_size)
    }

    /// Fails with `MissingChannel` when the mask has no cloud channel
    pub fn new(image: Image, tile_size: TileSize) -> Result<Self> {
        let channels = image.channels();
        if channels <= CLOUD_CHANNEL {
            return Err(TilerError::MissingChannel {
                channel: CLOUD_CHANNEL,
                channels,
            });
        }
        Ok(Self { image, tile_size })
    }

    /// Write every tile as uint8 `{tile_id}.npy` and record its cloud coverage
    pub fn save_tiles(&self, output_dir: &Path) -> Result<Vec<MaskTile>> {
        ensure_dir(output_dir)?;
        let grid = self.grid()?;
        let mut tiles = Vec::with_capacity(grid.total_tiles);

        for (_, window) in grid.iter() {
            let tile = self.extract(&window)?;
            let id = self.tile_id(&window);
            let coverage = cloud_coverage(&tile.view())?;

            let filename = format!("{}.npy", id);
            write_npy_tile(&output_dir.join(&filename), &tile.view(), to_u8)?;

            debug!("Mask tile {}: cloud coverage {:.4}", id, coverage);
            tiles.push(MaskTile {
                id,
                filename,
                window,
                cloud_coverage: coverage,
            });
        }

        info!("Saved {} mask tiles for {}", tiles.len(), self.id());
        Ok(tiles)
    }
}

impl TiledImage for Mask {
    fn image(&self) -> &Image {
        &self.image
    }

    fn tile_size(&self) -> TileSize {
        self.tile_size
    }
}
