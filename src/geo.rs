use crate::error::{Result, TilerError};
use crate::tiling::TileWindow;
use gdal::vector::LayerAccess;
use gdal::Dataset;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Axis-aligned rectangle in the source CRS
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
}

/// Pixel-to-map affine transform.
///
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform anchored at the top-left corner. `y_res` is the
    /// positive pixel height; rows run south.
    pub fn from_origin(west: f64, north: f64, x_res: f64, y_res: f64) -> Self {
        Self {
            origin_x: west,
            pixel_width: x_res,
            row_rotation: 0.0,
            origin_y: north,
            col_rotation: 0.0,
            pixel_height: -y_res,
        }
    }

    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            origin_x: gt[0],
            pixel_width: gt[1],
            row_rotation: gt[2],
            origin_y: gt[3],
            col_rotation: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Map coordinates of a pixel corner
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Enclosing rectangle of the window's four corners
    pub fn tile_bounds(&self, window: &TileWindow) -> GeoBounds {
        let corners = [
            self.apply(window.col_start as f64, window.row_start as f64),
            self.apply(window.col_end as f64, window.row_start as f64),
            self.apply(window.col_start as f64, window.row_end as f64),
            self.apply(window.col_end as f64, window.row_end as f64),
        ];

        let mut bounds = GeoBounds {
            minx: f64::INFINITY,
            maxx: f64::NEG_INFINITY,
            miny: f64::INFINITY,
            maxy: f64::NEG_INFINITY,
        };
        for (x, y) in corners {
            bounds.minx = bounds.minx.min(x);
            bounds.maxx = bounds.maxx.max(x);
            bounds.miny = bounds.miny.min(y);
            bounds.maxy = bounds.maxy.max(y);
        }
        bounds
    }

    /// Transform of the tile itself, origin moved to the window's top-left
    pub fn for_window(&self, window: &TileWindow) -> Self {
        let (origin_x, origin_y) = self.apply(window.col_start as f64, window.row_start as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }
}

/// Georeferencing of one subscene
#[derive(Debug, Clone)]
pub struct Georeference {
    pub transform: GeoTransform,
    /// Spatial reference as WKT, empty if the source had none
    pub projection: String,
    pub footprint: GeoBounds,
}

impl Georeference {
    /// Fit a north-up transform so that `footprint` spans exactly
    /// `rows` x `cols` pixels
    pub fn from_footprint(footprint: GeoBounds, projection: String, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(TilerError::InvalidDimensions(vec![rows, cols]));
        }
        let x_res = (footprint.maxx - footprint.minx) / cols as f64;
        let y_res = (footprint.maxy - footprint.miny) / rows as f64;

        Ok(Self {
            transform: GeoTransform::from_origin(footprint.minx, footprint.maxy, x_res, y_res),
            projection,
            footprint,
        })
    }
}

/// Geospatial bounds of a window, or `MissingTransform` if the image has no
/// georeference
pub fn locate(georeference: Option<&Georeference>, window: &TileWindow) -> Result<GeoBounds> {
    georeference
        .map(|geo| geo.transform.tile_bounds(window))
        .ok_or(TilerError::MissingTransform)
}

/// Footprint shapefile location for a subscene: `{dir}/{id}/{id}.shp`
pub fn shapefile_path(shapefile_dir: &Path, id: &str) -> PathBuf {
    shapefile_dir.join(id).join(format!("{}.shp", id))
}

/// Load the subscene footprint and derive its georeference
pub fn load_georeference(shapefile_dir: &Path, id: &str, rows: usize, cols: usize) -> Result<Georeference> {
    let path = shapefile_path(shapefile_dir, id);
    if !path.exists() {
        return Err(TilerError::file_load(&path, "shapefile not found"));
    }

    info!("Loading footprint shapefile: {}", path.display());
    let dataset = Dataset::open(&path).map_err(|e| TilerError::file_load(&path, e))?;
    let layer = dataset.layer(0).map_err(|e| TilerError::file_load(&path, e))?;

    let extent = layer.get_extent().map_err(|e| TilerError::file_load(&path, e))?;
    let footprint = GeoBounds {
        minx: extent.MinX,
        maxx: extent.MaxX,
        miny: extent.MinY,
        maxy: extent.MaxY,
    };

    let projection = match layer.spatial_ref() {
        Some(srs) => srs.to_wkt()?,
        None => String::new(),
    };

    debug!(
        "Footprint of {}: x=[{:.3}, {:.3}] y=[{:.3}, {:.3}]",
        id, footprint.minx, footprint.maxx, footprint.miny, footprint.maxy
    );

    Georeference::from_footprint(footprint, projection, rows, cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> TileWindow {
        TileWindow {
            row_start,
            row_end,
            col_start,
            col_end,
            is_padded: false,
        }
    }

    #[test]
    fn test_tile_bounds_north_up() {
        let gt = GeoTransform::from_origin(656760.0, 6598540.0, 10.0, 10.0);
        let bounds = gt.tile_bounds(&window(0, 512, 0, 512));

        assert_relative_eq!(bounds.minx, 656760.0);
        assert_relative_eq!(bounds.maxx, 656760.0 + 5120.0);
        assert_relative_eq!(bounds.maxy, 6598540.0);
        assert_relative_eq!(bounds.miny, 6598540.0 - 5120.0);
    }

    #[test]
    fn test_tile_bounds_offset_window() {
        let gt = GeoTransform::from_origin(1000.0, 2000.0, 20.0, 10.0);
        let bounds = gt.tile_bounds(&window(100, 200, 50, 150));

        assert_relative_eq!(bounds.minx, 1000.0 + 50.0 * 20.0);
        assert_relative_eq!(bounds.maxx, 1000.0 + 150.0 * 20.0);
        assert_relative_eq!(bounds.maxy, 2000.0 - 100.0 * 10.0);
        assert_relative_eq!(bounds.miny, 2000.0 - 200.0 * 10.0);
    }

    #[test]
    fn test_tile_bounds_rotated_encloses_corners() {
        let gt = GeoTransform::from_gdal([0.0, 1.0, 0.5, 0.0, 0.5, -1.0]);
        let bounds = gt.tile_bounds(&window(0, 2, 0, 2));
        // corners: (0,0) (2,1) (1,-2) (3,-1)
        assert_relative_eq!(bounds.minx, 0.0);
        assert_relative_eq!(bounds.maxx, 3.0);
        assert_relative_eq!(bounds.miny, -2.0);
        assert_relative_eq!(bounds.maxy, 1.0);
    }

    #[test]
    fn test_for_window_moves_origin() {
        let gt = GeoTransform::from_origin(656760.0, 6598540.0, 10.0, 10.0);
        let tile_gt = gt.for_window(&window(512, 1024, 512, 1024));
        assert_relative_eq!(tile_gt.origin_x, 656760.0 + 5120.0);
        assert_relative_eq!(tile_gt.origin_y, 6598540.0 - 5120.0);
        assert_relative_eq!(tile_gt.pixel_width, 10.0);
        assert_relative_eq!(tile_gt.pixel_height, -10.0);
    }

    #[test]
    fn test_gdal_round_trip() {
        let raw = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(GeoTransform::from_gdal(raw).to_gdal(), raw);
    }

    #[test]
    fn test_footprint_resolution() {
        let footprint = GeoBounds {
            minx: 500000.0,
            maxx: 510220.0,
            miny: 4000000.0,
            maxy: 4005110.0,
        };
        let geo = Georeference::from_footprint(footprint, String::new(), 511, 1022).unwrap();
        assert_relative_eq!(geo.transform.pixel_width, 10.0);
        assert_relative_eq!(geo.transform.pixel_height, -10.0);
        assert_relative_eq!(geo.transform.origin_y, 4005110.0);
    }

    #[test]
    fn test_locate_without_georeference() {
        let result = locate(None, &window(0, 4, 0, 4));
        assert!(matches!(result, Err(TilerError::MissingTransform)));
    }

    #[test]
    fn test_missing_shapefile_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_georeference(dir.path(), "S2A_missing", 10, 10);
        assert!(matches!(result, Err(TilerError::FileLoad { .. })));
    }

    #[test]
    fn test_shapefile_path_layout() {
        let path = shapefile_path(Path::new("/data/shapefiles"), "S2B_X");
        assert_eq!(path, PathBuf::from("/data/shapefiles/S2B_X/S2B_X.shp"));
    }
}
