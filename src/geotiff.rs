use crate::error::Result;
use crate::geo::GeoTransform;
use crate::io::to_u16;
use gdal::cpl::CslStringList;
use gdal::raster::Buffer;
use gdal::DriverManager;
use log::debug;
use ndarray::{ArrayView3, Axis};
use std::path::Path;

/// Creation options for tiled tile GeoTIFFs
pub fn create_dataset_options(compression: &str) -> Vec<String> {
    vec![
        "TILED=YES".to_string(),
        format!("COMPRESS={}", compression),
    ]
}

/// Write a rows x cols x bands tile as a georeferenced uint16 GeoTIFF
pub fn write_geotiff_tile(
    path: &Path,
    tile: &ArrayView3<f32>,
    transform: &GeoTransform,
    projection: &str,
    options: &[String],
) -> Result<()> {
    let (height, width, bands) = tile.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;

    let mut gdal_options = CslStringList::new();
    for opt in options {
        gdal_options.add_string(opt)?;
    }

    let mut dataset =
        driver.create_with_band_type_with_options::<u16, _>(path, width, height, bands, &gdal_options)?;

    dataset.set_geo_transform(&transform.to_gdal())?;
    if !projection.is_empty() {
        dataset.set_projection(projection)?;
    }

    for (i, band) in tile.axis_iter(Axis(2)).enumerate() {
        // Logical iteration order is row-major, which is what GDAL expects
        let data: Vec<u16> = band.iter().map(|&v| to_u16(v)).collect();
        let mut buffer = Buffer::new((width, height), data);

        let mut raster_band = dataset.rasterband(i + 1)?;
        raster_band.write((0, 0), (width, height), &mut buffer)?;
    }

    debug!("Wrote {}x{}x{} GeoTIFF {}", height, width, bands, path.display());
    Ok(())
}
