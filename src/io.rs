use crate::error::{Result, TilerError};
use log::{debug, info};
use ndarray::{Array3, ArrayD, ArrayView3, Axis, Ix3};
use ndarray_npy::{read_npy, write_npy, ReadNpyError, ReadableElement, WritableElement};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Source array of a subscene or mask, held as rows x cols x channels
#[derive(Debug, Clone)]
pub struct Image {
    pub id: String,
    pub path: PathBuf,
    pub data: Array3<f32>,
}

impl Image {
    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }
}

/// Image id from a file name: everything before the first `.`
pub fn image_id(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TilerError::file_load(path, "file name is not valid UTF-8"))?;

    let id = file_name.split('.').next().unwrap_or_default();
    if id.is_empty() {
        return Err(TilerError::file_load(path, "cannot derive an id from the file name"));
    }
    Ok(id.to_string())
}

/// Read a 2-D or 3-D `.npy` array of any supported numeric element type
pub fn load_image(path: &Path) -> Result<Image> {
    info!("Loading array: {}", path.display());
    let id = image_id(path)?;

    let data = read_any_as_f32(path)?;
    let shape = data.shape().to_vec();
    if shape.iter().any(|&dim| dim == 0) {
        return Err(TilerError::InvalidDimensions(shape));
    }

    let data = match data.ndim() {
        2 => data.insert_axis(Axis(2)).into_dimensionality::<Ix3>()?,
        3 => data.into_dimensionality::<Ix3>()?,
        _ => return Err(TilerError::InvalidDimensions(shape)),
    };

    let (rows, cols, channels) = data.dim();
    debug!("Array {}: {}x{}x{}", id, rows, cols, channels);

    Ok(Image {
        id,
        path: path.to_path_buf(),
        data,
    })
}

fn read_any_as_f32(path: &Path) -> Result<ArrayD<f32>> {
    if let Some(data) = try_read::<f32>(path, |v| v)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<u16>(path, f32::from)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<u8>(path, f32::from)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<bool>(path, |v| if v { 1.0 } else { 0.0 })? {
        return Ok(data);
    }
    if let Some(data) = try_read::<f64>(path, |v| v as f32)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<i16>(path, f32::from)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<i32>(path, |v| v as f32)? {
        return Ok(data);
    }
    // numpy's default integer type
    if let Some(data) = try_read::<i64>(path, |v| v as f32)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<u32>(path, |v| v as f32)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<u64>(path, |v| v as f32)? {
        return Ok(data);
    }
    if let Some(data) = try_read::<i8>(path, f32::from)? {
        return Ok(data);
    }
    Err(TilerError::file_load(path, "unsupported array element type"))
}

/// `Ok(None)` when the file holds a different element type
fn try_read<A>(path: &Path, convert: fn(A) -> f32) -> Result<Option<ArrayD<f32>>>
where
    A: ReadableElement + Copy,
{
    match read_npy::<_, ArrayD<A>>(path) {
        Ok(data) => Ok(Some(data.mapv(convert))),
        Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
        Err(e) => Err(TilerError::file_load(path, e)),
    }
}

/// Saturating cast used for subscene reflectance tiles
pub fn to_u16(value: f32) -> u16 {
    value as u16
}

/// Saturating cast used for one-hot mask tiles
pub fn to_u8(value: f32) -> u8 {
    value as u8
}

/// Write one tile as `.npy`, converting elements with `convert`
pub fn write_npy_tile<A>(path: &Path, tile: &ArrayView3<f32>, convert: fn(f32) -> A) -> Result<()>
where
    A: WritableElement,
{
    let converted: Array3<A> = tile.mapv(convert);
    write_npy(path, &converted)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Create an output directory if it does not exist yet
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        info!("Creating output directory: {}", dir.display());
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Pretty-print `value` to `dir/file_name`.
///
/// The document is written to a temporary file in the same directory and
/// renamed into place, so readers never see a partial file.
pub fn write_json_atomic<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(file_name);

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| TilerError::Io(e.error))?;

    debug!("Wrote {}", path.display());
    Ok(path)
}
