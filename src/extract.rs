use crate::error::{Result, TilerError};
use crate::tiling::TileWindow;
use ndarray::{s, Array3, ArrayView3, ArrayViewMut3};
use num_traits::Zero;

/// Copy the window out of `image` into a new tile of the full window shape.
///
/// Pixels past the image edge are zero.
pub fn extract_tile<A>(image: &ArrayView3<A>, window: &TileWindow) -> Result<Array3<A>>
where
    A: Clone + Zero,
{
    let (rows, cols, channels) = image.dim();
    validate_window(window, rows, cols)?;

    let mut tile = Array3::<A>::zeros((window.height(), window.width(), channels));
    let (row_range, col_range) = window.in_bounds(rows, cols);
    let valid_rows = row_range.len();
    let valid_cols = col_range.len();

    tile.slice_mut(s![..valid_rows, ..valid_cols, ..])
        .assign(&image.slice(s![row_range, col_range, ..]));

    Ok(tile)
}

/// Write the in-bounds part of `tile` back into `target` at its window
pub fn embed_tile<A>(target: &mut ArrayViewMut3<A>, tile: &ArrayView3<A>, window: &TileWindow) -> Result<()>
where
    A: Clone,
{
    let (rows, cols, channels) = target.dim();
    validate_window(window, rows, cols)?;
    check_tile_shape(tile, window, channels)?;

    let (row_range, col_range) = window.in_bounds(rows, cols);
    let valid_rows = row_range.len();
    let valid_cols = col_range.len();

    target
        .slice_mut(s![row_range, col_range, ..])
        .assign(&tile.slice(s![..valid_rows, ..valid_cols, ..]));
    Ok(())
}

/// Check that a tile holds exactly the source pixels of its window
pub fn verify_tile<A>(image: &ArrayView3<A>, tile: &ArrayView3<A>, window: &TileWindow) -> Result<bool>
where
    A: PartialEq,
{
    let (rows, cols, channels) = image.dim();
    validate_window(window, rows, cols)?;
    check_tile_shape(tile, window, channels)?;

    let (row_range, col_range) = window.in_bounds(rows, cols);
    let valid_rows = row_range.len();
    let valid_cols = col_range.len();

    Ok(image.slice(s![row_range, col_range, ..]) == tile.slice(s![..valid_rows, ..valid_cols, ..]))
}

fn validate_window(window: &TileWindow, rows: usize, cols: usize) -> Result<()> {
    if window.row_end <= window.row_start || window.col_end <= window.col_start {
        return Err(TilerError::InvalidWindow(format!(
            "empty window rows {}..{} cols {}..{}",
            window.row_start, window.row_end, window.col_start, window.col_end
        )));
    }
    if window.row_start >= rows || window.col_start >= cols {
        return Err(TilerError::InvalidWindow(format!(
            "window origin ({}, {}) outside {}x{} image",
            window.row_start, window.col_start, rows, cols
        )));
    }
    Ok(())
}

fn check_tile_shape<A>(tile: &ArrayView3<A>, window: &TileWindow, channels: usize) -> Result<()> {
    let expected = (window.height(), window.width(), channels);
    if tile.dim() != expected {
        return Err(TilerError::InvalidWindow(format!(
            "tile shape {:?} does not match window shape {:?}",
            tile.dim(),
            expected
        )));
    }
    Ok(())
}
