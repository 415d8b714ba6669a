use crate::error::{Result, TilerError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Tile extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSize {
    pub rows: usize,
    pub cols: usize,
}

impl TileSize {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(TilerError::InvalidWindow(format!(
                "tile size must be positive, got {}x{}",
                rows, cols
            )));
        }
        Ok(Self { rows, cols })
    }

    pub fn square(size: usize) -> Result<Self> {
        Self::new(size, size)
    }
}

/// Pixel window of one tile in source image coordinates.
///
/// `row_end`/`col_end` are exclusive and always sit one full tile past the
/// start, so trailing windows may reach beyond the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
    pub is_padded: bool,
}

impl TileWindow {
    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }

    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    /// Row and column ranges of the window that fall inside an image of the
    /// given shape. Ranges are empty when the window starts outside.
    pub fn in_bounds(&self, rows: usize, cols: usize) -> (Range<usize>, Range<usize>) {
        let row_end = self.row_end.min(rows);
        let col_end = self.col_end.min(cols);
        (
            self.row_start.min(row_end)..row_end,
            self.col_start.min(col_end)..col_end,
        )
    }

    /// Deterministic tile id derived from the parent subscene or mask id
    pub fn tile_id(&self, parent_id: &str) -> String {
        format!(
            "{}_TL_RS{}_RE{}_CS{}_CE{}",
            parent_id, self.row_start, self.row_end, self.col_start, self.col_end
        )
    }
}

/// Row-major grid of fixed-size tiles covering an image
#[derive(Debug, Clone)]
pub struct TileGrid {
    image_rows: usize,
    image_cols: usize,
    tile_size: TileSize,
    pub num_tiles_x: usize,
    pub num_tiles_y: usize,
    pub total_tiles: usize,
}

impl TileGrid {
    pub fn new(image_rows: usize, image_cols: usize, tile_size: TileSize) -> Result<Self> {
        if image_rows == 0 || image_cols == 0 {
            return Err(TilerError::InvalidWindow(format!(
                "image shape must be positive, got {}x{}",
                image_rows, image_cols
            )));
        }
        if tile_size.rows == 0 || tile_size.cols == 0 {
            return Err(TilerError::InvalidWindow(format!(
                "tile size must be positive, got {}x{}",
                tile_size.rows, tile_size.cols
            )));
        }

        // Ceiling division: a partial tile at the edge still gets a window
        let num_tiles_x = (image_cols + tile_size.cols - 1) / tile_size.cols;
        let num_tiles_y = (image_rows + tile_size.rows - 1) / tile_size.rows;
        let total_tiles = num_tiles_x * num_tiles_y;

        debug!(
            "TileGrid: {}x{} image, tile={}x{} → {}x{} tiles ({} total)",
            image_rows,
            image_cols,
            tile_size.rows,
            tile_size.cols,
            num_tiles_y,
            num_tiles_x,
            total_tiles
        );

        Ok(Self {
            image_rows,
            image_cols,
            tile_size,
            num_tiles_x,
            num_tiles_y,
            total_tiles,
        })
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    pub fn image_shape(&self) -> (usize, usize) {
        (self.image_rows, self.image_cols)
    }

    pub fn iter(&self) -> TileIterator<'_> {
        TileIterator::new(self)
    }

    pub fn windows(&self) -> Vec<TileWindow> {
        self.iter().map(|(_, window)| window).collect()
    }

    /// Window for a linear row-major tile index
    pub fn window(&self, tile_idx: usize) -> TileWindow {
        let tile_y = tile_idx / self.num_tiles_x;
        let tile_x = tile_idx % self.num_tiles_x;

        let row_start = tile_y * self.tile_size.rows;
        let col_start = tile_x * self.tile_size.cols;
        let row_end = row_start + self.tile_size.rows;
        let col_end = col_start + self.tile_size.cols;

        TileWindow {
            row_start,
            row_end,
            col_start,
            col_end,
            is_padded: row_end > self.image_rows || col_end > self.image_cols,
        }
    }
}

pub struct TileIterator<'a> {
    grid: &'a TileGrid,
    current_idx: usize,
}

impl<'a> TileIterator<'a> {
    fn new(grid: &'a TileGrid) -> Self {
        Self {
            grid,
            current_idx: 0,
        }
    }
}

impl<'a> Iterator for TileIterator<'a> {
    type Item = (usize, TileWindow);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_idx < self.grid.total_tiles {
            let window = self.grid.window(self.current_idx);
            let idx = self.current_idx;
            self.current_idx += 1;
            Some((idx, window))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.total_tiles - self.current_idx;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for TileIterator<'a> {}
