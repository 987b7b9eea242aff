//! Uniform grid over (lon, lat) used to bucket rail segments.
//!
//! Cells are `cell_size_deg` square. Each cell lists the indices of the
//! segments whose bounding box overlaps it, so a segment spanning several
//! cells appears in all of them.

use geo::{Coord, Rect};

/// Upper bound on the number of cells a grid allocates.
pub const MAX_CELLS: usize = 4_000_000;

/// Integer cell address. May lie outside the grid for points off the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub col: i64,
    pub row: i64,
}

#[derive(Clone, Debug)]
pub struct GridPartition {
    origin: Coord,
    cell_size_deg: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl GridPartition {
    /// An empty grid covering `bounds`.
    ///
    /// When `cell_size_deg` would need more than [`MAX_CELLS`] cells the size
    /// is grown until the grid fits; [`cell_size_deg`](Self::cell_size_deg)
    /// reports the size actually used.
    pub fn new(bounds: Rect, cell_size_deg: f64) -> Self {
        let requested = cell_size_deg;
        let mut cell_size_deg = cell_size_deg;
        let (mut cols, mut rows) = Self::extent(bounds, cell_size_deg);

        while cols.saturating_mul(rows) > MAX_CELLS {
            let ratio = cols as f64 * rows as f64 / MAX_CELLS as f64;
            cell_size_deg *= ratio.sqrt().max(1.01);
            (cols, rows) = Self::extent(bounds, cell_size_deg);
        }
        if cell_size_deg != requested {
            log::warn!(
                "Grid of {:.4} deg cells is too large for the network bounds, using {:.4} deg",
                requested,
                cell_size_deg
            );
        }

        Self {
            origin: bounds.min(),
            cell_size_deg,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    fn extent(bounds: Rect, cell_size_deg: f64) -> (usize, usize) {
        let cols = ((bounds.width() / cell_size_deg).floor() as usize) + 1;
        let rows = ((bounds.height() / cell_size_deg).floor() as usize) + 1;
        (cols, rows)
    }

    pub fn cell_size_deg(&self) -> f64 {
        self.cell_size_deg
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Address of the cell containing `coord`.
    pub fn cell_of(&self, coord: Coord) -> CellCoord {
        CellCoord {
            col: ((coord.x - self.origin.x) / self.cell_size_deg).floor() as i64,
            row: ((coord.y - self.origin.y) / self.cell_size_deg).floor() as i64,
        }
    }

    fn slot(&self, cell: CellCoord) -> Option<usize> {
        if cell.col < 0 || cell.row < 0 {
            return None;
        }
        let (col, row) = (cell.col as usize, cell.row as usize);
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(row * self.cols + col)
    }

    /// Register `id` in every cell overlapped by `envelope`.
    pub fn insert(&mut self, id: u32, envelope: Rect) {
        let lo = self.cell_of(envelope.min());
        let hi = self.cell_of(envelope.max());

        for row in lo.row..=hi.row {
            for col in lo.col..=hi.col {
                if let Some(slot) = self.slot(CellCoord { col, row }) {
                    self.cells[slot].push(id);
                }
            }
        }
    }

    /// Segment ids registered in `cell`; empty for cells outside the grid.
    pub fn members(&self, cell: CellCoord) -> &[u32] {
        match self.slot(cell) {
            Some(slot) => &self.cells[slot],
            None => &[],
        }
    }

    /// Cells at Chebyshev distance exactly `ring` from `center`.
    pub fn ring(&self, center: CellCoord, ring: i64) -> impl Iterator<Item = CellCoord> {
        let (c, r) = (center.col, center.row);
        let top_bottom = (c - ring..=c + ring).flat_map(move |col| {
            let rows = if ring == 0 { vec![r] } else { vec![r - ring, r + ring] };
            rows.into_iter().map(move |row| CellCoord { col, row })
        });
        let sides = (r - ring + 1..=r + ring - 1).flat_map(move |row| {
            [c - ring, c + ring]
                .into_iter()
                .map(move |col| CellCoord { col, row })
        });
        top_bottom.chain(sides.filter(move |_| ring > 0))
    }

    /// Largest ring around `center` that can still touch the grid.
    pub fn max_useful_ring(&self, center: CellCoord) -> i64 {
        let cols = self.cols as i64;
        let rows = self.rows as i64;
        let dx = center.col.max(cols - 1 - center.col).max(0 - center.col);
        let dy = center.row.max(rows - 1 - center.row).max(0 - center.row);
        dx.max(dy)
    }

    /// Total number of (cell, segment) registrations.
    pub fn registrations(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}
