//! Symbol grid with column-wise gravity
//!
//! Cells are stored column-major. Row 0 is the top of a column, so gravity
//! moves symbols towards higher row indices.

use serde::{Deserialize, Serialize};

use crate::config::GridSpec;
use crate::error::{ConfigError, EngineResult};
use crate::sampler::SymbolSource;
use crate::symbols::{SymbolCatalog, SymbolId};

/// Cell coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub column: u8,
    pub row: u8,
}

impl Coord {
    pub fn new(column: u8, row: u8) -> Self {
        Self { column, row }
    }
}

/// Serializable grid state: `[column][row]`, row 0 at the top
pub type GridSnapshot = Vec<Vec<Option<SymbolId>>>;

/// Fixed-size matrix of optional symbol cells
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    columns: u8,
    rows: u8,
    cells: Vec<Option<SymbolId>>,
}

impl Grid {
    /// All-empty grid
    pub fn empty(spec: GridSpec) -> Self {
        Self {
            columns: spec.columns,
            rows: spec.rows,
            cells: vec![None; spec.total_cells()],
        }
    }

    /// Build a full grid from columns (each listed top to bottom)
    pub fn from_columns<T: Into<SymbolId>>(columns: Vec<Vec<T>>) -> Result<Self, ConfigError> {
        let column_count = columns.len();
        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        if column_count == 0 || row_count == 0 {
            return Err(ConfigError::InvalidGrid("grid has no cells".into()));
        }
        if columns.iter().any(|c| c.len() != row_count) {
            return Err(ConfigError::InvalidGrid("ragged columns".into()));
        }
        let (Ok(cols), Ok(rows)) = (u8::try_from(column_count), u8::try_from(row_count)) else {
            return Err(ConfigError::InvalidGrid(format!(
                "{column_count}x{row_count} exceeds 255 in one dimension"
            )));
        };

        let cells = columns
            .into_iter()
            .flatten()
            .map(|s| Some(s.into()))
            .collect();
        Ok(Self {
            columns: cols,
            rows,
            cells,
        })
    }

    /// Build a full grid from rows (top row first), the way grids are drawn
    pub fn from_rows<T: Into<SymbolId>>(rows: Vec<Vec<T>>) -> Result<Self, ConfigError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            return Err(ConfigError::InvalidGrid("ragged rows".into()));
        }

        let mut columns: Vec<Vec<SymbolId>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
        for row in rows {
            for (column, symbol) in columns.iter_mut().zip(row) {
                column.push(symbol.into());
            }
        }
        Self::from_columns(columns)
    }

    pub fn spec(&self) -> GridSpec {
        GridSpec::new(self.columns, self.rows)
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if coord.column < self.columns && coord.row < self.rows {
            Some(coord.column as usize * self.rows as usize + coord.row as usize)
        } else {
            None
        }
    }

    /// Symbol at `coord` (None if empty or out of bounds)
    pub fn get(&self, coord: Coord) -> Option<&SymbolId> {
        self.index(coord).and_then(|i| self.cells[i].as_ref())
    }

    /// Place a symbol; out-of-bounds coordinates are ignored
    pub fn set(&mut self, coord: Coord, symbol: Option<SymbolId>) {
        if let Some(i) = self.index(coord) {
            self.cells[i] = symbol;
        }
    }

    /// All coordinates in scan order (column by column, top to bottom)
    pub fn positions(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.columns).flat_map(move |c| (0..self.rows).map(move |r| Coord::new(c, r)))
    }

    /// Occupied cells in scan order
    pub fn occupied(&self) -> impl Iterator<Item = (Coord, &SymbolId)> + '_ {
        self.positions()
            .zip(self.cells.iter())
            .filter_map(|(coord, cell)| cell.as_ref().map(|s| (coord, s)))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// Number of cells holding `symbol`
    pub fn count_of(&self, symbol: &SymbolId) -> usize {
        self.cells
            .iter()
            .filter(|c| c.as_ref() == Some(symbol))
            .count()
    }

    /// Fill every empty cell from `source`, column by column, top to bottom.
    /// Returns the number of cells filled.
    pub fn fill_empty_cells<S: SymbolSource + ?Sized>(
        &mut self,
        source: &mut S,
        catalog: &SymbolCatalog,
    ) -> EngineResult<usize> {
        let mut filled = 0;
        for cell in self.cells.iter_mut().filter(|c| c.is_none()) {
            *cell = Some(source.next_symbol(catalog)?);
            filled += 1;
        }
        Ok(filled)
    }

    /// Empty the given cells
    pub fn clear<'a>(&mut self, coords: impl IntoIterator<Item = &'a Coord>) {
        for &coord in coords {
            self.set(coord, None);
        }
    }

    /// Compact every column towards the bottom, keeping relative order.
    /// Does not refill.
    pub fn apply_gravity(&mut self) {
        let rows = self.rows as usize;
        for column in self.cells.chunks_mut(rows) {
            // Walk bottom-up, moving each occupied cell to the lowest free slot
            let mut write = rows;
            for read in (0..rows).rev() {
                if column[read].is_some() {
                    write -= 1;
                    if write != read {
                        column[write] = column[read].take();
                    }
                }
            }
        }
    }

    /// Serializable copy of the current state
    pub fn snapshot(&self) -> GridSnapshot {
        self.cells
            .chunks(self.rows as usize)
            .map(|column| column.to_vec())
            .collect()
    }
}
