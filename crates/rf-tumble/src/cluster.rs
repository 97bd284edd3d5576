//! Cluster detection
//!
//! Clusters are evaluated by raw count anywhere on the grid, not by
//! adjacency. One full scan per call; results are in catalog order.

use serde::{Deserialize, Serialize};

use crate::grid::{Coord, Grid};
use crate::paytable::Paytable;
use crate::symbols::{SymbolCatalog, SymbolId, SymbolRole};

/// All cells holding one paying standard symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub symbol: SymbolId,
    /// Cells in scan order (column by column, top to bottom)
    pub cells: Vec<Coord>,
    pub size: u32,
}

/// A multiplier carrier present on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierHit {
    pub coord: Coord,
    pub symbol: SymbolId,
    pub value: f64,
}

/// Scans grids against a catalog and paytable
#[derive(Debug, Clone, Copy)]
pub struct ClusterDetector<'a> {
    catalog: &'a SymbolCatalog,
    paytable: &'a Paytable,
}

impl<'a> ClusterDetector<'a> {
    pub fn new(catalog: &'a SymbolCatalog, paytable: &'a Paytable) -> Self {
        Self { catalog, paytable }
    }

    /// Paying clusters on `grid`, ordered by catalog position.
    ///
    /// Only standard symbols form clusters. Scatters are counted per spin
    /// with [`scatter_count`](Self::scatter_count), carriers are reported by
    /// [`carriers`](Self::carriers).
    pub fn detect(&self, grid: &Grid) -> Vec<ClusterResult> {
        let mut buckets: Vec<Vec<Coord>> = vec![Vec::new(); self.catalog.len()];
        for (coord, symbol) in grid.occupied() {
            if let Some(pos) = self.catalog.position(symbol) {
                buckets[pos].push(coord);
            }
        }

        let mut clusters = Vec::new();
        for (def, cells) in self.catalog.iter().zip(buckets) {
            match def.role {
                SymbolRole::Standard => {
                    let Some(min) = self.paytable.min_cluster(&def.id) else {
                        continue;
                    };
                    let size = cells.len() as u32;
                    if size >= min {
                        clusters.push(ClusterResult {
                            symbol: def.id.clone(),
                            cells,
                            size,
                        });
                    }
                }
                SymbolRole::Scatter | SymbolRole::MultiplierCarrier => {}
            }
        }
        clusters
    }

    /// Every multiplier carrier on `grid`, in scan order
    pub fn carriers(&self, grid: &Grid) -> Vec<CarrierHit> {
        grid.occupied()
            .filter_map(|(coord, symbol)| {
                let def = self.catalog.get(symbol)?;
                match def.role {
                    SymbolRole::MultiplierCarrier => Some(CarrierHit {
                        coord,
                        symbol: symbol.clone(),
                        value: def.pay_weight,
                    }),
                    SymbolRole::Standard | SymbolRole::Scatter => None,
                }
            })
            .collect()
    }

    /// Number of scatter cells on `grid`
    pub fn scatter_count(&self, grid: &Grid) -> u32 {
        let Some(scatter) = self.catalog.scatter() else {
            return 0;
        };
        grid.count_of(&scatter.id) as u32
    }
}
