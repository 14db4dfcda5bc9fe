// neighbors.rs - k-nearest-neighbour lookup over the current site positions
//
// Neighbour sets are never cached: positions move, so every query scans all
// other sites.

use crate::state::{Location, SystemState};
use std::cmp::Ordering;

/// Boundary condition for distances in the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Plain Euclidean distance, no wraparound (mobile sites).
    #[default]
    Open,
    /// Minimum over the 3x3 tiling of the unit square (fixed lattice).
    Periodic,
}

impl Topology {
    pub fn distance(self, a: Location, b: Location) -> f64 {
        let mut dx = (a.x - b.x).abs();
        let mut dy = (a.y - b.y).abs();
        if self == Topology::Periodic {
            // nearest of the mirror images at offsets {-1, 0, 1}
            dx = dx.min((1.0 - dx).abs());
            dy = dy.min((1.0 - dy).abs());
        }
        (dx * dx + dy * dy).sqrt()
    }
}

/// Ids of the `degree[site]` sites closest to `site`, nearest first.
pub fn neighbors(site: usize, state: &SystemState, topology: Topology) -> Vec<usize> {
    neighbors_at(
        site,
        state.locations()[site],
        state.degrees()[site],
        state.locations(),
        topology,
    )
}

/// Same as [`neighbors`] but with `site` placed at `origin`, which need not
/// be its committed location. Used to evaluate candidate moves.
///
/// Ties in distance go to the lower id. Fewer than `degree` ids come back
/// only when there are fewer than `degree` other sites.
pub fn neighbors_at(
    site: usize,
    origin: Location,
    degree: usize,
    locations: &[Location],
    topology: Topology,
) -> Vec<usize> {
    if degree == 0 {
        return Vec::new();
    }

    let mut by_distance: Vec<(f64, usize)> = locations
        .iter()
        .enumerate()
        .filter(|&(id, _)| id != site)
        .map(|(id, &loc)| (topology.distance(origin, loc), id))
        .collect();

    let cmp = |a: &(f64, usize), b: &(f64, usize)| -> Ordering {
        a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
    };

    if degree < by_distance.len() {
        by_distance.select_nth_unstable_by(degree - 1, cmp);
        by_distance.truncate(degree);
    }
    by_distance.sort_unstable_by(cmp);

    by_distance.into_iter().map(|(_, id)| id).collect()
}
