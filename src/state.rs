// state.rs - Site positions, degrees and spins of the whole system

use crate::degree::DegreeDistribution;
use crate::energy::local_energy;
use crate::error::{IsingError, Result};
use crate::neighbors::{neighbors, Topology};
use rand::Rng;

/// Position of a site in the unit square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Uniform draw in [0, 1) x [0, 1).
    pub fn random(rng: &mut impl Rng) -> Self {
        Self { x: rng.gen::<f64>(), y: rng.gen::<f64>() }
    }
}

/// Dense per-site arrays indexed by site id `0..n`.
///
/// Degrees are fixed at construction; locations and spins change through
/// accepted Metropolis moves only.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    pub(crate) locations: Vec<Location>,
    degrees: Vec<usize>,
    pub(crate) spins: Vec<i8>,
}

impl SystemState {
    pub fn new(locations: Vec<Location>, degrees: Vec<usize>, spins: Vec<i8>) -> Result<Self> {
        let n = locations.len();
        if degrees.len() != n || spins.len() != n {
            return Err(IsingError::invalid(
                "state",
                format!(
                    "length mismatch: {} locations, {} degrees, {} spins",
                    n,
                    degrees.len(),
                    spins.len()
                ),
            ));
        }
        if n == 0 {
            return Err(IsingError::invalid("state", "at least one site is required"));
        }
        if let Some(s) = spins.iter().find(|&&s| s != 1 && s != -1) {
            return Err(IsingError::invalid("state", format!("spin {s} is not +1 or -1")));
        }
        Ok(Self { locations, degrees, spins })
    }

    /// Mobile initial state: independent uniform positions, degrees drawn
    /// from `dist` and spins uniform over {+1, -1}.
    pub fn random_with(rng: &mut impl Rng, n: usize, dist: &DegreeDistribution) -> Result<Self> {
        if n == 0 {
            return Err(IsingError::invalid("site_count", "must be >= 1"));
        }
        let mut locations = Vec::with_capacity(n);
        let mut degrees = Vec::with_capacity(n);
        let mut spins = Vec::with_capacity(n);
        for _ in 0..n {
            locations.push(Location::random(rng));
            degrees.push(dist.sample(rng)?);
            spins.push(random_spin(rng));
        }
        Ok(Self { locations, degrees, spins })
    }

    /// Fixed `side x side` grid at `(ix / side, iy / side)` with a common
    /// degree and random spins. Meant for the periodic topology.
    pub fn lattice(rng: &mut impl Rng, side: usize, degree: usize) -> Result<Self> {
        if side == 0 {
            return Err(IsingError::invalid("lattice_side", "must be >= 1"));
        }
        let n = side * side;
        let mut locations = Vec::with_capacity(n);
        for ix in 0..side {
            for iy in 0..side {
                locations.push(Location::new(ix as f64 / side as f64, iy as f64 / side as f64));
            }
        }
        let spins = (0..n).map(|_| random_spin(rng)).collect();
        Ok(Self { locations, degrees: vec![degree; n], spins })
    }

    /// Number of sites.
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.spins.len()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Σ spin.
    pub fn spin_sum(&self) -> i64 {
        self.spins.iter().map(|&s| s as i64).sum()
    }

    pub fn magnetization(&self) -> f64 {
        magnetization(&self.spins)
    }

    /// Every spin points the same way.
    pub fn is_ferromagnetic(&self) -> bool {
        self.spin_sum().unsigned_abs() as usize == self.n()
    }

    /// Half the sum of local energies over every site's current neighbour set.
    pub fn total_energy(&self, topology: Topology) -> f64 {
        let sum: f64 = (0..self.n())
            .map(|id| {
                let ns = neighbors(id, self, topology);
                local_energy(self.spins[id], &ns, &self.spins)
            })
            .sum();
        0.5 * sum
    }
}

fn random_spin(rng: &mut impl Rng) -> i8 {
    if rng.gen_bool(0.5) { 1 } else { -1 }
}

/// Mean spin, in [-1, 1].
pub fn magnetization(spins: &[i8]) -> f64 {
    if spins.is_empty() {
        return 0.0;
    }
    let sum: i64 = spins.iter().map(|&s| s as i64).sum();
    sum as f64 / spins.len() as f64
}
