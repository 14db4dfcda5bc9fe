//! Metropolis Monte Carlo for an Ising model on mobile sites.
//!
//! Sites carry a spin, a position in the unit square and a fixed number of
//! nearest-neighbour couplings drawn from a truncated Poisson distribution.
//! Each step either flips a spin or relocates a site; a temperature scan runs
//! many independent evolutions on a bounded worker pool.

pub mod config;
pub mod degree;
pub mod energy;
pub mod error;
pub mod evolution;
pub mod export;
pub mod metropolis;
pub mod neighbors;
pub mod observables;
pub mod scan;
pub mod state;
pub mod utils;

pub use config::{Layout, SimConfig};
pub use error::{IsingError, Result};
pub use evolution::{
    evolve, EvolutionTrace, EvolveParams, RoundShift, SiteOrder, Termination, ThermalWindow,
};
pub use scan::{scan, scan_with_progress, ScanResult, TemperatureResult};
pub use state::{Location, SystemState};
