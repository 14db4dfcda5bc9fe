// config.rs - Run parameters (single source of truth) and their validation

use crate::degree::DegreeDistribution;
use crate::error::{IsingError, Result};
use crate::evolution::{EvolveParams, SiteOrder};
use crate::metropolis::StepParams;
use crate::neighbors::Topology;
use crate::state::SystemState;
use rand::Rng;

/// Where sites live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Continuous positions, open boundaries, sites may relocate.
    #[default]
    Mobile,
    /// Fixed square grid with periodic boundaries, spin flips only.
    Lattice,
}

impl Layout {
    pub fn topology(self) -> Topology {
        match self {
            Layout::Mobile => Topology::Open,
            Layout::Lattice => Topology::Periodic,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub t_min:                f64,
    pub t_max:                f64,
    pub t_steps:              usize,
    pub site_count:           usize,
    pub mean_degree:          f64,
    pub max_degree:           usize,
    pub force_nonzero_degree: bool,
    /// Probability of proposing a relocation rather than a flip.
    pub iter_mode:            f64,
    pub max_rounds:           usize,
    /// 0 disables thermalisation detection.
    pub ther_rounds:          usize,
    pub runs_per_temperature: usize,
    pub concurrency_cap:      usize,
    /// `None` draws a master seed from the OS.
    pub seed:                 Option<u64>,
    pub layout:               Layout,
    /// Degree of every site in the lattice layout.
    pub lattice_degree:       usize,
    pub site_order:           SiteOrder,
    pub max_output_rows:      usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            t_min:                0.0,
            t_max:                3.0,
            t_steps:              6,
            site_count:           400,
            mean_degree:          4.0,
            max_degree:           8,
            force_nonzero_degree: true,
            iter_mode:            0.5,
            max_rounds:           500,
            ther_rounds:          10,
            runs_per_temperature: 1,
            concurrency_cap:      std::thread::available_parallelism().map_or(1, |n| n.get()),
            seed:                 None,
            layout:               Layout::Mobile,
            lattice_degree:       4,
            site_order:           SiteOrder::Sequential,
            max_output_rows:      1000,
        }
    }
}

impl SimConfig {
    /// Reject bad parameters before any simulation work starts.
    pub fn validate(&self) -> Result<()> {
        for (name, t) in [("t_min", self.t_min), ("t_max", self.t_max)] {
            if !t.is_finite() || t < 0.0 {
                return Err(IsingError::invalid(name, format!("must be finite and >= 0, got {t}")));
            }
        }
        if self.t_max < self.t_min {
            return Err(IsingError::invalid(
                "t_max",
                format!("{} is below t_min {}", self.t_max, self.t_min),
            ));
        }
        if self.site_count == 0 {
            return Err(IsingError::invalid("site_count", "must be >= 1"));
        }
        if !self.mean_degree.is_finite() || self.mean_degree < 0.0 {
            return Err(IsingError::invalid(
                "mean_degree",
                format!("must be finite and >= 0, got {}", self.mean_degree),
            ));
        }
        if !(0.0..=1.0).contains(&self.iter_mode) {
            return Err(IsingError::invalid(
                "iter_mode",
                format!("must lie in [0, 1], got {}", self.iter_mode),
            ));
        }
        if self.max_rounds == 0 {
            return Err(IsingError::invalid("max_rounds", "must be >= 1"));
        }
        if self.runs_per_temperature == 0 {
            return Err(IsingError::invalid("runs_per_temperature", "must be >= 1"));
        }
        if self.concurrency_cap == 0 {
            return Err(IsingError::invalid("concurrency_cap", "must be >= 1"));
        }
        if self.max_output_rows == 0 {
            return Err(IsingError::invalid("max_output_rows", "must be >= 1"));
        }
        if self.layout == Layout::Lattice {
            if lattice_side(self.site_count).is_none() {
                return Err(IsingError::invalid(
                    "site_count",
                    format!("lattice layout needs a perfect square, got {}", self.site_count),
                ));
            }
            if self.iter_mode != 0.0 {
                return Err(IsingError::invalid("iter_mode", "lattice sites cannot relocate; use 0"));
            }
        }
        Ok(())
    }

    pub fn degree_distribution(&self) -> Result<DegreeDistribution> {
        DegreeDistribution::build(self.mean_degree, self.max_degree, self.force_nonzero_degree)
    }

    pub fn initializer(&self) -> Result<Initializer> {
        match self.layout {
            Layout::Mobile => Ok(Initializer::Mobile {
                site_count: self.site_count,
                degrees: self.degree_distribution()?,
            }),
            Layout::Lattice => {
                let side = lattice_side(self.site_count).ok_or_else(|| {
                    IsingError::invalid("site_count", "lattice layout needs a perfect square")
                })?;
                Ok(Initializer::Lattice { side, degree: self.lattice_degree })
            }
        }
    }

    pub fn evolve_params(&self, temperature: f64) -> EvolveParams {
        EvolveParams {
            step: StepParams {
                temperature,
                iter_mode: self.iter_mode,
                topology: self.layout.topology(),
            },
            max_rounds: self.max_rounds,
            ther_rounds: self.ther_rounds,
            site_order: self.site_order,
        }
    }
}

/// Builds the random initial state of each run.
#[derive(Debug, Clone)]
pub enum Initializer {
    Mobile { site_count: usize, degrees: DegreeDistribution },
    Lattice { side: usize, degree: usize },
}

impl Initializer {
    pub fn build(&self, rng: &mut impl Rng) -> Result<SystemState> {
        match self {
            Initializer::Mobile { site_count, degrees } => {
                SystemState::random_with(rng, *site_count, degrees)
            }
            Initializer::Lattice { side, degree } => SystemState::lattice(rng, *side, *degree),
        }
    }
}

fn lattice_side(n: usize) -> Option<usize> {
    let side = (n as f64).sqrt().round() as usize;
    (side * side == n && side > 0).then_some(side)
}
