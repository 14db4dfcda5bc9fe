// metropolis.rs - Single-site Metropolis update with flip and relocation moves

use crate::energy::{excitation_probability, local_energy};
use crate::neighbors::{neighbors, neighbors_at, Topology};
use crate::state::{Location, SystemState};
use rand::Rng;

/// A proposed update for one site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proposal {
    Flip { site: usize },
    Relocate { site: usize, to: Location },
}

/// Returned by `metropolis_step`, allows O(1) book-keeping in the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    pub proposal: Proposal,
    pub accepted: bool,
    /// Realised energy shift, 0 when rejected.
    pub delta_e: f64,
    /// Change in Σ spin: ±2 for an accepted flip, 0 otherwise.
    pub delta_spin_sum: i64,
}

/// Per-step inputs that stay fixed for a whole evolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub temperature: f64,
    /// Probability of proposing a relocation instead of a spin flip.
    pub iter_mode: f64,
    pub topology: Topology,
}

/// Metropolis acceptance: downhill always, uphill with exp(-dE/T).
pub fn accept(delta_e: f64, temperature: f64, rng: &mut impl Rng) -> bool {
    delta_e < 0.0 || rng.gen::<f64>() < excitation_probability(delta_e, temperature)
}

/// Propose and accept/reject one move for `site`. At most one of the
/// site's spin or location changes; every other site is untouched.
pub fn metropolis_step(
    state: &mut SystemState,
    site: usize,
    params: &StepParams,
    rng: &mut impl Rng,
) -> StepInfo {
    let spin = state.spins[site];
    let current = neighbors(site, state, params.topology);
    let current_e = local_energy(spin, &current, &state.spins);

    let flip = params.iter_mode <= 0.0 || rng.gen::<f64>() > params.iter_mode;

    let (proposal, candidate_e) = if flip {
        // neighbours are unchanged by a flip
        (Proposal::Flip { site }, local_energy(-spin, &current, &state.spins))
    } else {
        let to = Location::random(rng);
        let moved = neighbors_at(
            site,
            to,
            state.degrees()[site],
            &state.locations,
            params.topology,
        );
        (Proposal::Relocate { site, to }, local_energy(spin, &moved, &state.spins))
    };

    let delta_e = candidate_e - current_e;
    if !accept(delta_e, params.temperature, rng) {
        return StepInfo { proposal, accepted: false, delta_e: 0.0, delta_spin_sum: 0 };
    }

    let delta_spin_sum = match proposal {
        Proposal::Flip { site } => {
            state.spins[site] = -spin;
            -2 * spin as i64
        }
        Proposal::Relocate { site, to } => {
            state.locations[site] = to;
            0
        }
    };

    StepInfo { proposal, accepted: true, delta_e, delta_spin_sum }
}
