// evolution.rs - Round-based evolution at one temperature
//
// A round is N Metropolis steps. The round budget and the thermalisation
// window are both counted in rounds.

use crate::metropolis::{metropolis_step, StepParams};
use crate::state::SystemState;
use rand::Rng;
use tracing::debug;

/// How the N target sites of a round are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteOrder {
    /// Sweep ids 0..N in order.
    #[default]
    Sequential,
    /// N independent uniform draws.
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolveParams {
    pub step: StepParams,
    /// Round budget L.
    pub max_rounds: usize,
    /// Consecutive zero-shift rounds that declare thermalisation; 0 disables.
    pub ther_rounds: usize,
    pub site_order: SiteOrder,
}

/// Why an evolution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// |m| reached 1.
    Converged,
    /// No energy-changing move accepted for `ther_rounds` rounds.
    Thermalized,
    /// `max_rounds` executed without either of the above.
    BudgetExhausted,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::Thermalized => "thermalized",
            Termination::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// Full-resolution history of one run. Index 0 is the initial state, index
/// r the state after round r. Only executed rounds are present.
#[derive(Debug, Clone)]
pub struct EvolutionTrace {
    pub temperature: f64,
    pub states: Vec<SystemState>,
    pub magnetization: Vec<f64>,
    /// Net energy shift applied during each round (0 at index 0).
    pub energy_shift: Vec<f64>,
    /// Σ|dE| over the accepted moves of each round (0 at index 0).
    pub abs_shift: Vec<f64>,
    pub termination: Termination,
}

impl EvolutionTrace {
    /// Number of recorded time frames (rounds + 1).
    pub fn len(&self) -> usize {
        self.magnetization.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnetization.is_empty()
    }

    /// Rounds actually executed.
    pub fn rounds(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn final_state(&self) -> &SystemState {
        &self.states[self.states.len() - 1]
    }

    pub fn final_magnetization(&self) -> f64 {
        self.magnetization[self.magnetization.len() - 1]
    }

    pub fn site_count(&self) -> usize {
        self.states[0].n()
    }
}

/// Energy book-keeping of one round.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoundShift {
    pub net: f64,
    pub abs: f64,
}

impl RoundShift {
    pub fn add(&mut self, delta_e: f64) {
        self.net += delta_e;
        self.abs += delta_e.abs();
    }

    /// No accepted move changed the energy. Cancelling shifts do not count.
    pub fn is_quiet(&self) -> bool {
        self.abs == 0.0
    }
}

/// Trailing window of consecutive quiet rounds.
#[derive(Debug, Clone, Copy)]
pub struct ThermalWindow {
    needed: usize,
    quiet: usize,
}

impl ThermalWindow {
    /// `needed = 0` never reports thermalisation.
    pub fn new(needed: usize) -> Self {
        Self { needed, quiet: 0 }
    }

    pub fn record(&mut self, round: &RoundShift) {
        if round.is_quiet() {
            self.quiet += 1;
        } else {
            self.quiet = 0;
        }
    }

    pub fn quiet_rounds(&self) -> usize {
        self.quiet
    }

    pub fn is_thermalized(&self) -> bool {
        self.needed > 0 && self.quiet >= self.needed
    }
}

/// Evolve `initial` until it orders, thermalises or runs out of rounds.
pub fn evolve(initial: SystemState, params: &EvolveParams, rng: &mut impl Rng) -> EvolutionTrace {
    let n = initial.n();
    let mut spin_sum = initial.spin_sum();

    let mut states = Vec::with_capacity(params.max_rounds.min(1 << 12) + 1);
    let mut magnetization = Vec::with_capacity(states.capacity());
    let mut energy_shift = Vec::with_capacity(states.capacity());
    let mut abs_shift = Vec::with_capacity(states.capacity());

    states.push(initial.clone());
    magnetization.push(spin_sum as f64 / n as f64);
    energy_shift.push(0.0);
    abs_shift.push(0.0);

    let mut state = initial;
    let mut window = ThermalWindow::new(params.ther_rounds);

    let termination = loop {
        let round = states.len() - 1;

        if spin_sum.unsigned_abs() as usize == n {
            break Termination::Converged;
        }
        if window.is_thermalized() {
            break Termination::Thermalized;
        }
        if round >= params.max_rounds {
            break Termination::BudgetExhausted;
        }

        let mut shift = RoundShift::default();
        for i in 0..n {
            let site = match params.site_order {
                SiteOrder::Sequential => i,
                SiteOrder::Random => rng.gen_range(0..n),
            };
            let info = metropolis_step(&mut state, site, &params.step, rng);
            shift.add(info.delta_e);
            spin_sum += info.delta_spin_sum;
        }
        window.record(&shift);

        states.push(state.clone());
        magnetization.push(spin_sum as f64 / n as f64);
        energy_shift.push(shift.net);
        abs_shift.push(shift.abs);
    };

    debug!(
        temperature = params.step.temperature,
        rounds = states.len() - 1,
        termination = termination.as_str(),
        "evolution finished"
    );

    EvolutionTrace {
        temperature: params.step.temperature,
        states,
        magnetization,
        energy_shift,
        abs_shift,
        termination,
    }
}
