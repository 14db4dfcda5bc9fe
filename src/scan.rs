// scan.rs - Temperature scan: bounded parallel fan-out of independent runs
//
// Every (temperature, run) pair is one job with its own RNG stream and its
// own result slot. The only shared state is the admission gate.

use crate::config::SimConfig;
use crate::error::{IsingError, Result};
use crate::evolution::{evolve, EvolutionTrace, Termination};
use crate::observables::MagnetizationStats;
use crate::utils::rng::run_rng;
use rand::Rng;
use rayon::prelude::*;
use std::sync::{Condvar, Mutex, OnceLock, PoisonError};
use tracing::{info, warn};

// -----------------------------------------------------------------------------
// Temperature grid
// -----------------------------------------------------------------------------

/// Inclusive linear grid of `steps + 1` temperatures from `t0` to `t1`.
/// `steps == 0` yields `[t0]` only.
pub fn temperature_grid(t0: f64, t1: f64, steps: usize) -> Result<Vec<f64>> {
    if !t0.is_finite() || !t1.is_finite() || t0 < 0.0 || t1 < 0.0 {
        return Err(IsingError::invalid(
            "temperature_range",
            format!("temperatures must be finite and >= 0, got [{t0}, {t1}]"),
        ));
    }
    if steps == 0 {
        return Ok(vec![t0]);
    }
    let width = t1 - t0;
    Ok((0..=steps)
        .map(|i| t0 + width * i as f64 / steps as f64)
        .collect())
}

// -----------------------------------------------------------------------------
// Admission gate
// -----------------------------------------------------------------------------

/// Counting semaphore. `acquire` blocks until a permit is free.
pub struct Semaphore {
    available: Mutex<usize>,
    freed: Condvar,
}

/// Released on drop, including during unwinding.
pub struct Permit<'a> {
    gate: &'a Semaphore,
}

impl Semaphore {
    pub fn new(permits: usize) -> Result<Self> {
        if permits == 0 {
            return Err(IsingError::invalid("concurrency_cap", "must be >= 1"));
        }
        Ok(Self { available: Mutex::new(permits), freed: Condvar::new() })
    }

    pub fn acquire(&self) -> Permit<'_> {
        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        while *available == 0 {
            available = self.freed.wait(available).unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
        Permit { gate: self }
    }

    pub fn available(&self) -> usize {
        *self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut available = self.gate.available.lock().unwrap_or_else(PoisonError::into_inner);
        *available += 1;
        self.gate.freed.notify_one();
    }
}

// -----------------------------------------------------------------------------
// Write-once result slots
// -----------------------------------------------------------------------------

/// Fixed set of cells, each of which accepts exactly one write.
pub struct ResultSlots<T> {
    cells: Vec<OnceLock<T>>,
}

impl<T> ResultSlots<T> {
    pub fn new(len: usize) -> Self {
        Self { cells: (0..len).map(|_| OnceLock::new()).collect() }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn write(&self, index: usize, value: T) -> Result<()> {
        let cell = self
            .cells
            .get(index)
            .ok_or_else(|| IsingError::invalid("slot", format!("index {index} out of range")))?;
        cell.set(value).map_err(|_| IsingError::SlotAlreadyWritten { index })
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.cells.get(index).and_then(OnceLock::get)
    }

    /// Take every value in slot order. Fails if any slot was never written.
    pub fn into_vec(self) -> Result<Vec<T>> {
        self.cells
            .into_iter()
            .enumerate()
            .map(|(index, cell)| cell.into_inner().ok_or(IsingError::SlotEmpty { index }))
            .collect()
    }
}

// -----------------------------------------------------------------------------
// Run averaging
// -----------------------------------------------------------------------------

/// How shorter histories are extended to the longest one before averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Repeat the last recorded value (a stopped run keeps its state).
    HoldLast,
    /// Fill with zeros (a stopped run applies no further shift).
    Zero,
}

/// Element-wise mean over histories padded to the longest length.
pub fn average_runs(histories: &[Vec<f64>], padding: Padding) -> Vec<f64> {
    let len = histories.iter().map(Vec::len).max().unwrap_or(0);
    if len == 0 {
        return Vec::new();
    }
    let mut mean = vec![0.0; len];
    for hist in histories {
        let fill = match padding {
            Padding::HoldLast => hist.last().copied().unwrap_or(0.0),
            Padding::Zero => 0.0,
        };
        for (t, slot) in mean.iter_mut().enumerate() {
            *slot += hist.get(t).copied().unwrap_or(fill);
        }
    }
    let runs = histories.len() as f64;
    mean.iter_mut().for_each(|m| *m /= runs);
    mean
}

// -----------------------------------------------------------------------------
// Scan results
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TemperatureResult {
    pub temperature: f64,
    pub runs: Vec<EvolutionTrace>,
    pub mean_magnetization: Vec<f64>,
    pub mean_energy_shift: Vec<f64>,
}

impl TemperatureResult {
    pub fn from_runs(temperature: f64, runs: Vec<EvolutionTrace>) -> Self {
        let mags: Vec<Vec<f64>> = runs.iter().map(|r| r.magnetization.clone()).collect();
        let shifts: Vec<Vec<f64>> = runs.iter().map(|r| r.energy_shift.clone()).collect();
        Self {
            temperature,
            mean_magnetization: average_runs(&mags, Padding::HoldLast),
            mean_energy_shift: average_runs(&shifts, Padding::Zero),
            runs,
        }
    }

    pub fn count(&self, termination: Termination) -> usize {
        self.runs.iter().filter(|r| r.termination == termination).count()
    }

    /// Magnetisation statistics over the trailing `tail_fraction` of each
    /// run's history, averaged over runs.
    pub fn summary(&self, tail_fraction: f64) -> TemperatureSummary {
        let fraction = tail_fraction.clamp(0.0, 1.0);
        let per_run: Vec<MagnetizationStats> = self
            .runs
            .iter()
            .map(|run| {
                let len = run.magnetization.len();
                let tail = ((len as f64 * fraction).ceil() as usize).clamp(1, len.max(1));
                MagnetizationStats::from_history(&run.magnetization[len.saturating_sub(tail)..], run.site_count())
            })
            .collect();

        TemperatureSummary {
            temperature: self.temperature,
            rounds: self.mean_magnetization.len().saturating_sub(1),
            converged: self.count(Termination::Converged),
            thermalized: self.count(Termination::Thermalized),
            budget_exhausted: self.count(Termination::BudgetExhausted),
            stats: MagnetizationStats::mean_of(&per_run),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TemperatureSummary {
    pub temperature: f64,
    pub rounds: usize,
    pub converged: usize,
    pub thermalized: usize,
    pub budget_exhausted: usize,
    pub stats: MagnetizationStats,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub master_seed: u64,
    /// Ordered by ascending grid index.
    pub entries: Vec<TemperatureResult>,
}

impl ScanResult {
    pub fn temperatures(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.temperature).collect()
    }
}

// -----------------------------------------------------------------------------
// Scheduler
// -----------------------------------------------------------------------------

pub fn scan(cfg: &SimConfig) -> Result<ScanResult> {
    scan_with_progress(cfg, |_| {})
}

/// Run every (temperature, run) job with at most `cfg.concurrency_cap`
/// evolutions in flight. Blocks until all jobs have finished.
/// `on_run` is called once per finished run, from the worker thread.
pub fn scan_with_progress<F>(cfg: &SimConfig, on_run: F) -> Result<ScanResult>
where
    F: Fn(&EvolutionTrace) + Sync,
{
    cfg.validate()?;

    let temperatures = temperature_grid(cfg.t_min, cfg.t_max, cfg.t_steps)?;
    let initializer = cfg.initializer()?;
    let runs = cfg.runs_per_temperature;
    let n_jobs = temperatures.len() * runs;

    let master_seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let workers = std::thread::available_parallelism().map_or(1, |n| n.get());

    info!(
        temperatures = temperatures.len(),
        runs_per_temperature = runs,
        workers,
        concurrency_cap = cfg.concurrency_cap,
        master_seed,
        "starting temperature scan"
    );

    // one worker per core; the gate alone bounds the runs in flight
    let gate = Semaphore::new(cfg.concurrency_cap)?;
    let slots = ResultSlots::new(n_jobs);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

    pool.install(|| {
        (0..n_jobs).into_par_iter().try_for_each(|job| -> Result<()> {
            let _permit = gate.acquire();
            let temperature = temperatures[job / runs];

            let mut rng = run_rng(master_seed, job);
            let initial = initializer.build(&mut rng)?;
            let trace = evolve(initial, &cfg.evolve_params(temperature), &mut rng);

            if trace.termination == Termination::BudgetExhausted {
                warn!(
                    temperature,
                    run = job % runs,
                    rounds = trace.rounds(),
                    "round budget exhausted before ordering or thermalisation"
                );
            }
            on_run(&trace);
            slots.write(job, trace)
        })
    })?;

    let mut traces = slots.into_vec()?.into_iter();
    let entries = temperatures
        .iter()
        .map(|&t| TemperatureResult::from_runs(t, traces.by_ref().take(runs).collect()))
        .collect();

    info!(master_seed, jobs = n_jobs, "temperature scan finished");
    Ok(ScanResult { master_seed, entries })
}
