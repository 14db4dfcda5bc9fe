// observables.rs - Magnetisation moments for phase transition analysis

/// Running moments of a magnetisation time series.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesAccumulator {
    count: usize,
    sum: f64,
    sum_abs: f64,
    sum_sq: f64,
    sum_4th: f64,
}

impl TimeSeriesAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_abs += value.abs();
        self.sum_sq += value * value;
        self.sum_4th += value.powi(4);
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }

    pub fn mean_abs(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum_abs / self.count as f64 }
    }

    pub fn moment2(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum_sq / self.count as f64 }
    }

    pub fn moment4(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum_4th / self.count as f64 }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.moment2() - self.mean().powi(2)).max(0.0)
    }

    /// U4 = 1 - <m^4> / (3 <m^2>^2)
    pub fn binder_cumulant(&self) -> f64 {
        let m2 = self.moment2();
        if m2 > 0.0 {
            1.0 - self.moment4() / (3.0 * m2 * m2)
        } else {
            0.0
        }
    }
}

/// Summary of one magnetisation history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MagnetizationStats {
    pub samples: usize,
    pub mean: f64,
    pub mean_abs: f64,
    /// N * Var(m)
    pub susceptibility: f64,
    pub binder_cumulant: f64,
}

impl MagnetizationStats {
    pub fn from_history(history: &[f64], site_count: usize) -> Self {
        let mut acc = TimeSeriesAccumulator::new();
        history.iter().for_each(|&m| acc.push(m));
        Self {
            samples: acc.len(),
            mean: acc.mean(),
            mean_abs: acc.mean_abs(),
            susceptibility: site_count as f64 * acc.variance(),
            binder_cumulant: acc.binder_cumulant(),
        }
    }

    /// Run average of per-run statistics. `samples` is the total over runs.
    pub fn mean_of(runs: &[MagnetizationStats]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }
        let k = runs.len() as f64;
        let avg = |f: fn(&MagnetizationStats) -> f64| runs.iter().map(f).sum::<f64>() / k;
        Self {
            samples: runs.iter().map(|r| r.samples).sum(),
            mean: avg(|r| r.mean),
            mean_abs: avg(|r| r.mean_abs),
            susceptibility: avg(|r| r.susceptibility),
            binder_cumulant: avg(|r| r.binder_cumulant),
        }
    }
}
