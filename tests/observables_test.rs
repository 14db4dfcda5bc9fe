use approx::assert_abs_diff_eq;
use mobile_ising::observables::{MagnetizationStats, TimeSeriesAccumulator};

#[test]
fn test_binder_cumulant_limits() {
    // Two-state (ordered) series: U4 = 2/3
    let mut ordered = TimeSeriesAccumulator::new();
    for i in 0..100 {
        ordered.push(if i % 2 == 0 { 1.0 } else { -1.0 });
    }
    assert_abs_diff_eq!(ordered.binder_cumulant(), 2.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(ordered.mean(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(ordered.mean_abs(), 1.0, epsilon = 1e-12);

    // All-zero series has no second moment
    let mut empty = TimeSeriesAccumulator::new();
    empty.push(0.0);
    assert_eq!(empty.binder_cumulant(), 0.0);
    assert_eq!(empty.variance(), 0.0);
}

#[test]
fn test_susceptibility_normalisation() {
    let history = [0.5, -0.5, 0.5, -0.5];
    let stats = MagnetizationStats::from_history(&history, 100);

    assert_eq!(stats.samples, 4);
    assert_abs_diff_eq!(stats.mean, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(stats.mean_abs, 0.5, epsilon = 1e-12);
    // chi = N * Var(m) = 100 * 0.25
    assert_abs_diff_eq!(stats.susceptibility, 25.0, epsilon = 1e-9);
}

#[test]
fn test_empty_history() {
    let stats = MagnetizationStats::from_history(&[], 10);
    assert_eq!(stats, MagnetizationStats::default());
}

#[test]
fn test_run_average_keeps_per_run_fluctuations() {
    let a = MagnetizationStats::from_history(&[0.5, -0.5, 0.5, -0.5], 100);
    let b = MagnetizationStats::from_history(&[-0.5, 0.5, -0.5, 0.5], 100);
    let stats = MagnetizationStats::mean_of(&[a, b]);

    // the averaged history is flat at zero, each run is not
    assert_eq!(stats.samples, 8);
    assert_abs_diff_eq!(stats.susceptibility, 25.0, epsilon = 1e-9);
    assert_abs_diff_eq!(stats.mean_abs, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(stats.binder_cumulant, a.binder_cumulant, epsilon = 1e-12);
    assert_eq!(MagnetizationStats::mean_of(&[]), MagnetizationStats::default());
}
