// energy.rs - Local Ising energy and the Boltzmann excitation factor

/// Prefactor K in H_i = K Σ_j s_i s_j. Negative, so aligned pairs lower
/// the energy.
pub const COUPLING: f64 = -1.0;

/// Local energy of a site with spin `spin` whose neighbours are `neighbor_ids`
/// inside the global configuration `spins`.
pub fn local_energy(spin: i8, neighbor_ids: &[usize], spins: &[i8]) -> f64 {
    let sum: i32 = neighbor_ids
        .iter()
        .map(|&j| spin as i32 * spins[j] as i32)
        .sum();
    COUPLING * sum as f64
}

/// Same as [`local_energy`] with the neighbour spins already gathered.
pub fn energy_from_spins(spin: i8, neighbor_spins: &[i8]) -> f64 {
    let sum: i32 = neighbor_spins.iter().map(|&s| spin as i32 * s as i32).sum();
    COUPLING * sum as f64
}

/// Probability exp(-dE / T) of accepting an uphill move. Zero at T = 0.
pub fn excitation_probability(delta_e: f64, temperature: f64) -> f64 {
    if temperature == 0.0 {
        return 0.0;
    }
    (-delta_e / temperature).exp()
}
