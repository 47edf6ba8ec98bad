const OVERLAP_DISTANCE: f64 = 1e-6;
const OVERLAP_ENERGY: f64 = 1e10;

/// Standard 12-6 Lennard-Jones pair energy, `4ε[(σ/r)^12 - (σ/r)^6]`.
#[inline]
pub fn lennard_jones_12_6(dist: f64, sigma: f64, epsilon: f64) -> f64 {
    if dist < OVERLAP_DISTANCE {
        return OVERLAP_ENERGY;
    }
    let rho6 = (sigma / dist).powi(6);
    4.0 * epsilon * (rho6 * rho6 - rho6)
}

/// Morse pair energy in reduced form, `ε[e^{-2ρ0(r/r0 - 1)} - 2e^{-ρ0(r/r0 - 1)}]`.
#[inline]
pub fn morse(dist: f64, epsilon: f64, r0: f64, rho0: f64) -> f64 {
    if dist < OVERLAP_DISTANCE {
        return OVERLAP_ENERGY;
    }
    let expf = (-rho0 * (dist / r0 - 1.0)).exp();
    epsilon * (expf * expf - 2.0 * expf)
}

/// Truncates `potential_fn` at `cutoff` and shifts it so the energy is continuous there.
#[inline]
pub fn shifted_at_cutoff<F>(dist: f64, cutoff: f64, potential_fn: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if dist >= cutoff {
        0.0
    } else {
        potential_fn(dist) - potential_fn(cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn lennard_jones_minimum_is_at_two_to_the_sixth_sigma() {
        let sigma = 2.0;
        let r_min = 2f64.powf(1.0 / 6.0) * sigma;
        assert!(f64_approx_equal(lennard_jones_12_6(r_min, sigma, 0.5), -0.5));
        assert!(f64_approx_equal(lennard_jones_12_6(sigma, sigma, 0.5), 0.0));
    }

    #[test]
    fn morse_minimum_is_at_r0() {
        assert!(f64_approx_equal(morse(2.5, 0.3, 2.5, 6.0), -0.3));
        assert!(morse(2.0, 0.3, 2.5, 6.0) > morse(2.5, 0.3, 2.5, 6.0));
    }

    #[test]
    fn overlapping_atoms_get_large_penalty() {
        assert_eq!(lennard_jones_12_6(0.0, 1.0, 1.0), OVERLAP_ENERGY);
        assert_eq!(morse(0.0, 1.0, 1.0, 6.0), OVERLAP_ENERGY);
    }

    #[test]
    fn shifted_potential_vanishes_at_and_beyond_cutoff() {
        let lj = |r: f64| lennard_jones_12_6(r, 1.0, 1.0);
        assert_eq!(shifted_at_cutoff(3.0, 3.0, lj), 0.0);
        assert_eq!(shifted_at_cutoff(5.0, 3.0, lj), 0.0);
        let near = shifted_at_cutoff(2.999999, 3.0, lj);
        assert!(near.abs() < 1e-6);
    }
}
