use ndarray::Array1;
use rand::prelude::*;
use rand_distr::{Poisson, StandardNormal};

use crate::network::ReactionNetwork;
use crate::{check_hazards, Concentrations, Counts, SimError, Time};

/// Exact stochastic simulation of a single well-mixed cell from `t0` to `t1`.
/// Reproduces the continuous-time jump process with no time-discretization
/// error.
pub fn gillespie<N, R>(
    network: &N,
    mut x: Counts,
    t0: Time,
    t1: Time,
    rng: &mut R,
) -> Result<Counts, SimError>
where
    N: ReactionNetwork<Counts>,
    R: Rng,
{
    let stoich = network.stoichiometry();
    let mut t = t0;
    loop {
        let hazards = network.hazards(&x, t);
        check_hazards(&hazards)?;
        let total: f64 = hazards.sum();
        if total <= 0.0 {
            return Ok(x);
        }
        t += -(rng.random::<f64>()).ln() / total;
        if t > t1 {
            return Ok(x);
        }

        let mut partial_sums = Vec::with_capacity(hazards.len());
        let mut sum = 0.;
        for &h in hazards.iter() {
            sum += h;
            partial_sums.push(sum);
        }
        let chosen_partial_sum = rng.random::<f64>() * partial_sums.last().unwrap();
        let reaction = partial_sums
            .partition_point(|a| *a <= chosen_partial_sum)
            .min(hazards.len() - 1);

        for species in 0..x.len() {
            x[species] += stoich[[species, reaction]];
        }
    }
}

/// Deterministic Euler integration of the reaction drift, `dt` at a time with
/// a final partial step for any remainder. Stability for small enough `dt`
/// is the caller's responsibility.
pub fn euler<N>(network: &N, mut x: Concentrations, dt: Time, t0: Time, t1: Time) -> Concentrations
where
    N: ReactionNetwork<Concentrations>,
{
    let stoich = network.stoichiometry().mapv(f64::from);
    let mut t = t0;
    let mut remaining = t1 - t0;
    while remaining > 0.0 {
        let step = dt.min(remaining);
        let hazards = network.hazards(&x, t);
        x = &x + &(stoich.dot(&hazards) * step);
        t += step;
        remaining -= step;
    }
    x
}

/// Chemical Langevin approximation for a single cell: Euler drift plus one
/// `sqrt(h_j dt) * N(0,1)` term per reaction per sub-step. Negative
/// excursions are left in place; the noise amplitude floors at zero so they
/// contribute no noise rather than NaN.
pub fn cle<N, R>(
    network: &N,
    mut x: Concentrations,
    dt: Time,
    t0: Time,
    t1: Time,
    rng: &mut R,
) -> Concentrations
where
    N: ReactionNetwork<Concentrations>,
    R: Rng,
{
    let stoich = network.stoichiometry().mapv(f64::from);
    let reactions = network.num_reactions();
    let mut t = t0;
    let mut remaining = t1 - t0;
    while remaining > 0.0 {
        let step = dt.min(remaining);
        let sdt = step.sqrt();
        let hazards = network.hazards(&x, t);
        let mut increments = Array1::zeros(reactions);
        for j in 0..reactions {
            let z: f64 = rng.sample(StandardNormal);
            increments[j] = hazards[j] * step + hazards[j].max(0.0).sqrt() * sdt * z;
        }
        x = &x + &stoich.dot(&increments);
        t += step;
        remaining -= step;
    }
    x
}

/// Poisson-increment (tau-leaping) approximation: each reaction fires a
/// Poisson(h_j * dt) number of times per sub-step. Faster than `gillespie`
/// when hazards are large, at the cost of discretization error.
pub fn tau_leap<N, R>(
    network: &N,
    mut x: Counts,
    dt: Time,
    t0: Time,
    t1: Time,
    rng: &mut R,
) -> Result<Counts, SimError>
where
    N: ReactionNetwork<Counts>,
    R: Rng,
{
    let stoich = network.stoichiometry();
    let mut t = t0;
    let mut remaining = t1 - t0;
    while remaining > 0.0 {
        let step = dt.min(remaining);
        let hazards = network.hazards(&x, t);
        check_hazards(&hazards)?;
        for j in 0..hazards.len() {
            let mean = hazards[j] * step;
            if mean <= 0.0 {
                continue;
            }
            let poisson = Poisson::new(mean).expect("hazards are validated finite and non-negative");
            let fires = poisson.sample(rng) as i32;
            for species in 0..x.len() {
                x[species] += fires * stoich[[species, j]];
            }
        }
        t += step;
        remaining -= step;
    }
    Ok(x)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::network::{immigration_death, lotka_volterra};
    use ndarray::arr1;

    #[test]
    fn gillespie_with_zero_hazards_is_inert() {
        let net = immigration_death([0.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(1);
        let x = gillespie(&net, arr1(&[7]), 0.0, 100.0, &mut rng).unwrap();
        assert_eq!(x, arr1(&[7]));
    }

    #[test]
    fn gillespie_pure_birth_only_grows() {
        let net = immigration_death([1.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut x = arr1(&[0]);
        let mut previous = 0;
        for step in 1..=10 {
            x = gillespie(&net, x, (step - 1) as f64, step as f64, &mut rng).unwrap();
            assert!(x[0] >= previous);
            previous = x[0];
        }
    }

    #[test]
    fn gillespie_rejects_negative_hazard() {
        let net = crate::network::Network::new(
            vec!["X".to_string()],
            ndarray::arr2(&[[1]]),
            ndarray::arr2(&[[0]]),
            |_x: &Counts, _t| arr1(&[-1.0]),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let result = gillespie(&net, arr1(&[5]), 0.0, 1.0, &mut rng);
        assert!(matches!(
            result,
            Err(SimError::NegativeHazard { reaction: 0, .. })
        ));
    }

    #[test]
    fn euler_immigration_death_approaches_equilibrium() {
        let net = immigration_death([2.0, 0.5]);
        let x = euler(&net, arr1(&[0.0]), 0.01, 0.0, 50.0);
        // Equilibrium at immigration / death = 4.
        assert!((x[0] - 4.0).abs() < 0.05, "got {}", x[0]);
    }

    #[test]
    fn euler_partial_final_step_lands_exactly() {
        // dt does not divide the interval; the remainder step must cover it.
        let net = immigration_death([1.0, 0.0]);
        let x = euler(&net, arr1(&[0.0]), 0.4, 0.0, 1.0);
        // Pure birth at rate 1: integral is exactly the elapsed time.
        assert!((x[0] - 1.0).abs() < 1e-12, "got {}", x[0]);
    }

    #[test]
    fn cle_with_zero_hazards_is_inert() {
        let net = immigration_death([0.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(4);
        let x = cle(&net, arr1(&[3.0]), 0.1, 0.0, 5.0, &mut rng);
        assert_eq!(x, arr1(&[3.0]));
    }

    #[test]
    fn tau_leap_with_zero_hazards_is_inert() {
        let net = immigration_death([0.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(5);
        let x = tau_leap(&net, arr1(&[9]), 0.1, 0.0, 5.0, &mut rng).unwrap();
        assert_eq!(x, arr1(&[9]));
    }

    #[test]
    fn tau_leap_pure_birth_mean_matches_rate() {
        let net = immigration_death([1.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(6);
        let reps = 2000;
        let mut total = 0i64;
        for _ in 0..reps {
            let x = tau_leap(&net, arr1(&[0]), 0.1, 0.0, 1.0, &mut rng).unwrap();
            total += i64::from(x[0]);
        }
        let mean = total as f64 / reps as f64;
        assert!((mean - 1.0).abs() < 0.15, "mean {} too far from 1", mean);
    }

    #[test]
    fn lotka_volterra_gillespie_runs() {
        let net = lotka_volterra([1.0, 0.005, 0.6]);
        let mut rng = StdRng::seed_from_u64(7);
        let x = gillespie(&net, arr1(&[50, 100]), 0.0, 1.0, &mut rng).unwrap();
        assert!(x[0] >= 0);
        assert!(x[1] >= 0);
    }
}
