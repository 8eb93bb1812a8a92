use ndarray::{arr1, arr2};

use super::{Network, State};

/// Lotka-Volterra predator-prey system. Species: prey, predator. Reactions:
/// prey birth, predation, predator death, with rate constants `th`.
pub fn lotka_volterra<S: State>(th: [f64; 3]) -> Network<S> {
    Network::new(
        vec!["Prey".to_string(), "Predator".to_string()],
        arr2(&[[1, 1, 0], [0, 1, 1]]),
        arr2(&[[2, 0, 0], [0, 2, 0]]),
        move |x: &S, _t| {
            arr1(&[
                th[0] * x.level(0),
                th[1] * x.level(0) * x.level(1),
                th[2] * x.level(1),
            ])
        },
    )
}

/// Immigration-death process for a single species: constant-rate production
/// and first-order decay. With `th[1] == 0` this is a pure birth process.
pub fn immigration_death<S: State>(th: [f64; 2]) -> Network<S> {
    Network::new(
        vec!["X".to_string()],
        arr2(&[[0, 1]]),
        arr2(&[[1, 0]]),
        move |x: &S, _t| arr1(&[th[0], th[1] * x.level(0)]),
    )
}

/// SIR epidemic model. Species: susceptible, infectious, recovered.
/// Reactions: infection and recovery.
pub fn sir<S: State>(th: [f64; 2]) -> Network<S> {
    Network::new(
        vec!["S".to_string(), "I".to_string(), "R".to_string()],
        arr2(&[[1, 0], [1, 1], [0, 0]]),
        arr2(&[[0, 0], [2, 0], [0, 1]]),
        move |x: &S, _t| arr1(&[th[0] * x.level(0) * x.level(1), th[1] * x.level(1)]),
    )
}
