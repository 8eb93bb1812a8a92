use ndarray::{Array1, Array2};

use crate::{Hazards, Time};

mod models;
pub use models::*;

/// Numeric access to a per-cell state vector, shared by integer-count and
/// real-concentration simulations so one model definition serves both.
pub trait State: Clone + Send + Sync {
    fn dim(&self) -> usize;
    fn level(&self, species: usize) -> f64;
}

impl State for Array1<i32> {
    fn dim(&self) -> usize {
        self.len()
    }

    fn level(&self, species: usize) -> f64 {
        f64::from(self[species])
    }
}

impl State for Array1<f64> {
    fn dim(&self) -> usize {
        self.len()
    }

    fn level(&self, species: usize) -> f64 {
        self[species]
    }
}

/// A stochastic reaction network: species names, reactant and product
/// stoichiometries (species x reactions), and a hazard function of state and
/// time. Consumers never mutate a network.
pub trait ReactionNetwork<S> {
    fn species(&self) -> &[String];
    fn pre(&self) -> &Array2<u32>;
    fn post(&self) -> &Array2<u32>;
    fn hazards(&self, state: &S, t: Time) -> Hazards;

    fn num_species(&self) -> usize {
        self.pre().nrows()
    }

    fn num_reactions(&self) -> usize {
        self.pre().ncols()
    }

    /// Net change per species (rows) and reaction (columns).
    fn stoichiometry(&self) -> Array2<i32> {
        self.post().mapv(|v| v as i32) - self.pre().mapv(|v| v as i32)
    }
}

/// The stock network implementation: matrices plus a boxed hazard closure.
pub struct Network<S> {
    species: Vec<String>,
    pre: Array2<u32>,
    post: Array2<u32>,
    hazard: Box<dyn Fn(&S, Time) -> Hazards + Send + Sync>,
}

impl<S> Network<S> {
    pub fn new(
        species: Vec<String>,
        pre: Array2<u32>,
        post: Array2<u32>,
        hazard: impl Fn(&S, Time) -> Hazards + Send + Sync + 'static,
    ) -> Self {
        assert_eq!(pre.dim(), post.dim(), "pre and post shapes must match");
        assert_eq!(
            species.len(),
            pre.nrows(),
            "one stoichiometry row per species"
        );
        Network {
            species,
            pre,
            post,
            hazard: Box::new(hazard),
        }
    }
}

impl<S> ReactionNetwork<S> for Network<S> {
    fn species(&self) -> &[String] {
        &self.species
    }

    fn pre(&self) -> &Array2<u32> {
        &self.pre
    }

    fn post(&self) -> &Array2<u32> {
        &self.post
    }

    fn hazards(&self, state: &S, t: Time) -> Hazards {
        (self.hazard)(state, t)
    }
}
