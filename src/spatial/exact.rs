use log::debug;
use ndarray::{Array1, Array2};
use rand::prelude::*;

use crate::grid::{wrap, Cursor1D, Cursor2D};
use crate::network::ReactionNetwork;
use crate::rejection::BoundedRejectionSampler;
use crate::{check_diffusion, check_hazards, Counts, HazardBounds, SimError, Time};

/// Exact stochastic reaction-diffusion stepper on a 1-D periodic lattice.
///
/// Each cell contributes its network reactions plus one migration
/// pseudo-reaction per species and direction (rate `d[species] * count`);
/// events over the requested interval are selected with a
/// [`BoundedRejectionSampler`], so no global hazard total is ever rebuilt.
/// `bounds.max` must genuinely bound every single candidate's rate for the
/// whole interval: a violated bound silently biases the simulation, a loose
/// one only wastes draws.
pub struct Gillespie1D<N> {
    network: N,
    diffusion: Array1<f64>,
    stoich: Array2<i32>,
    bounds: HazardBounds,
}

impl<N: ReactionNetwork<Counts>> Gillespie1D<N> {
    pub fn new(
        network: N,
        diffusion: Array1<f64>,
        bounds: HazardBounds,
    ) -> Result<Self, SimError> {
        check_diffusion(&diffusion)?;
        assert_eq!(
            diffusion.len(),
            network.num_species(),
            "one diffusion coefficient per species"
        );
        let stoich = network.stoichiometry();
        Ok(Gillespie1D {
            network,
            diffusion,
            stoich,
            bounds,
        })
    }

    /// Advances every cell from `t0` to `t1`, drawing all randomness from
    /// `rng`. Runs with the same seed produce identical grids.
    pub fn step<R: Rng>(
        &self,
        grid: Cursor1D<Counts>,
        t0: Time,
        t1: Time,
        rng: &mut R,
    ) -> Result<Cursor1D<Counts>, SimError> {
        let n = grid.len();
        let species = self.diffusion.len();
        let reactions = self.stoich.ncols();
        let per_cell = reactions + 2 * species;
        let sampler = BoundedRejectionSampler::new(self.bounds, n * per_cell);

        let focus = grid.focus();
        let mut cells = grid.into_cells();
        let mut t = t0;
        let mut events = 0usize;
        loop {
            let event = sampler.next_event(t, t1, rng, |candidate, now| {
                let cell = candidate / per_cell;
                let local = candidate % per_cell;
                if local < reactions {
                    let hazards = self.network.hazards(&cells[cell], now);
                    check_hazards(&hazards)?;
                    Ok(hazards[local])
                } else {
                    let sp = (local - reactions) / 2;
                    Ok(self.diffusion[sp] * f64::from(cells[cell][sp]))
                }
            })?;
            let Some((event_t, candidate)) = event else {
                break;
            };
            t = event_t;
            events += 1;

            let cell = candidate / per_cell;
            let local = candidate % per_cell;
            if local < reactions {
                for sp in 0..species {
                    cells[cell][sp] += self.stoich[[sp, local]];
                }
            } else {
                let sp = (local - reactions) / 2;
                let delta = if (local - reactions) % 2 == 0 { -1 } else { 1 };
                let neighbor = wrap(cell as i64 + delta, n);
                cells[cell][sp] -= 1;
                cells[neighbor][sp] += 1;
            }
        }
        debug!("1d exact step: {} events over [{}, {}]", events, t0, t1);
        Ok(Cursor1D::from_parts(cells, focus))
    }
}

/// Exact stochastic reaction-diffusion stepper on a 2-D toroidal lattice.
/// Identical to [`Gillespie1D`] except each cell has four migration
/// directions per species.
pub struct Gillespie2D<N> {
    network: N,
    diffusion: Array1<f64>,
    stoich: Array2<i32>,
    bounds: HazardBounds,
}

// Migration direction order: up, down, left, right.
const OFFSETS_2D: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl<N: ReactionNetwork<Counts>> Gillespie2D<N> {
    pub fn new(
        network: N,
        diffusion: Array1<f64>,
        bounds: HazardBounds,
    ) -> Result<Self, SimError> {
        check_diffusion(&diffusion)?;
        assert_eq!(
            diffusion.len(),
            network.num_species(),
            "one diffusion coefficient per species"
        );
        let stoich = network.stoichiometry();
        Ok(Gillespie2D {
            network,
            diffusion,
            stoich,
            bounds,
        })
    }

    pub fn step<R: Rng>(
        &self,
        grid: Cursor2D<Counts>,
        t0: Time,
        t1: Time,
        rng: &mut R,
    ) -> Result<Cursor2D<Counts>, SimError> {
        let [rows, cols] = grid.shape();
        let n = rows * cols;
        let species = self.diffusion.len();
        let reactions = self.stoich.ncols();
        let per_cell = reactions + 4 * species;
        let sampler = BoundedRejectionSampler::new(self.bounds, n * per_cell);

        let focus = grid.focus();
        let mut cells = grid.into_cells();
        let mut t = t0;
        let mut events = 0usize;
        loop {
            let event = sampler.next_event(t, t1, rng, |candidate, now| {
                let cell = candidate / per_cell;
                let local = candidate % per_cell;
                if local < reactions {
                    let hazards = self.network.hazards(&cells[cell], now);
                    check_hazards(&hazards)?;
                    Ok(hazards[local])
                } else {
                    let sp = (local - reactions) / 4;
                    Ok(self.diffusion[sp] * f64::from(cells[cell][sp]))
                }
            })?;
            let Some((event_t, candidate)) = event else {
                break;
            };
            t = event_t;
            events += 1;

            let cell = candidate / per_cell;
            let local = candidate % per_cell;
            if local < reactions {
                for sp in 0..species {
                    cells[cell][sp] += self.stoich[[sp, local]];
                }
            } else {
                let sp = (local - reactions) / 4;
                let (dr, dc) = OFFSETS_2D[(local - reactions) % 4];
                let row = cell / cols;
                let col = cell % cols;
                let neighbor = wrap(row as i64 + dr, rows) * cols + wrap(col as i64 + dc, cols);
                cells[cell][sp] -= 1;
                cells[neighbor][sp] += 1;
            }
        }
        debug!("2d exact step: {} events over [{}, {}]", events, t0, t1);
        Ok(Cursor2D::from_parts(cells, rows, cols, focus))
    }
}
