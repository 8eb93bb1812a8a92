use flate2::{write::GzEncoder, Compression};
use ndarray::arr1;
use rand::prelude::*;
use std::fs;
use tqdm::tqdm;

use lattice_kinetics::grid::Cursor1D;
use lattice_kinetics::network::lotka_volterra;
use lattice_kinetics::serialize;
use lattice_kinetics::spatial::{Cle1D, Euler1D, Gillespie1D};
use lattice_kinetics::trajectory::time_series;
use lattice_kinetics::{Concentrations, Counts, HazardBounds, SimError};

/// Runs a seeded 1-D Lotka-Volterra reaction-diffusion simulation with all
/// three stepper families and archives the recorded trajectories.
fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let cells = 20;
    let t_end = 12.0;
    let record_every = 0.5;
    let seed = 42;
    let rates = [1.0, 0.005, 0.6];
    let diffusion = arr1(&[0.8, 0.8]);

    fs::create_dir_all("data")?;
    let outfile = fs::File::create("data/lv_spatial.tar.gz")?;
    let zipper = GzEncoder::new(outfile, Compression::default());
    let mut archive_builder = tar::Builder::new(zipper);
    serialize::write_entry("seed.json".to_string(), &seed, &mut archive_builder)?;

    // Exact stochastic run, molecules seeded in the middle cell.
    let counts: Cursor1D<Counts> =
        Cursor1D::new(cells, |i| arr1(&[if i == cells / 2 { 50 } else { 0 }, 100]));
    let stepper = Gillespie1D::new(
        lotka_volterra(rates),
        diffusion.clone(),
        HazardBounds::new(0.0, 2e4)?,
    )?;
    let mut rng = StdRng::seed_from_u64(seed);
    let steps = (t_end / record_every) as usize;
    let mut exact = vec![(0.0, counts.clone())];
    let mut grid = counts;
    for i in tqdm(0..steps) {
        let (t0, t1) = (i as f64 * record_every, (i + 1) as f64 * record_every);
        grid = stepper.step(grid, t0, t1, &mut rng)?;
        exact.push((t1, grid.clone()));
    }
    serialize::write_trajectory("gillespie", &exact, &mut archive_builder)?;

    // Deterministic Euler run from the matching continuous initial condition.
    let conc: Cursor1D<Concentrations> =
        Cursor1D::new(cells, |i| arr1(&[if i == cells / 2 { 50.0 } else { 0.0 }, 100.0]));
    let stepper = Euler1D::new(lotka_volterra(rates), diffusion.clone(), 0.001)?;
    let euler = time_series(conc.clone(), 0.0, t_end, record_every, |g, a, b| {
        Ok::<_, SimError>(stepper.step(g, a, b))
    })?;
    serialize::write_trajectory("euler", &euler, &mut archive_builder)?;

    // Chemical Langevin run.
    let stepper = Cle1D::new(lotka_volterra(rates), diffusion, 0.001)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let langevin = time_series(conc, 0.0, t_end, record_every, |g, a, b| {
        Ok::<_, SimError>(stepper.step(g, a, b, &mut rng))
    })?;
    serialize::write_trajectory("cle", &langevin, &mut archive_builder)?;

    archive_builder.finish()?;
    println!("wrote data/lv_spatial.tar.gz");
    Ok(())
}
