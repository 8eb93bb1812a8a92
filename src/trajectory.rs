use crate::Time;

/// A recorded simulation: one `(time, grid)` snapshot per recording point,
/// starting with the initial condition.
pub type Trajectory<G> = Vec<(Time, G)>;

/// Drives a stepper from `t0` to `t_end`, recording a snapshot every
/// `record_every` time units (and one final snapshot at `t_end` when the
/// interval does not divide evenly). `advance` is any whole-grid stepper
/// call; closures over the stepper structs fit directly:
///
/// ```ignore
/// let ts = time_series(grid, 0.0, 10.0, 0.5, |g, a, b| stepper.step(g, a, b, &mut rng))?;
/// ```
pub fn time_series<G: Clone, E>(
    initial: G,
    t0: Time,
    t_end: Time,
    record_every: Time,
    mut advance: impl FnMut(G, Time, Time) -> Result<G, E>,
) -> Result<Trajectory<G>, E> {
    assert!(record_every > 0.0, "the recording interval must be positive");
    let mut snapshots = vec![(t0, initial.clone())];
    let mut grid = initial;
    let mut t = t0;
    while t < t_end {
        let next = (t + record_every).min(t_end);
        grid = advance(grid, t, next)?;
        t = next;
        snapshots.push((t, grid.clone()));
    }
    Ok(snapshots)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::SimError;

    #[test]
    fn records_initial_and_final_snapshots() {
        let ts = time_series(0i32, 0.0, 1.0, 0.25, |g, _, _| Ok::<_, SimError>(g + 1)).unwrap();
        assert_eq!(ts.len(), 5);
        assert_eq!(ts[0], (0.0, 0));
        assert_eq!(ts[4].1, 4);
        assert!((ts[4].0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uneven_interval_still_reaches_the_end() {
        let ts = time_series(0i32, 0.0, 1.0, 0.4, |g, a, b| {
            assert!(b - a <= 0.4 + 1e-12);
            Ok::<_, SimError>(g + 1)
        })
        .unwrap();
        let last = ts.last().unwrap();
        assert!((last.0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn errors_abort_the_series() {
        let result = time_series(0i32, 0.0, 1.0, 0.5, |_, _, _| {
            Err::<i32, _>(SimError::NegativeHazard {
                reaction: 0,
                value: -1.0,
            })
        });
        assert!(result.is_err());
    }
}
