use log::trace;
use rand::prelude::*;

use crate::{HazardBounds, SimError, Time};

/// Event selection against a global rate bound, avoiding the O(grid) cost of
/// rebuilding an exact hazard total after every event.
///
/// Candidates are indexed `0..candidates` and each has an instantaneous rate
/// no larger than `bounds.max`. Waiting times are drawn from the exponential
/// clock of the bounding process (total rate `max * candidates`); a candidate
/// is then drawn uniformly and kept with probability `rate / max`. Rejected
/// draws advance the clock and retry, so accepted events reproduce the exact
/// jump process as long as `max` really bounds every candidate's rate over
/// the whole interval.
pub struct BoundedRejectionSampler {
    bounds: HazardBounds,
    candidates: usize,
}

impl BoundedRejectionSampler {
    pub fn new(bounds: HazardBounds, candidates: usize) -> Self {
        BoundedRejectionSampler { bounds, candidates }
    }

    pub fn candidates(&self) -> usize {
        self.candidates
    }

    /// Advances the clock from `t` until a candidate is accepted or the
    /// horizon is passed. Returns the accepted event's time and index, or
    /// `None` if the interval ends first. `rate_of` may be called for many
    /// rejected candidates; it receives the candidate index and the proposed
    /// event time.
    pub fn next_event<R: Rng>(
        &self,
        t: Time,
        horizon: Time,
        rng: &mut R,
        mut rate_of: impl FnMut(usize, Time) -> Result<f64, SimError>,
    ) -> Result<Option<(Time, usize)>, SimError> {
        let total_bound = self.bounds.max * self.candidates as f64;
        let mut t = t;
        let mut rejected = 0usize;
        loop {
            t += -(rng.random::<f64>()).ln() / total_bound;
            if t > horizon {
                trace!("clock passed horizon after {} rejections", rejected);
                return Ok(None);
            }
            let candidate = rng.random_range(0..self.candidates);
            let rate = rate_of(candidate, t)?;
            if rng.random::<f64>() * self.bounds.max < rate {
                trace!(
                    "accepted candidate {} at t={} after {} rejections",
                    candidate,
                    t,
                    rejected
                );
                return Ok(Some((t, candidate)));
            }
            rejected += 1;
        }
    }
}
