//! Jittered probe-grid generation.
//!
//! Produces a `divisions × divisions` lattice of lat/lng probe points around
//! a center coordinate. Each point is perturbed by a small uniform random
//! offset so the downstream heatmap aggregation doesn't render visible
//! grid-line banding. The random source is injected so tests can seed it.

use rand::Rng;

use crate::types::ProbePoint;

/// Parameters for one probe grid.
#[derive(Debug, Clone)]
pub struct GridSpec {
    pub center: ProbePoint,
    /// Total lat/lng extent covered by the grid, in degrees.
    pub spread_degrees: f64,
    /// Points per axis; the grid has `divisions²` points.
    pub divisions: u32,
    /// Per-axis jitter as a fraction of the lattice step. Each coordinate is
    /// offset by a uniform draw from `[-jitter/2, +jitter/2] × step`.
    pub jitter_fraction: f64,
}

impl GridSpec {
    #[must_use]
    pub fn step_degrees(&self) -> f64 {
        self.spread_degrees / f64::from(self.divisions.max(1))
    }
}

/// Generate the jittered probe grid for `spec`.
///
/// Always returns exactly `divisions²` points. Lattice offsets run from
/// `-spread/2` to `+spread/2 - step` per axis (the center sits on a cell
/// corner, matching the renderer's expectations), before jitter is applied.
pub fn generate_grid<R: Rng + ?Sized>(spec: &GridSpec, rng: &mut R) -> Vec<ProbePoint> {
    let divisions = spec.divisions.max(1);
    let step = spec.step_degrees();
    let jitter = step * spec.jitter_fraction;
    let half = f64::from(divisions) / 2.0;

    let mut points = Vec::with_capacity((divisions as usize).pow(2));
    for i in 0..divisions {
        for j in 0..divisions {
            points.push(ProbePoint {
                lat: spec.center.lat + (f64::from(i) - half) * step + jitter_offset(rng, jitter),
                lng: spec.center.lng + (f64::from(j) - half) * step + jitter_offset(rng, jitter),
            });
        }
    }
    points
}

fn jitter_offset<R: Rng + ?Sized>(rng: &mut R, jitter: f64) -> f64 {
    if jitter <= 0.0 {
        return 0.0;
    }
    (rng.random::<f64>() - 0.5) * jitter
}
