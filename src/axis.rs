//! Random unit axes that vectors are projected onto.

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::distance;
use crate::error::{ProjectionError, Result};

/// Draws allowed per axis before giving up on a non-zero direction.
pub const MAX_AXIS_DRAWS: usize = 16;

/// Draw one random unit-length axis of dimension `dim`.
///
/// Each component is uniform on `[-1, 1)`. A draw whose norm is too small to
/// normalize is discarded and redrawn.
pub fn random_axis(dim: usize, rng: &mut impl Rng) -> Result<Array1<f32>> {
    let uniform = Uniform::new(-1.0_f32, 1.0);
    draw_axis(dim, || uniform.sample(&mut *rng))
}

/// Build a unit axis from components produced by `draw`, redrawing the whole
/// vector when it cannot be normalized.
fn draw_axis(dim: usize, mut draw: impl FnMut() -> f32) -> Result<Array1<f32>> {
    if dim == 0 {
        return Err(ProjectionError::ZeroDimension);
    }

    for attempt in 1..=MAX_AXIS_DRAWS {
        let mut axis: Array1<f32> = (0..dim).map(|_| draw()).collect();
        if distance::normalize(&mut axis) {
            return Ok(axis);
        }
        tracing::warn!(dim, attempt, "degenerate projection axis drawn, redrawing");
    }

    Err(ProjectionError::DegenerateAxis {
        attempts: MAX_AXIS_DRAWS,
    })
}

/// Generate `count` independent random unit axes of dimension `dim`.
pub fn random_basis(dim: usize, count: usize, rng: &mut impl Rng) -> Result<Vec<Array1<f32>>> {
    (0..count).map(|_| random_axis(dim, rng)).collect()
}
