//! Conserved quantities, used to check integrator health.
//!
//! Energies are summed exactly over all pairs in `f64`. This is far too slow
//! to run every frame for large systems; the runner samples it periodically.

use cgmath::{Vector2, Zero};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::bodies::Bodies;

pub fn kinetic_energy(bodies: &Bodies) -> f64 {
    (0..bodies.len())
        .map(|i| {
            let v_sq = f64::from(bodies.vx[i]).powi(2) + f64::from(bodies.vy[i]).powi(2);
            0.5 * f64::from(bodies.mass[i]) * v_sq
        })
        .sum()
}

/// Pair potential matching the clamped force law: `-G m1 m2 / r` outside the
/// softening length, a harmonic well inside it.
pub fn pair_potential(g: f64, m1: f64, m2: f64, dist: f64, eps: f64) -> f64 {
    if dist >= eps {
        -g * m1 * m2 / dist
    } else {
        g * m1 * m2 * (dist * dist / (2.0 * eps.powi(3)) - 1.5 / eps)
    }
}

pub fn potential_energy(bodies: &Bodies, g: f32, eps: f32) -> f64 {
    let (g, eps) = (f64::from(g), f64::from(eps));
    let n = bodies.len();
    (0..n)
        .into_par_iter()
        .map(|i| {
            let (xi, yi, mi) = (
                f64::from(bodies.x[i]),
                f64::from(bodies.y[i]),
                f64::from(bodies.mass[i]),
            );
            let mut sum = 0.0;
            for j in (i + 1)..n {
                let dx = f64::from(bodies.x[j]) - xi;
                let dy = f64::from(bodies.y[j]) - yi;
                let dist = (dx * dx + dy * dy).sqrt();
                sum += pair_potential(g, mi, f64::from(bodies.mass[j]), dist, eps);
            }
            sum
        })
        .sum()
}

pub fn total_energy(bodies: &Bodies, g: f32, eps: f32) -> f64 {
    kinetic_energy(bodies) + potential_energy(bodies, g, eps)
}

pub fn momentum(bodies: &Bodies) -> Vector2<f64> {
    (0..bodies.len()).fold(Vector2::zero(), |acc, i| {
        let m = f64::from(bodies.mass[i]);
        acc + Vector2::new(m * f64::from(bodies.vx[i]), m * f64::from(bodies.vy[i]))
    })
}

/// Mass-weighted mean position, `None` for a massless system.
pub fn center_of_mass(bodies: &Bodies) -> Option<Vector2<f64>> {
    let total: f64 = bodies.mass.iter().map(|&m| f64::from(m)).sum();
    if total == 0.0 {
        return None;
    }
    let weighted = (0..bodies.len()).fold(Vector2::zero(), |acc, i| {
        let m = f64::from(bodies.mass[i]);
        acc + Vector2::new(m * f64::from(bodies.x[i]), m * f64::from(bodies.y[i]))
    });
    Some(weighted / total)
}
