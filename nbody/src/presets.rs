//! Initial conditions.
//!
//! Every sampler draws from the generator it is given, so a seeded
//! generator always produces the same bodies.

use std::{f32::consts::TAU, ops::Range};

use cgmath::Vector2;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::bodies::Bodies;

/// Shape of a single disk galaxy.
#[derive(Debug, Clone)]
pub struct GalaxyConfig {
    pub center: Vector2<f32>,
    pub velocity: Vector2<f32>,
    pub total_mass: f32,
    /// Exponential scale length of the disk. The bulge is half as wide.
    pub scale_length: f32,
    /// Multiplier on the random part of the velocities.
    pub temperature: f32,
}

/// Fraction of the galaxy mass in the central body
const CENTRAL_MASS_FRACTION: f32 = 0.001;
/// Fraction of the remaining mass that is simulated, the rest is an implicit halo
const VISIBLE_MASS_FRACTION: f32 = 0.05;
/// Share of the visible mass, and of the bodies, placed in the disk
const DISK_FRACTION: f32 = 0.6;

fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.sample(StandardNormal)
}

/// Uniform in (0, 1], safe to take the log of.
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    1.0 - rng.random::<f32>()
}

/// Unit masses spread uniformly over a rectangle, moving in random directions.
pub fn uniform<R: Rng + ?Sized>(
    bodies: &mut Bodies,
    rng: &mut R,
    min: Vector2<f32>,
    max: Vector2<f32>,
    max_speed: f32,
) {
    for idx in 0..bodies.len() {
        let pos = Vector2::new(
            min.x + (max.x - min.x) * rng.random::<f32>(),
            min.y + (max.y - min.y) * rng.random::<f32>(),
        );
        let angle = TAU * rng.random::<f32>();
        let speed = max_speed * rng.random::<f32>();
        let vel = Vector2::new(speed * angle.cos(), speed * angle.sin());
        bodies.set(idx, pos, vel, 1.0);
    }
}

/// Two bodies on a circular orbit around their common centre of mass at the
/// origin, placed in slots 0 and 1.
pub fn two_body(bodies: &mut Bodies, m1: f32, m2: f32, separation: f32, g: f32) {
    assert!(bodies.len() >= 2);
    let total = m1 + m2;
    let speed = (g * total / separation).sqrt();

    bodies.set(
        0,
        Vector2::new(-separation * m2 / total, 0.0),
        Vector2::new(0.0, -speed * m2 / total),
        m1,
    );
    bodies.set(
        1,
        Vector2::new(separation * m1 / total, 0.0),
        Vector2::new(0.0, speed * m1 / total),
        m2,
    );
}

/// Disk galaxy in `range`: one heavy central body, a rotating exponential
/// disk and a pressure supported bulge.
pub fn galaxy<R: Rng + ?Sized>(
    bodies: &mut Bodies,
    rng: &mut R,
    range: Range<usize>,
    config: &GalaxyConfig,
    g: f32,
) {
    if range.is_empty() {
        return;
    }

    let central_mass = config.total_mass * CENTRAL_MASS_FRACTION;
    let visible_mass = config.total_mass * (1.0 - CENTRAL_MASS_FRACTION) * VISIBLE_MASS_FRACTION;
    let disk_mass = visible_mass * DISK_FRACTION;
    let bulge_mass = visible_mass - disk_mass;

    let remaining = range.len() - 1;
    let disk_count = (remaining as f32 * DISK_FRACTION) as usize;

    bodies.set(range.start, config.center, config.velocity, central_mass);

    let disk_start = range.start + 1;
    let bulge_start = disk_start + disk_count;
    let disk = Disk {
        mass: disk_mass,
        central_mass,
        bulge_mass,
    };
    disk.sample(bodies, rng, disk_start..bulge_start, config, g);
    bulge(bodies, rng, bulge_start..range.end, bulge_mass, config, g);
}

struct Disk {
    mass: f32,
    central_mass: f32,
    bulge_mass: f32,
}

impl Disk {
    fn sample<R: Rng + ?Sized>(
        &self,
        bodies: &mut Bodies,
        rng: &mut R,
        range: Range<usize>,
        config: &GalaxyConfig,
        g: f32,
    ) {
        let count = range.len() as f32;
        let scale = config.scale_length;
        let bulge_scale = 0.5 * scale;

        for idx in range {
            // Rejection sampling for the exponential profile, away from the centre.
            let r = loop {
                let r = -scale * open_unit(rng).ln();
                let accept = rng.random::<f32>();
                if accept <= (-r / scale).exp() && r >= 0.1 {
                    break r;
                }
            };
            let theta = TAU * rng.random::<f32>();
            let (sin, cos) = theta.sin_cos();

            let enclosed = self.central_mass
                + self.mass * (1.0 - (-r / scale).exp())
                + self.bulge_mass * (1.0 - (-r / bulge_scale).exp());
            let v_circ = (g * enclosed / (r + 0.05)).sqrt();
            let sigma_r = config.temperature * v_circ * 0.1;
            let sigma_t = config.temperature * v_circ * 0.05;

            let pos = config.center + Vector2::new(r * cos, r * sin);
            let vel = config.velocity
                + Vector2::new(
                    -v_circ * sin + gaussian(rng) * sigma_t * cos + gaussian(rng) * sigma_r * sin,
                    v_circ * cos + gaussian(rng) * sigma_t * sin + gaussian(rng) * sigma_r * cos,
                );
            bodies.set(idx, pos, vel, self.mass / count);
        }
    }
}

fn bulge<R: Rng + ?Sized>(
    bodies: &mut Bodies,
    rng: &mut R,
    range: Range<usize>,
    mass: f32,
    config: &GalaxyConfig,
    g: f32,
) {
    let count = range.len() as f32;
    let scale = 0.5 * config.scale_length;

    for idx in range {
        let r = (-scale * open_unit(rng).ln()).max(0.05);
        let theta = TAU * rng.random::<f32>();
        let sigma = config.temperature * (g * mass / (r + 0.05)).sqrt();

        let pos = config.center + Vector2::new(r * theta.cos(), r * theta.sin());
        let vel = config.velocity + Vector2::new(gaussian(rng) * sigma, gaussian(rng) * sigma);
        bodies.set(idx, pos, vel, mass / count);
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn config() -> GalaxyConfig {
        GalaxyConfig {
            center: Vector2::new(100.0, -50.0),
            velocity: Vector2::new(1.0, 0.5),
            total_mass: 1e5,
            scale_length: 20.0,
            temperature: 1.0,
        }
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut bodies = Bodies::new(500);
        let mut rng = StdRng::seed_from_u64(7);
        uniform(&mut bodies, &mut rng, Vector2::new(0.0, 0.0), Vector2::new(400.0, 200.0), 2.0);

        for idx in 0..bodies.len() {
            assert!((0.0..=400.0).contains(&bodies.x[idx]));
            assert!((0.0..=200.0).contains(&bodies.y[idx]));
            let speed = (bodies.vx[idx].powi(2) + bodies.vy[idx].powi(2)).sqrt();
            assert!(speed <= 2.0 + 1e-5);
            assert_eq!(bodies.mass[idx], 1.0);
        }
    }

    #[test]
    fn same_seed_same_bodies() {
        let mut a = Bodies::new(300);
        let mut b = Bodies::new(300);
        galaxy(&mut a, &mut StdRng::seed_from_u64(3), 0..300, &config(), 0.1);
        galaxy(&mut b, &mut StdRng::seed_from_u64(3), 0..300, &config(), 0.1);
        assert_eq!(a.x, b.x);
        assert_eq!(a.vy, b.vy);
    }

    #[test]
    fn galaxy_mass_budget() {
        let cfg = config();
        let mut bodies = Bodies::new(1001);
        galaxy(&mut bodies, &mut StdRng::seed_from_u64(11), 0..1001, &cfg, 0.1);

        let central = cfg.total_mass * CENTRAL_MASS_FRACTION;
        let visible = cfg.total_mass * (1.0 - CENTRAL_MASS_FRACTION) * VISIBLE_MASS_FRACTION;
        let total: f32 = bodies.mass.iter().sum();
        assert!((total - (central + visible)).abs() < 1e-2 * total);

        assert_eq!(bodies.position(0), cfg.center);
        assert_eq!(bodies.mass[0], central);
        assert!(bodies.x.iter().chain(bodies.vx.iter()).all(|v| v.is_finite()));
    }

    #[test]
    fn galaxy_fills_only_its_range() {
        let mut bodies = Bodies::new(40);
        galaxy(&mut bodies, &mut StdRng::seed_from_u64(5), 10..30, &config(), 0.1);
        assert!(bodies.mass[..10].iter().all(|&m| m == 0.0));
        assert!(bodies.mass[30..].iter().all(|&m| m == 0.0));
        assert!(bodies.mass[10..30].iter().all(|&m| m > 0.0));
    }

    #[test]
    fn two_body_is_at_rest_overall() {
        let mut bodies = Bodies::new(2);
        two_body(&mut bodies, 3.0, 1.0, 4.0, 1.0);

        let px = bodies.mass[0] * bodies.vx[0] + bodies.mass[1] * bodies.vx[1];
        let py = bodies.mass[0] * bodies.vy[0] + bodies.mass[1] * bodies.vy[1];
        let cx = bodies.mass[0] * bodies.x[0] + bodies.mass[1] * bodies.x[1];
        assert!(px.abs() < 1e-6 && py.abs() < 1e-6 && cx.abs() < 1e-6);
        assert!((bodies.x[1] - bodies.x[0] - 4.0).abs() < 1e-6);
    }
}
