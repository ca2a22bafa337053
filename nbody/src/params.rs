//! Runtime parameters of a simulation instance.
//!
//! A `SimulationParams` is handed to `Simulation::new` once and never
//! changes afterwards.

use crate::{
    constants::{BARNES_HUT_THETA, DELTA, G, SOFTENING},
    error::SimError,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    /// Gravitational constant
    pub g: f32,
    /// Softening length
    pub eps: f32,
    /// Time step
    pub dt: f32,
    /// Barnes-Hut opening angle
    pub theta: f32,
    pub body_count: usize,
    pub thread_count: usize,
}

impl SimulationParams {
    /// Parameters with the default physical constants.
    pub fn new(body_count: usize, thread_count: usize) -> Self {
        Self {
            g: G,
            eps: SOFTENING,
            dt: DELTA,
            theta: BARNES_HUT_THETA,
            body_count,
            thread_count,
        }
    }

    pub fn with_g(mut self, g: f32) -> Self {
        self.g = g;
        self
    }

    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_theta(mut self, theta: f32) -> Self {
        self.theta = theta;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |msg: String| Err(SimError::InvalidParams(msg));

        if self.body_count == 0 {
            return invalid("body_count must be at least 1".to_owned());
        }
        if self.thread_count == 0 {
            return invalid("thread_count must be at least 1".to_owned());
        }
        if !self.g.is_finite() {
            return invalid(format!("G must be finite, got {}", self.g));
        }
        // The softened force law divides by eps^3 at zero separation.
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return invalid(format!("eps must be positive, got {}", self.eps));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return invalid(format!("dt must be positive, got {}", self.dt));
        }
        if !(self.theta.is_finite() && self.theta >= 0.0) {
            return invalid(format!("theta must be non-negative, got {}", self.theta));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationParams::new(10, 4).validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_values() {
        let base = SimulationParams::new(10, 4);
        for params in [
            SimulationParams::new(0, 4),
            SimulationParams::new(10, 0),
            base.with_eps(0.0),
            base.with_dt(-1.0),
            base.with_dt(f32::NAN),
            base.with_theta(-0.1),
            base.with_g(f32::INFINITY),
        ] {
            assert!(
                matches!(params.validate(), Err(SimError::InvalidParams(_))),
                "{params:?} should be rejected"
            );
        }
    }
}
