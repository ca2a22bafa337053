//! Structure-of-arrays body storage.

use cgmath::Vector2;

/// Per-body state stored as parallel arrays.
///
/// The arrays are boxed slices: values can be rewritten in place, but the
/// number of bodies is fixed when the dataset is created.
#[derive(Debug, Clone)]
pub struct Bodies {
    pub x: Box<[f32]>,
    pub y: Box<[f32]>,
    pub vx: Box<[f32]>,
    pub vy: Box<[f32]>,
    pub ax: Box<[f32]>,
    pub ay: Box<[f32]>,
    pub mass: Box<[f32]>,
}

fn zeroed(count: usize) -> Box<[f32]> {
    vec![0.0; count].into_boxed_slice()
}

impl Bodies {
    pub fn new(count: usize) -> Self {
        Self {
            x: zeroed(count),
            y: zeroed(count),
            vx: zeroed(count),
            vy: zeroed(count),
            ax: zeroed(count),
            ay: zeroed(count),
            mass: zeroed(count),
        }
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// Overwrite position, velocity and mass of body `idx`, clearing its acceleration.
    pub fn set(&mut self, idx: usize, pos: Vector2<f32>, vel: Vector2<f32>, mass: f32) {
        self.x[idx] = pos.x;
        self.y[idx] = pos.y;
        self.vx[idx] = vel.x;
        self.vy[idx] = vel.y;
        self.ax[idx] = 0.0;
        self.ay[idx] = 0.0;
        self.mass[idx] = mass;
    }

    /// First array whose length differs from `count`, with that length.
    pub fn mismatched_len(&self, count: usize) -> Option<(&'static str, usize)> {
        [
            ("x", &self.x),
            ("y", &self.y),
            ("vx", &self.vx),
            ("vy", &self.vy),
            ("ax", &self.ax),
            ("ay", &self.ay),
            ("mass", &self.mass),
        ]
        .into_iter()
        .find(|(_, values)| values.len() != count)
        .map(|(name, values)| (name, values.len()))
    }

    pub fn position(&self, idx: usize) -> Vector2<f32> {
        Vector2::new(self.x[idx], self.y[idx])
    }

    pub fn velocity(&self, idx: usize) -> Vector2<f32> {
        Vector2::new(self.vx[idx], self.vy[idx])
    }

    pub fn acceleration(&self, idx: usize) -> Vector2<f32> {
        Vector2::new(self.ax[idx], self.ay[idx])
    }
}
