use cgmath::{Vector2, Zero};

use crate::{error::TreeError, params::SimulationParams};

pub mod tree;

pub use tree::{Bounds, Node, QuadTree};

/// Constants of the force law, squared where the traversal needs them squared.
#[derive(Debug, Clone, Copy)]
pub struct ForceParams {
    pub g: f32,
    pub eps_sq: f32,
    pub theta_sq: f32,
}

impl ForceParams {
    pub fn new(g: f32, eps: f32, theta: f32) -> Self {
        Self {
            g,
            eps_sq: eps * eps,
            theta_sq: theta * theta,
        }
    }
}

impl From<&SimulationParams> for ForceParams {
    fn from(params: &SimulationParams) -> Self {
        Self::new(params.g, params.eps, params.theta)
    }
}

/// Read-only handle on a tree that has a root. Obtaining one is the only
/// fallible part of a force evaluation.
#[derive(Debug, Clone, Copy)]
pub struct TreeView<'a> {
    nodes: &'a [Node],
}

impl QuadTree {
    pub fn view(&self) -> Result<TreeView<'_>, TreeError> {
        self.root()?;
        Ok(TreeView {
            nodes: self.nodes(),
        })
    }

    /// Barnes-Hut acceleration at `(x, y)`. Call `propagate` first.
    pub fn acceleration(
        &self,
        x: f32,
        y: f32,
        force: &ForceParams,
    ) -> Result<Vector2<f32>, TreeError> {
        Ok(self.view()?.acceleration(x, y, force))
    }
}

impl TreeView<'_> {
    /// Walk the tree along the skip pointers, opening a node only when it is
    /// too close for its size.
    pub fn acceleration(&self, x: f32, y: f32, force: &ForceParams) -> Vector2<f32> {
        let mut acc = Vector2::zero();
        let mut idx = 0;

        loop {
            let node = &self.nodes[idx];
            let dx = node.cx - x;
            let dy = node.cy - y;
            let dist_sq = (dx * dx + dy * dy).max(force.eps_sq);

            if node.is_leaf() || node.size * node.size < force.theta_sq * dist_sq {
                // Treat this node as a single body
                if !node.is_empty() {
                    let inv_dist = dist_sq.sqrt().recip();
                    let a = force.g * node.mass * inv_dist * inv_dist * inv_dist;
                    acc.x += a * dx;
                    acc.y += a * dy;
                }
                if node.next == 0 {
                    break;
                }
                idx = node.next as usize;
            } else {
                idx = node.first_child as usize;
            }
        }
        acc
    }
}

/// Force evaluation for one contiguous block of bodies starting at `start`.
/// `x`/`y` hold every body, `ax`/`ay` only the block being written.
pub fn accelerate_range(
    tree: TreeView<'_>,
    force: &ForceParams,
    x: &[f32],
    y: &[f32],
    ax: &mut [f32],
    ay: &mut [f32],
    start: usize,
) {
    debug_assert_eq!(ax.len(), ay.len());
    for (i, (ax, ay)) in ax.iter_mut().zip(ay.iter_mut()).enumerate() {
        let acc = tree.acceleration(x[start + i], y[start + i], force);
        *ax = acc.x;
        *ay = acc.y;
    }
}
