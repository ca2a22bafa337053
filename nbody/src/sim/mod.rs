use std::ops::Range;

use crate::{
    bodies::Bodies,
    constants::NODES_PER_BODY,
    error::SimError,
    params::SimulationParams,
};

pub mod barnes_hut;
pub mod leapfrog;
pub mod partition;
pub mod pool;

use barnes_hut::{ForceParams, QuadTree, accelerate_range};
use partition::{partition, split_by_ranges};
use pool::WorkerPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Bodies may be loaded, `initialize` has not run.
    Created,
    Running,
    /// A step failed half way, the bodies can not be trusted anymore.
    Failed,
}

/// Owns the bodies, the quadtree and the worker pool and advances them with
/// a leapfrog integrator.
///
/// Every step rebuilds the tree from scratch, evaluates all accelerations in
/// one parallel wave and integrates them in a second one. Each worker owns a
/// fixed contiguous block of bodies, so the waves need no synchronisation
/// beyond their closing barrier.
pub struct Simulation {
    params: SimulationParams,
    force: ForceParams,
    bodies: Bodies,
    tree: QuadTree,
    pool: WorkerPool,
    ranges: Vec<Range<usize>>,
    state: State,
    ticks: u64,
}

impl Simulation {
    pub fn new(params: SimulationParams) -> Result<Self, SimError> {
        Self::with_tree_capacity(params, params.body_count * NODES_PER_BODY)
    }

    pub fn with_tree_capacity(
        params: SimulationParams,
        node_capacity: usize,
    ) -> Result<Self, SimError> {
        params.validate()?;

        let sim = Self {
            force: ForceParams::from(&params),
            bodies: Bodies::new(params.body_count),
            tree: QuadTree::new(node_capacity)?,
            pool: WorkerPool::new(params.thread_count)?,
            ranges: partition(params.body_count, params.thread_count),
            state: State::Created,
            ticks: 0,
            params,
        };
        log::debug!(
            "created simulation with {} bodies on {} threads",
            params.body_count,
            params.thread_count
        );
        Ok(sim)
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }

    /// Mutable access for loading initial conditions. Changing velocities
    /// after `initialize` skips the half-step correction for that change.
    pub fn bodies_mut(&mut self) -> &mut Bodies {
        &mut self.bodies
    }

    /// The tree built during the last step.
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    pub fn is_initialized(&self) -> bool {
        self.state == State::Running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time since `initialize`.
    pub fn time(&self) -> f64 {
        self.ticks as f64 * f64::from(self.params.dt)
    }

    /// Compute the initial accelerations and move velocities half a step back.
    /// Must be called exactly once, before the first `step`.
    pub fn initialize(&mut self) -> Result<(), SimError> {
        match self.state {
            State::Created => {}
            State::Running => return Err(SimError::AlreadyInitialized),
            State::Failed => return Err(SimError::Poisoned),
        }
        self.check_body_count()?;

        self.guarded(|sim| {
            sim.compute_accelerations()?;
            sim.stagger_velocities();
            Ok(())
        })?;
        self.state = State::Running;
        log::debug!("leapfrog initialized, tree has {} nodes", self.tree.len());
        Ok(())
    }

    /// Advance all bodies by one time step.
    pub fn step(&mut self) -> Result<(), SimError> {
        match self.state {
            State::Running => {}
            State::Created => return Err(SimError::NotInitialized),
            State::Failed => return Err(SimError::Poisoned),
        }
        self.check_body_count()?;

        self.guarded(|sim| {
            sim.compute_accelerations()?;
            sim.integrate();
            Ok(())
        })?;
        self.ticks += 1;
        log::trace!("tick {} done, tree has {} nodes", self.ticks, self.tree.len());
        Ok(())
    }

    /// Rejects arrays swapped out through `bodies_mut` for ones of another
    /// length. Nothing has been touched yet, so the state stays as it was.
    fn check_body_count(&self) -> Result<(), SimError> {
        let expected = self.params.body_count;
        match self.bodies.mismatched_len(expected) {
            Some((field, found)) => Err(SimError::BodyCountMismatch {
                field,
                expected,
                found,
            }),
            None => Ok(()),
        }
    }

    fn guarded(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<(), SimError>,
    ) -> Result<(), SimError> {
        let res = op(self);
        if let Err(err) = &res {
            log::error!("simulation step failed: {err}");
            self.state = State::Failed;
        }
        res
    }

    /// Rebuild the tree and run the force wave.
    fn compute_accelerations(&mut self) -> Result<(), SimError> {
        let bodies = &mut self.bodies;
        self.tree.build(&bodies.x, &bodies.y, &bodies.mass)?;

        let tree = self.tree.view()?;
        let force = self.force;
        let (x, y): (&[f32], &[f32]) = (&bodies.x, &bodies.y);
        let ax = split_by_ranges(&mut bodies.ax[..], &self.ranges);
        let ay = split_by_ranges(&mut bodies.ay[..], &self.ranges);
        let ranges = &self.ranges;

        self.pool.wave(move |wave| {
            for ((range, ax), ay) in ranges.iter().zip(ax).zip(ay) {
                if range.is_empty() {
                    continue;
                }
                let start = range.start;
                wave.submit(move || accelerate_range(tree, &force, x, y, ax, ay, start));
            }
        });
        Ok(())
    }

    /// Integration wave: kick then drift every body.
    fn integrate(&mut self) {
        let dt = self.params.dt;
        let bodies = &mut self.bodies;
        let (ax, ay): (&[f32], &[f32]) = (&bodies.ax, &bodies.ay);
        let x = split_by_ranges(&mut bodies.x[..], &self.ranges);
        let y = split_by_ranges(&mut bodies.y[..], &self.ranges);
        let vx = split_by_ranges(&mut bodies.vx[..], &self.ranges);
        let vy = split_by_ranges(&mut bodies.vy[..], &self.ranges);
        let ranges = &self.ranges;

        self.pool.wave(move |wave| {
            let chunks = x.into_iter().zip(y).zip(vx.into_iter().zip(vy));
            for (range, ((x, y), (vx, vy))) in ranges.iter().zip(chunks) {
                if range.is_empty() {
                    continue;
                }
                let (ax, ay) = (&ax[range.clone()], &ay[range.clone()]);
                wave.submit(move || leapfrog::kick_drift(x, y, vx, vy, ax, ay, dt));
            }
        });
    }

    /// Half-step velocity correction applied once by `initialize`.
    fn stagger_velocities(&mut self) {
        let dt = self.params.dt;
        let bodies = &mut self.bodies;
        let (ax, ay): (&[f32], &[f32]) = (&bodies.ax, &bodies.ay);
        let vx = split_by_ranges(&mut bodies.vx[..], &self.ranges);
        let vy = split_by_ranges(&mut bodies.vy[..], &self.ranges);
        let ranges = &self.ranges;

        self.pool.wave(move |wave| {
            for ((range, vx), vy) in ranges.iter().zip(vx).zip(vy) {
                if range.is_empty() {
                    continue;
                }
                let (ax, ay) = (&ax[range.clone()], &ay[range.clone()]);
                wave.submit(move || leapfrog::stagger(vx, vy, ax, ay, dt));
            }
        });
    }
}
