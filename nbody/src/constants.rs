// PHYSICAL
/// Gravitational constant in simulation units.
pub const G: f32 = 0.1;
/// Softening length. Separations below this are clamped when computing forces.
pub const SOFTENING: f32 = 0.1;
/// Default time step per `step()`.
pub const DELTA: f32 = 3e-3;

// SIMULATION
/// Barnes-Hut opening angle (theta). Smaller values = more accurate, but slower.
pub const BARNES_HUT_THETA: f32 = 0.5;
/// Hard cap on number of threads to use.
pub const MAX_THREADS: usize = 20;
/// Initial quadtree node capacity per body. The tree grows past this if needed.
pub const NODES_PER_BODY: usize = 4;
/// Maximum number of subdivisions used to separate two distinct bodies
/// before they are merged into a single leaf.
pub const MAX_DEPTH: u32 = 96;
/// Interval in ticks between progress reports of the runner
pub const CHECK_INTERVAL: u64 = 500;
