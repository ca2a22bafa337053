pub mod bodies;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod params;
pub mod presets;
mod sim;

pub use bodies::Bodies;
pub use error::{SimError, TreeError};
pub use params::SimulationParams;
pub use sim::{
    Simulation,
    barnes_hut::{self, Bounds, ForceParams, Node, QuadTree, TreeView},
    leapfrog, partition,
    pool::{Wave, WorkerPool},
};
