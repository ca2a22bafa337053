use thiserror::Error;

/// Fatal errors raised by the quadtree. Either one aborts the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The tree was used before `reset` gave it a root node.
    #[error("quadtree used before it was reset")]
    InvalidReference,
    /// Growing the node storage or the subdivision record failed.
    #[error("quadtree could not grow its storage")]
    AllocationFailure,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation parameters: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("failed to build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("step() called before initialize()")]
    NotInitialized,
    #[error("initialize() called twice")]
    AlreadyInitialized,
    #[error("body array `{field}` has {found} entries, expected {expected}")]
    BodyCountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("a previous step failed, the simulation state is undefined")]
    Poisoned,
}
