use orbis_cubesphere::MAX_DEPTH;

/// Errors from configuring the LOD system.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LodError {
    /// No distance thresholds at all.
    #[error("the detail distance table is empty")]
    EmptyDistances,

    /// A threshold that is NaN or negative.
    #[error("detail distance {index} is {value}, it must be a non-negative number")]
    InvalidDistance {
        /// Position in the table.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Maximum depth outside `1..=MAX_DEPTH`.
    #[error("max depth {0} is outside [1, {MAX_DEPTH}]")]
    DepthOutOfRange(u8),

    /// An in-flight budget of zero would never dispatch anything.
    #[error("the in-flight generation budget must be at least 1")]
    ZeroBudget,
}
