use thiserror::Error;

/// Error types for the peakfit-rs library.
///
/// These cover configuration mistakes made by the caller and failures raised
/// inside the solver. The outcome of a fit attempt is reported separately
/// through [`FitFailure`].
#[derive(Error, Debug)]
pub enum FitError {
    /// The requested peak shape name is not one of the supported shapes.
    #[error("Unsupported function name: {0}")]
    UnknownShape(String),

    /// The parameter vector does not split into whole peaks plus a baseline.
    #[error(
        "Parameter vector of length {len} does not match {arity} parameters per peak plus 2 baseline parameters"
    )]
    ParameterLength { len: usize, arity: usize },

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error indicating the algorithm failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FitError {
    /// Returns true for errors caused by an invalid fitter configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FitError::UnknownShape(_) | FitError::ParameterLength { .. } | FitError::DimensionMismatch(_)
        )
    }
}

/// Result type alias for peakfit-rs operations.
pub type Result<T> = std::result::Result<T, FitError>;

/// Why a `fit()` or `decompose()` call produced no result.
#[derive(Error, Debug)]
pub enum FitFailure {
    /// No parameter vector was set before fitting.
    #[error("No parameters have been set")]
    NoParameters,

    /// The selected x-range contains no samples, or no data was set.
    #[error("No data points in the selected range")]
    NoData,

    /// Fewer samples than free parameters.
    #[error("Too few data points ({points}) for {params} parameters")]
    TooFewPoints { points: usize, params: usize },

    /// The solver stopped without meeting its convergence criteria.
    #[error("Fitting did not converge: {0}")]
    NotConverged(String),

    /// The solver hit a numerical error.
    #[error("Numerical failure during fitting: {0}")]
    Numerical(#[from] FitError),

    /// Decomposition requested before a successful fit.
    #[error("No fitted parameters available")]
    NotFitted,
}
