use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriftError {
    #[error("Missing required configuration key: {0}")]
    MissingConfig(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Insufficient ghost width along {direction}: order-{order} stencil needs {required}, mesh has {available}")]
    GhostWidth {
        direction: char,
        order: usize,
        required: usize,
        available: usize,
    },

    #[error("Naulin solver did not converge after {iterations} iterations (residual {residual:.3e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("Solver diverged at iteration {iteration}: {message}")]
    SolverDiverged { iteration: usize, message: String },

    #[error("Non-finite value in {field} at (x={x}, y={y}, z={z})")]
    NonFinite {
        field: String,
        x: usize,
        y: usize,
        z: usize,
    },

    #[error("Shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("Halo communication failed: {0}")]
    Communication(String),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NPZ archive error: {0}")]
    Npz(String),
}

pub type DriftResult<T> = Result<T, DriftError>;
