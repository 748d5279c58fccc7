use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid bailout radius: {0} (must be > 0.0)")]
    InvalidBailout(f64),

    #[error("invalid power: {0} (must be >= 2)")]
    InvalidPower(i32),

    #[error("invalid precision: {0} digits (must be >= 1)")]
    InvalidPrecision(usize),

    #[error("unknown fractal family: {0:?}")]
    UnknownFamily(String),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("square root of a negative value")]
    SqrtOfNegative,

    #[error("invalid decimal literal at byte {position}: {message}")]
    DecimalParse { position: usize, message: String },

    #[error("formula parse error at position {position}: {message}")]
    FormulaParse { position: usize, message: String },

    #[error("formula evaluation error: {0}")]
    FormulaEval(String),
}

impl CoreError {
    /// The byte offset a parse-stage error points at, if any.
    ///
    /// Lets UI code underline the offending character without matching on
    /// the variant.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::DecimalParse { position, .. } | Self::FormulaParse { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}
