use std::fmt;

#[derive(Debug)]
pub enum AnalysisError {
    /// An action or payload that cannot describe a legal hand state.
    MalformedInput { context: String, message: String },
    /// Internal inconsistency, surfaced with the offending hand for test seeding.
    InvariantViolation { hand: String, message: String },
    /// A result-payload kind outside the enumerated draw/win set.
    UnknownResult { kind: String },
    /// A (han, fu) combination the score tables cannot express.
    RulesetMissing { han: u8, fu: u8 },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::MalformedInput { context, message } => {
                write!(f, "Malformed input at {}: {}", context, message)
            }
            AnalysisError::InvariantViolation { hand, message } => {
                write!(f, "Invariant violation on '{}': {}", hand, message)
            }
            AnalysisError::UnknownResult { kind } => {
                write!(f, "Unknown result kind: {}", kind)
            }
            AnalysisError::RulesetMissing { han, fu } => {
                write!(f, "No score entry for {} han {} fu", han, fu)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(feature = "python")]
impl From<AnalysisError> for pyo3::PyErr {
    fn from(err: AnalysisError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
