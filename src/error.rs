/// Failures surfaced by the routing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Malformed or inconsistent input, detected before any search starts.
    Configuration(String),
    /// No assignment satisfies the capacity and single-visit constraints.
    NoSolutionFound(String),
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            RoutingError::NoSolutionFound(msg) => write!(f, "No solution found: {}", msg),
        }
    }
}

impl std::error::Error for RoutingError {}

pub type Result<T> = std::result::Result<T, RoutingError>;

pub(crate) fn config_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(RoutingError::Configuration(msg.into()))
}

pub(crate) fn no_solution<T>(msg: impl Into<String>) -> Result<T> {
    Err(RoutingError::NoSolutionFound(msg.into()))
}
