use infraguard_graph::{Graph, GraphError};
use infraguard_types::{Category, Finding, Severity};
use thiserror::Error;

/// A named, side-effect-free predicate over the resource graph.
///
/// `check` returns one [`Finding`] per violation; an empty list means the rule passed.
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn category(&self) -> Category;
    fn severity(&self) -> Severity;
    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError>;
}

/// Internal failure of a single rule. Isolated by the engine: it never aborts evaluation.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid glob pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Failed(String),
}
