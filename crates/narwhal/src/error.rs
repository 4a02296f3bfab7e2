use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Error {
    #[error("node `{id}` is already defined")]
    DuplicateNode { id: String },

    #[error("{context} references unknown node `{id}`")]
    UnknownNode { context: &'static str, id: String },

    #[error("node `{id}` cannot depend on itself")]
    SelfDependency { id: String },

    #[error("node `{id}` cannot be related to itself")]
    SelfRelation { id: String },

    #[error("invalid size for node `{id}`: {width}x{height}")]
    InvalidSize { id: String, width: f64, height: f64 },

    #[error("invalid value for option `{key}`: {message}")]
    InvalidOption { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal findings collected while building a graph or running a layout.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A construction record was rejected and skipped.
    #[error("skipped: {error}")]
    Skipped { error: Error },

    /// Leveling hit its pass bound without stabilizing.
    #[error(
        "possible circular dependency: levels did not stabilize after {passes} passes (nodes: {})",
        .nodes.join(", ")
    )]
    PossibleCycle { passes: usize, nodes: Vec<String> },

    #[error("unknown layout option `{key}` ignored")]
    UnknownOption { key: String },

    /// Constraint repair was still moving nodes when it ran out of passes; spacing or
    /// dependency ordering may be violated. Positions are still inside the canvas.
    #[error("layout constraints not met after {passes} settle passes")]
    ConstraintsUnmet { passes: usize },
}

impl From<Error> for Diagnostic {
    fn from(error: Error) -> Self {
        Self::Skipped { error }
    }
}
