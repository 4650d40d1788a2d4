use thiserror::Error;

use crate::workspace::{CondId, ExampleId};

/// Internal invariant breaches of the unification engine.
///
/// Unresolved separation conflicts are not errors; they are reported as
/// [`crate::BuildResult::Conflict`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnifError {
    #[error("condition {cond} does not evaluate to a boolean constant on {example}")]
    NonBooleanCondition { cond: CondId, example: ExampleId },

    #[error("unknown example {0}")]
    UnknownExample(ExampleId),

    #[error("unknown session {0}")]
    UnknownSession(usize),

    #[error("no target value recorded for {0}")]
    MissingTarget(ExampleId),

    #[error("{example} is in no separation class derived from the class of {rep}")]
    LostRepresentative { example: ExampleId, rep: ExampleId },

    #[error("trie level {level} requested but {depth} classifiers are installed")]
    LevelMismatch { level: usize, depth: usize },

    #[error("trie of depth {depth} has a misplaced node at level {level}")]
    MalformedTrie { level: usize, depth: usize },
}

pub type Result<T, E = UnifError> = std::result::Result<T, E>;
