pub mod cegis;
pub mod entropy;
mod error;
pub mod gen;
pub mod options;
pub mod pool;
pub mod repair;
pub mod resolve;
pub mod retpool;
pub mod separator;
pub mod session;
pub mod term;
pub mod trail;
pub mod trie;
pub mod unifier;
pub mod workspace;

pub use error::{Result, UnifError};
pub use options::UnifOptions;
pub use session::{BuildResult, DecisionTreeSession};
pub use unifier::Unifier;
