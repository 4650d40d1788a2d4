use clap::Args;

/// Strategy toggles of the unification engine. Every toggle is independent
/// of the others.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnifOptions {
    /// Build the trie in one pass over every pooled condition, without
    /// conflict resolution.
    #[arg(long)]
    pub cond_independent: bool,

    /// Fall back to conditions of earlier rounds to resolve conflicts.
    #[arg(long)]
    pub cond_pool: bool,

    /// Merge conflicting examples through a pool of previous target values.
    #[arg(long)]
    pub ret_pool: bool,

    /// Rebuild boolean decision trees top-down by information gain.
    #[arg(long)]
    pub heuristic_dt: bool,

    /// Repair the constants of conditions that fail to separate a conflict.
    #[arg(long)]
    pub repair_cond: bool,
}
