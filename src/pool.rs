use indexmap::IndexSet;
use log::trace;

use crate::workspace::{CondId, ExampleId};

/// Identifies the condition enumerator a group of sessions draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct FamilyId(pub u32);

/// Distinct condition values seen so far by every session of one family.
///
/// Append-only; iteration follows insertion order.
#[derive(Default, Debug)]
pub struct ConditionPool {
    values: IndexSet<CondId>,
}

impl ConditionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, conds: &[CondId]) {
        for c in conds {
            if self.values.insert(*c) {
                trace!("  ...adding to condition pool : {}", c);
            }
        }
    }

    pub fn contains(&self, c: CondId) -> bool {
        self.values.contains(&c)
    }

    pub fn iter(&self) -> impl Iterator<Item = CondId> + '_ {
        self.values.iter().copied()
    }

    pub fn last(&self) -> Option<CondId> {
        self.values.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First pooled condition on which `split` reports different sides for
    /// the pair.
    pub fn find_separator<F, E>(&self, e1: ExampleId, e2: ExampleId, mut split: F) -> Result<Option<CondId>, E>
    where
        F: FnMut(CondId, ExampleId) -> Result<bool, E>,
    {
        for c in self.iter() {
            if split(c, e1)? != split(c, e2)? {
                trace!("  ...picked from pool {} to separate {} | {}", c, e1, e2);
                return Ok(Some(c));
            }
        }
        Ok(None)
    }
}
