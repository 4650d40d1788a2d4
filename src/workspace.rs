//! Handle arenas for examples and conditions.
//!
//! Handles are assigned on creation and never reused, so a pair of handles is
//! a cheap structural key for the evaluation cache.

use std::fmt::Display;

use indexmap::IndexSet;

use crate::{
    error::{Result, UnifError},
    term::{Term, Value},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExampleId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CondId(pub u32);

impl Display for ExampleId {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl Display for CondId {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Argument tuples of every example, indexed by [`ExampleId`].
#[derive(Default)]
pub struct ExampleStore {
    points: Vec<Vec<Value>>,
}

impl ExampleStore {
    pub fn add(&mut self, args: Vec<Value>) -> ExampleId {
        self.points.push(args);
        ExampleId((self.points.len() - 1) as u32)
    }

    pub fn args(&self, e: ExampleId) -> Result<&[Value]> {
        self.points.get(e.0 as usize).map(Vec::as_slice).ok_or(UnifError::UnknownExample(e))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Interns condition terms by structural identity.
#[derive(Default)]
pub struct ConditionStore {
    terms: IndexSet<Term>,
}

impl ConditionStore {
    pub fn intern(&mut self, t: Term) -> CondId {
        let (ix, _) = self.terms.insert_full(t);
        CondId(ix as u32)
    }

    pub fn lookup(&self, t: &Term) -> Option<CondId> {
        self.terms.get_index_of(t).map(|ix| CondId(ix as u32))
    }

    pub fn term(&self, c: CondId) -> &Term {
        // Ids are only minted by `intern`.
        &self.terms[c.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Default)]
pub struct Workspace {
    pub examples: ExampleStore,
    pub conditions: ConditionStore,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }
}
