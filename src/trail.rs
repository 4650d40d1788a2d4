use std::{fmt::Display, ops::Index};

use crate::{term::Term, workspace::ExampleId};

/// An enumerated condition variable (one slot of the condition enumerator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnumVar(pub u32);

/// Guard literal bounding the number of conditions used in a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Guard(pub u32);

impl Display for EnumVar {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl Display for Guard {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// A fact the construction of a solution relied on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fact {
    /// Both examples ended up in one class and agree on their targets.
    SameClass(ExampleId, ExampleId),
    /// The examples disagree on their targets.
    Separated(ExampleId, ExampleId),
    /// The enumerated variable held this value, possibly repaired to another.
    CondValue { var: EnumVar, value: Term, repaired: Option<Term> },
    /// `ev(left, pt(at)) = ev(right, pt(at))`, or `≠` when `equal` is false.
    EvalAgree { at: ExampleId, left: ExampleId, right: ExampleId, equal: bool },
    /// The target of the example was unfolded to this pooled value.
    Unfold { example: ExampleId, value: Term },
    Guard(Guard),
}

impl Display for Fact {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            Fact::SameClass(a, b) => write!(f, "{} = {}", a, b),
            Fact::Separated(a, b) => write!(f, "{} ≠ {}", a, b),
            Fact::CondValue { var, value, repaired: None } => write!(f, "{} = [{}]", var, value),
            Fact::CondValue { var, value, repaired: Some(r) } => {
                write!(f, "{} = [{}] ↦ [{}]", var, value, r)
            }
            Fact::EvalAgree { at, left, right, equal } => {
                let op = if *equal { "=" } else { "≠" };
                write!(f, "ev({}, pt({})) {} ev({}, pt({}))", left, at, op, right, at)
            }
            Fact::Unfold { example, value } => write!(f, "ev({}) = [{}]", example, value),
            Fact::Guard(g) => write!(f, "{}", g),
        }
    }
}

/// Ordered facts accumulated while building one solution.
#[derive(Default, Debug)]
pub struct Trail {
    facts: Vec<Fact>,
    cut: Option<usize>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn push(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    pub fn last(&self) -> Option<&Fact> {
        self.facts.last()
    }

    /// Records the current length as the backtrack point, once.
    pub fn mark_cut(&mut self) {
        if self.cut.is_none() {
            self.cut = Some(self.facts.len());
        }
    }

    pub fn cut(&self) -> Option<usize> {
        self.cut
    }

    /// Turns the trail into a lemma, dropping facts past the cut point.
    pub fn into_lemma(mut self) -> Lemma {
        if let Some(cut) = self.cut {
            self.facts.truncate(cut);
        }
        Lemma { facts: self.facts }
    }
}

impl Index<usize> for Trail {
    type Output = Fact;

    fn index(&self, index: usize) -> &Self::Output {
        &self.facts[index]
    }
}

/// The negation of a conjunction of facts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Lemma {
    facts: Vec<Fact>,
}

impl Lemma {
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn guard(&self) -> Option<Guard> {
        self.facts.iter().find_map(|f| match f {
            Fact::Guard(g) => Some(*g),
            _ => None,
        })
    }

    /// Enumerated variables the lemma constrains, in trail order.
    pub fn vars(&self) -> impl Iterator<Item = EnumVar> + '_ {
        self.facts.iter().filter_map(|f| match f {
            Fact::CondValue { var, .. } => Some(*var),
            _ => None,
        })
    }
}

impl Display for Lemma {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "¬(")?;
        for (i, fact) in self.facts.iter().enumerate() {
            if i > 0 {
                write!(f, " ∧ ")?;
            }
            write!(f, "{}", fact)?;
        }
        write!(f, ")")
    }
}
