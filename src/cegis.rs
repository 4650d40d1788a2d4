//! A minimal counterexample-guided loop around one [`Unifier`] session.
//!
//! The driver plays the roles the engine expects from the outside world: it
//! verifies candidates against a hidden reference program, answers for the
//! target value of every example, and enumerates threshold conditions while
//! honouring the lemmas returned on failure.

use indexmap::IndexMap;
use log::{debug, info};

use crate::{
    error::Result,
    gen::Instance,
    options::UnifOptions,
    pool::FamilyId,
    repair::BoundaryRepair,
    separator::BranchCons,
    session::BuildResult,
    term::{Sort, Term, Value},
    trail::{EnumVar, Guard, Lemma},
    unifier::Unifier,
    workspace::ExampleId,
};

/// Current target value of every example.
pub trait ModelOracle {
    fn model_value(&self, e: ExampleId, args: &[Value]) -> Term;

    /// Candidate used when there is nothing to unify.
    fn default_program(&self) -> Term;
}

/// Supplies, per enumeration slot, the next condition not yet tried.
pub trait ConditionEnumerator {
    fn next_condition(&mut self, slot: EnumVar) -> Option<Term>;

    /// Restarts the enumeration of `slot`.
    fn reset(&mut self, slot: EnumVar);
}

/// Targets are the values of a fixed reference program.
pub struct ReferenceOracle {
    reference: Term,
}

impl ReferenceOracle {
    pub fn new(reference: Term) -> Self {
        ReferenceOracle { reference }
    }
}

impl ModelOracle for ReferenceOracle {
    fn model_value(&self, _: ExampleId, args: &[Value]) -> Term {
        match self.reference.eval(args) {
            Some(v) => Term::val(v),
            None => self.default_program(),
        }
    }

    fn default_program(&self) -> Term {
        match self.reference.sort() {
            Sort::Boolean => Term::false_(),
            Sort::Rational => Term::int(0),
        }
    }
}

/// Enumerates `rᵢ < k` for every argument `i` and every integer `k` of
/// `-range..=range + 1`, independently for each slot.
pub struct ThresholdEnumerator {
    arity: usize,
    range: i64,
    cursors: IndexMap<EnumVar, usize>,
}

impl ThresholdEnumerator {
    pub fn new(arity: usize, range: i64) -> Self {
        ThresholdEnumerator { arity: arity.max(1), range, cursors: IndexMap::new() }
    }

    fn size(&self) -> usize {
        self.arity * (2 * self.range + 2).max(0) as usize
    }

    fn nth(&self, n: usize) -> Term {
        let var = n % self.arity;
        let k = -self.range + (n / self.arity) as i64;
        Term::lt(Term::rvar(var), Term::int(k))
    }
}

impl ConditionEnumerator for ThresholdEnumerator {
    fn next_condition(&mut self, slot: EnumVar) -> Option<Term> {
        let size = self.size();
        let cursor = self.cursors.entry(slot).or_insert(0);
        if *cursor >= size {
            return None;
        }
        let n = *cursor;
        *cursor += 1;
        Some(self.nth(n))
    }

    fn reset(&mut self, slot: EnumVar) {
        self.cursors.insert(slot, 0);
    }
}

#[derive(Debug)]
pub struct Report {
    pub program: Option<Term>,
    pub rounds: usize,
    pub examples: usize,
    pub lemmas: Vec<Lemma>,
}

pub struct Driver<E> {
    unifier: Unifier,
    session: usize,
    instance: Instance,
    oracle: ReferenceOracle,
    enumerator: E,
    repair: BoundaryRepair,
    // Current value of each enumeration slot.
    values: Vec<Term>,
}

impl<E: ConditionEnumerator> Driver<E> {
    pub fn new(instance: Instance, options: UnifOptions, enumerator: E) -> Self {
        let mut unifier = Unifier::new();
        let session = unifier.add_session(options, FamilyId::default(), None);
        let oracle = ReferenceOracle::new(instance.reference.clone());
        Driver {
            unifier,
            session,
            instance,
            oracle,
            enumerator,
            repair: BoundaryRepair,
            values: Vec::new(),
        }
    }

    pub fn unifier(&self) -> &Unifier {
        &self.unifier
    }

    /// Runs rounds until a candidate agrees with every point of the instance,
    /// the conditions are exhausted, or `max_rounds` is reached.
    pub fn run(&mut self, max_rounds: usize) -> Result<Report> {
        let mut lemmas = Vec::new();
        for round in 1..=max_rounds {
            let enums: Vec<EnumVar> = (0..self.values.len() as u32).map(EnumVar).collect();
            self.unifier.set_conditions(self.session, Guard(round as u32), &enums, &self.values)?;
            let result = self.unifier.build_solution(
                self.session,
                BranchCons::Ite,
                &self.oracle,
                &mut self.repair,
            )?;
            let exhausted = match result {
                BuildResult::Program(p) => match self.counterexample(&p) {
                    None => {
                        info!("round {}: {} is correct", round, p);
                        return Ok(self.report(Some(p), round, lemmas));
                    }
                    Some(pt) => {
                        debug!("round {}: {} fails on {:?}", round, p, pt);
                        let e = self.unifier.add_example(self.session, pt)?;
                        self.unifier.set_entailed(self.session, e)?;
                        false
                    }
                },
                // Only the pool grows in independent mode, so keep feeding it.
                BuildResult::Conflict(None) => match self.values.len() {
                    0 => !self.open_slot(),
                    n => !self.advance(EnumVar(n as u32 - 1)),
                },
                BuildResult::Conflict(Some(lemma)) => {
                    debug!("round {}: learned {}", round, lemma);
                    let exhausted = match lemma.vars().max() {
                        Some(slot) if lemma.guard().is_none() => !self.advance(slot),
                        _ => !self.open_slot(),
                    };
                    lemmas.push(lemma);
                    exhausted
                }
            };
            if exhausted {
                info!("round {}: conditions exhausted", round);
                return Ok(self.report(None, round, lemmas));
            }
        }
        Ok(self.report(None, max_rounds, lemmas))
    }

    fn report(&self, program: Option<Term>, rounds: usize, lemmas: Vec<Lemma>) -> Report {
        let examples = self.unifier.session(self.session).map_or(0, |s| s.examples().len());
        Report { program, rounds, examples, lemmas }
    }

    fn counterexample(&self, program: &Term) -> Option<Vec<Value>> {
        self.instance
            .points
            .iter()
            .find(|pt| program.eval(pt) != self.instance.reference.eval(pt))
            .cloned()
    }

    fn open_slot(&mut self) -> bool {
        let slot = EnumVar(self.values.len() as u32);
        match self.enumerator.next_condition(slot) {
            Some(c) => {
                debug!("...opening {} with {}", slot, c);
                self.values.push(c);
                true
            }
            None => false,
        }
    }

    /// Moves `slot` to its next value, carrying into lower slots once it
    /// wraps around. Opens a new slot when every combination was tried.
    fn advance(&mut self, slot: EnumVar) -> bool {
        let mut ix = slot.0 as usize;
        loop {
            if let Some(c) = self.enumerator.next_condition(EnumVar(ix as u32)) {
                self.values[ix] = c;
                return true;
            }
            self.enumerator.reset(EnumVar(ix as u32));
            match self.enumerator.next_condition(EnumVar(ix as u32)) {
                Some(c) => self.values[ix] = c,
                None => return false,
            }
            if ix == 0 {
                return self.open_slot();
            }
            ix -= 1;
        }
    }
}
