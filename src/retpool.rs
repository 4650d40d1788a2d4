//! Pool of target values, reused to merge examples that disagree only on
//! the syntax of their targets.

use indexmap::{IndexMap, IndexSet};
use log::trace;

use crate::{
    error::Result,
    term::{Term, Value},
    trail::{Fact, Trail},
    workspace::{ExampleId, Workspace},
};

#[derive(Default, Debug)]
pub struct ReturnPool {
    values: IndexSet<Term>,
    // Value of each example's current target on its own point.
    current: IndexMap<ExampleId, Option<Value>>,
}

impl ReturnPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn add(&mut self, e: ExampleId, args: &[Value], target: &Term) {
        self.current.insert(e, target.eval(args));
        if self.values.insert(target.clone()) {
            trace!("  ...new pool value: {}", target);
        }
    }

    /// Pooled values that agree with the current target of `e` on its point.
    pub fn equivalents(&self, e: ExampleId, args: &[Value]) -> IndexSet<Term> {
        let Some(cur) = self.current.get(&e) else {
            return IndexSet::new();
        };
        self.values.iter().filter(|v| &v.eval(args) == cur).cloned().collect()
    }

    /// Looks for one pooled value acceptable to `e` and every member of
    /// `class`, each judged on its own point.
    ///
    /// Pushes to `trail` why the merge succeeded, followed by the unfolding
    /// of every member to the common value, or the first member it failed on.
    pub fn merge(
        &self,
        ws: &Workspace,
        e: ExampleId,
        class: &[ExampleId],
        trail: &mut Trail,
    ) -> Result<Option<Term>> {
        let mut merged = self.equivalents(e, ws.examples.args(e)?);
        for m in class {
            let theirs = self.equivalents(*m, ws.examples.args(*m)?);
            merged.retain(|v| theirs.contains(v));
            if merged.is_empty() {
                trace!("  ......couldn't merge {} with {}", e, m);
                trail.push(Fact::EvalAgree { at: *m, left: *m, right: e, equal: false });
                return Ok(None);
            }
        }
        let Some(rep) = class.first() else {
            return Ok(None);
        };
        trail.push(Fact::EvalAgree { at: *rep, left: *rep, right: e, equal: true });
        let common = merged.first().cloned();
        if let Some(v) = &common {
            trace!("  ...common value {}", v);
            for m in class {
                trail.push(Fact::Unfold { example: *m, value: v.clone() });
            }
        }
        Ok(common)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_finds_a_value_matching_every_point() {
        let mut ws = Workspace::new();
        let e1 = ws.examples.add(vec![Value::int(1), Value::int(5)]);
        let e2 = ws.examples.add(vec![Value::int(4), Value::int(4)]);
        let x = Term::rvar(0);
        let y = Term::rvar(1);

        let mut pool = ReturnPool::new();
        pool.add(e1, ws.examples.args(e1).unwrap(), &y);
        pool.add(e2, ws.examples.args(e2).unwrap(), &x);

        // On e2's point x and y coincide, so y also satisfies e2.
        let mut trail = Trail::new();
        let common = pool.merge(&ws, e2, &[e1, e2], &mut trail).unwrap();
        assert_eq!(common, Some(y.clone()));
        assert_eq!(
            trail.into_lemma().facts(),
            &[
                Fact::EvalAgree { at: e1, left: e1, right: e2, equal: true },
                Fact::Unfold { example: e1, value: y.clone() },
                Fact::Unfold { example: e2, value: y },
            ]
        );
    }

    #[test]
    fn merge_reports_the_incompatible_member() {
        let mut ws = Workspace::new();
        let e1 = ws.examples.add(vec![Value::int(1), Value::int(5)]);
        let e2 = ws.examples.add(vec![Value::int(2), Value::int(3)]);
        let mut pool = ReturnPool::new();
        pool.add(e1, ws.examples.args(e1).unwrap(), &Term::rvar(0));
        pool.add(e2, ws.examples.args(e2).unwrap(), &Term::rvar(1));

        let mut trail = Trail::new();
        let common = pool.merge(&ws, e2, &[e1, e2], &mut trail).unwrap();
        assert_eq!(common, None);
        assert_eq!(
            trail.last(),
            Some(&Fact::EvalAgree { at: e1, left: e1, right: e2, equal: false })
        );
        assert_eq!(pool.len(), 2);
    }
}
