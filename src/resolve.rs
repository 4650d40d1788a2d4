//! Strategies that pick the condition of a new trie level to separate a
//! conflicting pair of examples.

use log::trace;

use crate::{
    error::Result,
    pool::ConditionPool,
    repair::{ConstantRepair, Disequality},
    separator::Separator,
    trail::{EnumVar, Fact, Trail},
    workspace::{CondId, ExampleId, Workspace},
};

/// Source of a separating condition, consulted in [`Resolver::ORDER`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolver {
    /// The enumerated condition of the current level, possibly repaired.
    Enumerated,
    /// Any pooled condition of earlier rounds.
    Pool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    /// A condition splitting the pair was installed at the level.
    Separates,
    /// A condition was installed but the pair still agrees on it.
    Placed,
    /// The strategy had nothing to offer.
    Unavailable,
}

/// Everything a resolver may consult or record into.
pub struct Resolution<'a> {
    pub ws: &'a mut Workspace,
    pub separator: &'a mut Separator,
    pub pool: &'a ConditionPool,
    pub repair: &'a mut dyn ConstantRepair,
    /// Enumerated variable and value for each level, in order.
    pub slots: &'a [(EnumVar, CondId)],
    pub levels: &'a mut Vec<CondId>,
    pub trail: &'a mut Trail,
    pub use_pool: bool,
    pub repair_cond: bool,
}

impl Resolution<'_> {
    fn separates(&mut self, c: CondId, pair: (ExampleId, ExampleId)) -> Result<bool> {
        Ok(self.separator.compute_cond(self.ws, c, pair.0)?
            != self.separator.compute_cond(self.ws, c, pair.1)?)
    }

    fn install(&mut self, level: usize, c: CondId) {
        if level < self.levels.len() {
            self.levels[level] = c;
        } else {
            self.levels.push(c);
        }
    }

    fn try_repair(&mut self, c: CondId, pair: (ExampleId, ExampleId)) -> Result<Option<CondId>> {
        let cond = self.ws.conditions.term(c).clone();
        let constants = cond.constants();
        if constants.is_empty() {
            return Ok(None);
        }
        let left = self.ws.examples.args(pair.0)?.to_vec();
        let right = self.ws.examples.args(pair.1)?.to_vec();
        let goal = Disequality { cond: &cond, left: &left, right: &right };
        let Some(fixed) = self.repair.repair(&goal, &constants) else {
            return Ok(None);
        };
        let repaired = cond.with_constants(&fixed);
        trace!("  ...repaired {} into {}", cond, repaired);
        Ok(Some(self.ws.conditions.intern(repaired)))
    }
}

impl Resolver {
    pub const ORDER: [Resolver; 2] = [Resolver::Enumerated, Resolver::Pool];

    /// Tries to install at `level` a condition separating `pair`.
    pub fn attempt(
        self,
        res: &mut Resolution<'_>,
        level: usize,
        pair: (ExampleId, ExampleId),
    ) -> Result<Attempt> {
        match self {
            Resolver::Enumerated => {
                let Some(&(var, c)) = res.slots.get(level) else {
                    trace!("  ...no enumerated condition at level {}", level);
                    return Ok(Attempt::Unavailable);
                };
                let mut picked = c;
                let mut repaired = None;
                if res.repair_cond && !res.separates(c, pair)? {
                    if let Some(r) = res.try_repair(c, pair)? {
                        picked = r;
                        repaired = Some(res.ws.conditions.term(r).clone());
                    }
                }
                res.install(level, picked);
                let value = res.ws.conditions.term(c).clone();
                trace!("  ...picked enumerated {} = [{}]", var, value);
                res.trail.push(Fact::CondValue { var, value, repaired });
                if res.separates(picked, pair)? {
                    Ok(Attempt::Separates)
                } else {
                    Ok(Attempt::Placed)
                }
            }
            Resolver::Pool => {
                if !res.use_pool {
                    return Ok(Attempt::Unavailable);
                }
                let (sep, ws) = (&mut *res.separator, &*res.ws);
                let found = res.pool.find_separator(pair.0, pair.1, |c, e| sep.compute_cond(ws, c, e))?;
                match found {
                    Some(c) => {
                        res.install(level, c);
                        res.trail.mark_cut();
                        Ok(Attempt::Separates)
                    }
                    None => {
                        trace!("  ...no pooled condition separates {} | {}", pair.0, pair.1);
                        Ok(Attempt::Unavailable)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        repair::{BoundaryRepair, NoRepair},
        term::{Term, Value},
    };

    struct Fixture {
        ws: Workspace,
        separator: Separator,
        pool: ConditionPool,
        levels: Vec<CondId>,
        trail: Trail,
        pair: (ExampleId, ExampleId),
    }

    fn fixture() -> Fixture {
        let mut ws = Workspace::new();
        let e1 = ws.examples.add(vec![Value::int(0), Value::int(0)]);
        let e2 = ws.examples.add(vec![Value::int(1), Value::int(2)]);
        Fixture {
            ws,
            separator: Separator::default(),
            pool: ConditionPool::new(),
            levels: Vec::new(),
            trail: Trail::new(),
            pair: (e2, e1),
        }
    }

    fn run(
        f: &mut Fixture,
        slots: &[(EnumVar, CondId)],
        repair: &mut dyn ConstantRepair,
        use_pool: bool,
        repair_cond: bool,
    ) -> Vec<Attempt> {
        let mut res = Resolution {
            ws: &mut f.ws,
            separator: &mut f.separator,
            pool: &f.pool,
            repair,
            slots,
            levels: &mut f.levels,
            trail: &mut f.trail,
            use_pool,
            repair_cond,
        };
        Resolver::ORDER.iter().map(|r| r.attempt(&mut res, 0, f.pair).unwrap()).collect()
    }

    #[test]
    fn enumerated_condition_is_placed_even_if_useless() {
        let mut f = fixture();
        let c = f.ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(1)));
        let out = run(&mut f, &[(EnumVar(0), c)], &mut NoRepair, false, false);
        assert_eq!(out, vec![Attempt::Placed, Attempt::Unavailable]);
        assert_eq!(f.levels, vec![c]);
        assert_eq!(f.trail.len(), 1);
        assert_eq!(f.trail.cut(), None);
    }

    #[test]
    fn pool_overrides_a_useless_enumerated_condition() {
        let mut f = fixture();
        let c = f.ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(1)));
        let p = f.ws.conditions.intern(Term::gt(Term::rvar(1), Term::int(1)));
        f.pool.merge(&[c, p]);
        let out = run(&mut f, &[(EnumVar(0), c)], &mut NoRepair, true, false);
        assert_eq!(out, vec![Attempt::Placed, Attempt::Separates]);
        assert_eq!(f.levels, vec![p]);
        assert_eq!(f.trail.cut(), Some(1));
    }

    #[test]
    fn repair_replaces_the_level_condition() {
        let mut f = fixture();
        let c = f.ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(1)));
        let out = run(&mut f, &[(EnumVar(0), c)], &mut BoundaryRepair, false, true);
        assert_eq!(out[0], Attempt::Separates);
        assert_ne!(f.levels[0], c);
        let fixed = f.ws.conditions.term(f.levels[0]).clone();
        assert_eq!(
            f.trail[0],
            Fact::CondValue {
                var: EnumVar(0),
                value: f.ws.conditions.term(c).clone(),
                repaired: Some(fixed),
            }
        );
    }

    #[test]
    fn nothing_to_offer_without_slots() {
        let mut f = fixture();
        let out = run(&mut f, &[], &mut NoRepair, true, true);
        assert_eq!(out, vec![Attempt::Unavailable, Attempt::Unavailable]);
        assert!(f.levels.is_empty());
        assert!(f.trail.is_empty());
    }
}
