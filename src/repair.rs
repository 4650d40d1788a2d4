//! Constant repair of conditions that fail to separate two examples.

use std::collections::BTreeSet;

use log::trace;
use num::Signed;
use num_rational::BigRational;

use crate::term::{Term, Value};

/// Goal `cond(left) ≠ cond(right)`.
pub struct Disequality<'a> {
    pub cond: &'a Term,
    pub left: &'a [Value],
    pub right: &'a [Value],
}

impl Disequality<'_> {
    /// Whether `cond`, a variant of the goal's condition, satisfies the goal.
    pub fn holds_for(&self, cond: &Term) -> bool {
        match (cond.eval(self.left), cond.eval(self.right)) {
            (Some(Value::Bool(a)), Some(Value::Bool(b))) => a != b,
            _ => false,
        }
    }
}

pub trait ConstantRepair {
    /// Looks for new values of `constants`, the literals of `goal.cond` in
    /// [`Term::constants`] order, that satisfy the goal.
    fn repair(&mut self, goal: &Disequality<'_>, constants: &[BigRational]) -> Option<Vec<BigRational>>;
}

/// Declines every request.
pub struct NoRepair;

impl ConstantRepair for NoRepair {
    fn repair(&mut self, _: &Disequality<'_>, _: &[BigRational]) -> Option<Vec<BigRational>> {
        None
    }
}

/// Moves one constant at a time onto a boundary between the two points.
///
/// Candidates are the rational arguments of both points, their neighbours,
/// pairwise midpoints, and the original constant plus or minus one. They are
/// tried closest to the original value first.
#[derive(Default)]
pub struct BoundaryRepair;

impl BoundaryRepair {
    fn anchors(goal: &Disequality<'_>) -> BTreeSet<BigRational> {
        let one = BigRational::from_integer(1.into());
        let two = BigRational::from_integer(2.into());
        let points: BTreeSet<BigRational> =
            goal.left.iter().chain(goal.right).filter_map(|v| v.as_rat().cloned()).collect();
        let mut out = BTreeSet::new();
        for a in &points {
            out.insert(a.clone());
            out.insert(a + &one);
            out.insert(a - &one);
            for b in points.range(a..) {
                out.insert((a + b) / &two);
            }
        }
        out
    }
}

impl ConstantRepair for BoundaryRepair {
    fn repair(&mut self, goal: &Disequality<'_>, constants: &[BigRational]) -> Option<Vec<BigRational>> {
        let anchors = Self::anchors(goal);
        let one = BigRational::from_integer(1.into());
        for (pos, orig) in constants.iter().enumerate() {
            let mut cands: Vec<BigRational> = anchors.iter().cloned().collect();
            cands.push(orig + &one);
            cands.push(orig - &one);
            cands.sort_by(|a, b| (a - orig).abs().cmp(&(b - orig).abs()).then(a.cmp(b)));
            cands.dedup();
            for c in cands {
                if &c == orig {
                    continue;
                }
                let mut attempt = constants.to_vec();
                attempt[pos] = c;
                if goal.holds_for(&goal.cond.with_constants(&attempt)) {
                    trace!("repaired constant {} of {} to {}", pos, goal.cond, attempt[pos]);
                    return Some(attempt);
                }
            }
        }
        trace!("...failed to repair {}", goal.cond);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_moves_between_points() {
        let cond = Term::gt(Term::rvar(0), Term::int(1));
        let left = [Value::int(0), Value::int(0)];
        let right = [Value::int(1), Value::int(2)];
        let goal = Disequality { cond: &cond, left: &left, right: &right };
        assert!(!goal.holds_for(&cond));
        let fixed = BoundaryRepair.repair(&goal, &cond.constants()).unwrap();
        assert!(goal.holds_for(&cond.with_constants(&fixed)));
        // The closest midpoint wins over the integer neighbours.
        assert_eq!(fixed, vec![BigRational::new(1.into(), 2.into())]);
    }

    #[test]
    fn identical_points_cannot_be_repaired() {
        let cond = Term::gt(Term::rvar(0), Term::int(1));
        let pt = [Value::int(3)];
        let goal = Disequality { cond: &cond, left: &pt, right: &pt };
        assert_eq!(BoundaryRepair.repair(&goal, &cond.constants()), None);
        assert_eq!(NoRepair.repair(&goal, &cond.constants()), None);
    }

    #[test]
    fn constant_free_conditions_are_left_alone() {
        let cond = Term::lt(Term::rvar(0), Term::rvar(1));
        let left = [Value::int(0), Value::int(0)];
        let right = [Value::int(1), Value::int(0)];
        let goal = Disequality { cond: &cond, left: &left, right: &right };
        assert_eq!(BoundaryRepair.repair(&goal, &cond.constants()), None);
    }
}
