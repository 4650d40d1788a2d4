//! Information-gain rebuild of a resolved trie.
//!
//! The sequential construction installs conditions in the order conflicts
//! arise. This pass regrows the trie top-down over all examples, picking at
//! every split the pooled condition with the highest information gain.

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::{
    error::Result,
    separator::Separator,
    term::{Term, Value},
    trie::ClassifierTrie,
    workspace::{CondId, ExampleId, Workspace},
};

fn is_positive(t: Option<&Term>) -> bool {
    matches!(t, Some(Term::Value(Value::Bool(true))))
}

/// Whether every target is a boolean constant.
pub fn boolean_targets(targets: &IndexMap<ExampleId, Term>) -> bool {
    targets.values().all(|t| matches!(t, Term::Value(Value::Bool(_))))
}

/// Binary entropy of the positive/negative target split of `pts`.
pub fn entropy(pts: &[ExampleId], targets: &IndexMap<ExampleId, Term>) -> f64 {
    let p = pts.iter().filter(|e| is_positive(targets.get(*e))).count() as f64;
    let n = pts.len() as f64 - p;
    if p == 0.0 || n == 0.0 {
        return 0.0;
    }
    let (fp, fn_) = (p / (p + n), n / (p + n));
    -fp * fp.log2() - fn_ * fn_.log2()
}

pub struct EntropyRebuilder<'a> {
    sep: &'a mut Separator,
    ws: &'a Workspace,
    targets: &'a IndexMap<ExampleId, Term>,
}

impl<'a> EntropyRebuilder<'a> {
    pub fn new(
        sep: &'a mut Separator,
        ws: &'a Workspace,
        targets: &'a IndexMap<ExampleId, Term>,
    ) -> Self {
        EntropyRebuilder { sep, ws, targets }
    }

    /// Rebuilds a trie over `examples` from the conditions of `pool`.
    ///
    /// When no split is needed, `fallback` is installed so the tree still
    /// references a classifier. Returns `None` if the rebuilt trie leaves
    /// some class inconsistent.
    pub fn recompute(
        &mut self,
        examples: &[ExampleId],
        pool: &[CondId],
        fallback: Option<CondId>,
    ) -> Result<Option<(ClassifierTrie, Vec<CondId>)>> {
        let mut trie = ClassifierTrie::new();
        let mut levels = Vec::new();
        for e in examples {
            trie.add(*e, &mut self.sep.view(self.ws, &levels), 0)?;
        }
        self.build_dt(&mut trie, &mut levels, examples, pool.to_vec(), 1)?;

        if levels.is_empty() {
            if let Some(c) = fallback {
                debug!("......using last condition {} as candidate", c);
                levels.push(c);
                trie.add_classifier(&mut self.sep.view(self.ws, &levels), 0)?;
            }
        }
        if !trie.is_consistent(self.targets) {
            warn!("heuristic rebuild ran out of separating conditions, keeping the original tree");
            return Ok(None);
        }
        Ok(Some((trie, levels)))
    }

    fn split(&mut self, pts: &[ExampleId], c: CondId) -> Result<(Vec<ExampleId>, Vec<ExampleId>)> {
        let (mut good, mut bad) = (Vec::new(), Vec::new());
        for pt in pts {
            if self.sep.compute_cond(self.ws, c, *pt)? {
                good.push(*pt);
            } else {
                bad.push(*pt);
            }
        }
        Ok((good, bad))
    }

    fn build_dt(
        &mut self,
        trie: &mut ClassifierTrie,
        levels: &mut Vec<CondId>,
        pts: &[ExampleId],
        mut conds: Vec<CondId>,
        ind: usize,
    ) -> Result<()> {
        if pts.len() < 2 {
            trace!("{:ind$}..set fully classified: {}", "", pts.len(), ind = ind);
            return Ok(());
        }
        let first = self.targets.get(&pts[0]);
        if pts.iter().all(|e| self.targets.get(e) == first) {
            trace!("{:ind$}..set fully classified: {} points", "", pts.len(), ind = ind);
            return Ok(());
        }
        if conds.is_empty() {
            trace!("{:ind$}..no condition left for {} points", "", pts.len(), ind = ind);
            return Ok(());
        }

        let current = entropy(pts, self.targets);
        let mut best: Option<(usize, f64)> = None;
        let mut splits = Vec::with_capacity(conds.len());
        for (i, c) in conds.iter().enumerate() {
            let (good, bad) = self.split(pts, *c)?;
            let gain = current
                - (good.len() as f64 * entropy(&good, self.targets)
                    + bad.len() as f64 * entropy(&bad, self.targets))
                    / pts.len() as f64;
            trace!("{:ind$}..gain of {} is {}", "", c, gain, ind = ind);
            if best.map_or(true, |(_, max)| gain > max) {
                best = Some((i, gain));
            }
            splits.push((good, bad));
        }
        let Some((picked, _)) = best else {
            return Ok(());
        };

        let c = conds.remove(picked);
        trace!("{:ind$}..picked condition {}", "", c, ind = ind);
        levels.push(c);
        trie.add_classifier(&mut self.sep.view(self.ws, levels), levels.len() - 1)?;

        let (good, bad) = splits.swap_remove(picked);
        self.build_dt(trie, levels, &good, conds.clone(), ind + 1)?;
        self.build_dt(trie, levels, &bad, conds, ind + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(xs: &[(i64, bool)]) -> (Workspace, Vec<ExampleId>, IndexMap<ExampleId, Term>) {
        let mut ws = Workspace::new();
        let mut exs = Vec::new();
        let mut targets = IndexMap::new();
        for (x, t) in xs {
            let e = ws.examples.add(vec![Value::int(*x)]);
            exs.push(e);
            targets.insert(e, Term::val(Value::Bool(*t)));
        }
        (ws, exs, targets)
    }

    #[test]
    fn entropy_of_pure_and_balanced_sets() {
        let (_, exs, targets) = setup(&[(0, true), (1, true), (2, false), (3, false)]);
        assert_eq!(entropy(&exs[..2], &targets), 0.0);
        assert_eq!(entropy(&[], &targets), 0.0);
        assert!((entropy(&exs, &targets) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn picks_the_most_informative_condition() {
        let (mut ws, exs, targets) =
            setup(&[(0, false), (1, false), (2, false), (3, true), (4, true), (5, true)]);
        let weak = ws.conditions.intern(Term::lt(Term::rvar(0), Term::int(1)));
        let strong = ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(2)));
        let mut sep = Separator::default();
        let (trie, levels) = EntropyRebuilder::new(&mut sep, &ws, &targets)
            .recompute(&exs, &[weak, strong], Some(weak))
            .unwrap()
            .unwrap();
        assert_eq!(levels, vec![strong]);
        assert_eq!(trie.classes().count(), 2);
    }

    #[test]
    fn pure_sets_are_not_split() {
        let (mut ws, exs, targets) = setup(&[(0, true), (5, true), (9, true)]);
        let c = ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(2)));
        let mut sep = Separator::default();
        let (_, levels) = EntropyRebuilder::new(&mut sep, &ws, &targets)
            .recompute(&exs, &[c], None)
            .unwrap()
            .unwrap();
        assert!(levels.is_empty());
        let (_, levels) = EntropyRebuilder::new(&mut sep, &ws, &targets)
            .recompute(&exs, &[c], Some(c))
            .unwrap()
            .unwrap();
        assert_eq!(levels, vec![c]);
    }

    #[test]
    fn ties_go_to_the_first_condition() {
        let (mut ws, exs, targets) = setup(&[(0, false), (5, true)]);
        let a = ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(2)));
        let b = ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(3)));
        let mut sep = Separator::default();
        let (_, levels) = EntropyRebuilder::new(&mut sep, &ws, &targets)
            .recompute(&exs, &[a, b], None)
            .unwrap()
            .unwrap();
        assert_eq!(levels, vec![a]);
    }

    #[test]
    fn useless_pool_is_rejected() {
        let (mut ws, exs, targets) = setup(&[(0, false), (5, true)]);
        let c = ws.conditions.intern(Term::gt(Term::rvar(0), Term::int(7)));
        let mut sep = Separator::default();
        let rebuilt = EntropyRebuilder::new(&mut sep, &ws, &targets).recompute(&exs, &[c], None);
        assert_eq!(rebuilt.map(|r| r.is_none()), Ok(true));
    }
}
