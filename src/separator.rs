//! Condition evaluation and program extraction.

use indexmap::IndexMap;
use log::trace;

use crate::{
    error::{Result, UnifError},
    term::{Term, Value},
    trie::{Classifier, ClassifierTrie, Node, NodeId, ROOT},
    workspace::{CondId, ExampleId, Workspace},
};

/// Output transform applied to the raw value of every condition.
///
/// The body reads the raw value as variable `0` and must produce a boolean.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    body: Term,
}

impl Template {
    pub fn new(body: Term) -> Self {
        Template { body }
    }

    pub fn apply(&self, raw: Value) -> Option<Value> {
        self.body.eval(&[raw])
    }

    pub fn instantiate(&self, cond: &Term) -> Term {
        self.body.substitute(0, cond)
    }
}

/// How a branch is emitted during extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BranchCons {
    /// `ite(c, then, else)`
    #[default]
    Ite,
    /// `(c ∧ then) ∨ (¬c ∧ else)`, only meaningful for boolean targets.
    BoolMux,
}

impl BranchCons {
    pub fn build(self, cond: Term, then: Term, els: Term) -> Term {
        match self {
            BranchCons::Ite => Term::ite(cond, then, els),
            BranchCons::BoolMux => {
                Term::or(Term::and(cond.clone(), then), Term::and(Term::not(cond), els))
            }
        }
    }
}

#[derive(Default)]
pub struct Separator {
    cache: IndexMap<(CondId, ExampleId), bool>,
    template: Option<Template>,
}

impl Separator {
    pub fn new(template: Option<Template>) -> Self {
        Separator { cache: IndexMap::new(), template }
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Number of memoized `(condition, example)` evaluations.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Evaluates `cond` on the point of `e`, after the template if any.
    pub fn compute_cond(&mut self, ws: &Workspace, cond: CondId, e: ExampleId) -> Result<bool> {
        if let Some(b) = self.cache.get(&(cond, e)) {
            return Ok(*b);
        }
        let args = ws.examples.args(e)?;
        let term = ws.conditions.term(cond);
        let mut res = term.eval(args);
        trace!("evaluate {} on {} {:?} gives {:?}", term, e, args, res);
        if let Some(templ) = &self.template {
            res = res.and_then(|raw| templ.apply(raw));
            trace!("...after template {:?}", res);
        }
        let b = res
            .and_then(|v| v.as_bool())
            .ok_or(UnifError::NonBooleanCondition { cond, example: e })?;
        self.cache.insert((cond, e), b);
        Ok(b)
    }

    /// Classifier reading level `i` as condition `levels[i]`.
    pub fn view<'a>(&'a mut self, ws: &'a Workspace, levels: &'a [CondId]) -> LevelView<'a> {
        LevelView { sep: self, ws, levels }
    }

    /// Builds a program from a trie whose classes are all consistent.
    ///
    /// Nodes whose condition was never exercised, or whose two sides yield
    /// the same program, collapse to their child. Returns `None` on an empty
    /// trie.
    pub fn extract_sol(
        &self,
        ws: &Workspace,
        cons: BranchCons,
        trie: &ClassifierTrie,
        levels: &[CondId],
        targets: &IndexMap<ExampleId, Term>,
    ) -> Result<Option<Term>> {
        self.build(ws, cons, trie, levels, targets, ROOT, 0)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        ws: &Workspace,
        cons: BranchCons,
        trie: &ClassifierTrie,
        levels: &[CondId],
        targets: &IndexMap<ExampleId, Term>,
        node: NodeId,
        level: usize,
    ) -> Result<Option<Term>> {
        match trie.node(node) {
            Node::Leaf(class) => match class.first() {
                Some(rep) => {
                    let t = targets.get(rep).ok_or(UnifError::MissingTarget(*rep))?;
                    trace!("......leaf {} builds {}", rep, t);
                    Ok(Some(t.clone()))
                }
                None => Ok(None),
            },
            Node::Branch { yes, no } => {
                let sub = |child: Option<NodeId>| match child {
                    Some(n) => self.build(ws, cons, trie, levels, targets, n, level + 1),
                    None => Ok(None),
                };
                let then = sub(yes)?;
                let els = sub(no)?;
                match (then, els) {
                    (Some(t), Some(e)) if t != e => {
                        let c = *levels
                            .get(level)
                            .ok_or(UnifError::LevelMismatch { level, depth: levels.len() })?;
                        let mut cond = ws.conditions.term(c).clone();
                        if let Some(templ) = &self.template {
                            cond = templ.instantiate(&cond);
                        }
                        trace!("......build branch on {}", cond);
                        Ok(Some(cons.build(cond, t, e)))
                    }
                    (Some(t), _) | (None, Some(t)) => {
                        trace!("......no need for condition at level {}", level);
                        Ok(Some(t))
                    }
                    (None, None) => Ok(None),
                }
            }
        }
    }
}

pub struct LevelView<'a> {
    sep: &'a mut Separator,
    ws: &'a Workspace,
    levels: &'a [CondId],
}

impl Classifier for LevelView<'_> {
    fn classify(&mut self, level: usize, example: ExampleId) -> Result<bool> {
        let cond = *self
            .levels
            .get(level)
            .ok_or(UnifError::LevelMismatch { level, depth: self.levels.len() })?;
        self.sep.compute_cond(self.ws, cond, example)
    }
}
