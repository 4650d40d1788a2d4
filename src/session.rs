//! Decision-tree construction for one synthesis target.
//!
//! A [`DecisionTreeSession`] persists across rounds and accumulates examples.
//! Every call to [`DecisionTreeSession::build_solution`] rebuilds the trie from
//! scratch in a [`Round`], resolving each separation conflict with the
//! enumerated condition of the matching level, in order. A conflict that
//! cannot be resolved is explained by the facts gathered on the way.

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, trace, warn};

use crate::{
    cegis::ModelOracle,
    entropy::{boolean_targets, EntropyRebuilder},
    error::{Result, UnifError},
    options::UnifOptions,
    pool::{ConditionPool, FamilyId},
    repair::ConstantRepair,
    resolve::{Attempt, Resolution, Resolver},
    retpool::ReturnPool,
    separator::{BranchCons, Separator, Template},
    term::Term,
    trail::{EnumVar, Fact, Guard, Lemma, Trail},
    trie::ClassifierTrie,
    workspace::{CondId, ExampleId, Workspace},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildResult {
    Program(Term),
    /// No program agrees with every example under the current conditions.
    /// Carries the explanation, except in independent mode.
    Conflict(Option<Lemma>),
}

impl BuildResult {
    pub fn program(&self) -> Option<&Term> {
        match self {
            BuildResult::Program(p) => Some(p),
            BuildResult::Conflict(_) => None,
        }
    }

    pub fn lemma(&self) -> Option<&Lemma> {
        match self {
            BuildResult::Conflict(l) => l.as_ref(),
            BuildResult::Program(_) => None,
        }
    }
}

/// State local to one `build_solution` call.
#[derive(Default)]
struct Round {
    trie: ClassifierTrie,
    // Condition installed at each trie level.
    levels: Vec<CondId>,
    trail: Trail,
    targets: IndexMap<ExampleId, Term>,
}

impl Round {
    fn target(&self, e: ExampleId) -> Result<&Term> {
        self.targets.get(&e).ok_or(UnifError::MissingTarget(e))
    }
}

pub struct DecisionTreeSession {
    options: UnifOptions,
    family: FamilyId,
    examples: Vec<ExampleId>,
    entailed: IndexSet<ExampleId>,
    slots: Vec<(EnumVar, CondId)>,
    guard: Option<Guard>,
    separator: Separator,
    returns: ReturnPool,
}

impl DecisionTreeSession {
    pub fn new(options: UnifOptions, family: FamilyId, template: Option<Template>) -> Self {
        DecisionTreeSession {
            options,
            family,
            examples: Vec::new(),
            entailed: IndexSet::new(),
            slots: Vec::new(),
            guard: None,
            separator: Separator::new(template),
            returns: ReturnPool::new(),
        }
    }

    pub fn options(&self) -> &UnifOptions {
        &self.options
    }

    pub fn family(&self) -> FamilyId {
        self.family
    }

    pub fn examples(&self) -> &[ExampleId] {
        &self.examples
    }

    pub fn guard(&self) -> Option<Guard> {
        self.guard
    }

    pub fn add_example(&mut self, e: ExampleId) {
        self.examples.push(e);
    }

    /// Marks `e` as entailed by the synthesis conjecture rather than inferred.
    pub fn set_entailed(&mut self, e: ExampleId) {
        if !self.entailed.insert(e) {
            warn!("{} was already entailed", e);
        }
    }

    /// Installs the enumerated condition values of the coming round.
    pub fn set_conditions(
        &mut self,
        pool: &mut ConditionPool,
        guard: Guard,
        enums: &[EnumVar],
        values: &[CondId],
    ) {
        debug_assert_eq!(enums.len(), values.len());
        self.guard = Some(guard);
        self.slots = enums.iter().copied().zip(values.iter().copied()).collect();
        if self.options.cond_independent || self.options.cond_pool {
            pool.merge(values);
        }
    }

    pub fn build_solution(
        &mut self,
        ws: &mut Workspace,
        pool: &ConditionPool,
        cons: BranchCons,
        oracle: &dyn ModelOracle,
        repair: &mut dyn ConstantRepair,
    ) -> Result<BuildResult> {
        info!(
            "build solution with {} examples and {} conditions",
            self.examples.len(),
            self.slots.len()
        );
        if self.examples.is_empty() {
            debug!("...no examples, using the default program");
            return Ok(BuildResult::Program(oracle.default_program()));
        }
        let mut round = Round::default();

        if self.options.cond_independent {
            if self.build_independent(ws, pool, oracle, &mut round)? {
                return Ok(BuildResult::Conflict(None));
            }
        } else if self.build_sequential(ws, pool, oracle, repair, &mut round)? {
            let lemma = round.trail.into_lemma();
            info!("...conflict is {}", lemma);
            return Ok(BuildResult::Conflict(Some(lemma)));
        }
        self.finish(ws, pool, cons, oracle, round)
    }

    fn record_target(
        &mut self,
        ws: &Workspace,
        oracle: &dyn ModelOracle,
        round: &mut Round,
        e: ExampleId,
    ) -> Result<()> {
        let args = ws.examples.args(e)?;
        let value = oracle.model_value(e, args);
        if self.options.ret_pool {
            self.returns.add(e, args, &value);
        }
        round.targets.insert(e, value);
        Ok(())
    }

    /// Places every example over all pooled conditions at once. Returns
    /// whether two examples with different targets collided.
    fn build_independent(
        &mut self,
        ws: &Workspace,
        pool: &ConditionPool,
        oracle: &dyn ModelOracle,
        round: &mut Round,
    ) -> Result<bool> {
        round.levels = pool.iter().collect();
        for i in 0..round.levels.len() {
            round.trie.add_classifier(&mut self.separator.view(ws, &round.levels), i)?;
        }
        let depth = round.levels.len();
        for e in self.examples.clone() {
            self.record_target(ws, oracle, round, e)?;
            let er = round.trie.add(e, &mut self.separator.view(ws, &round.levels), depth)?;
            if er == e || round.target(e)? == round.target(er)? {
                continue;
            }
            trace!("  ...can't separate {} from {}", e, er);
            return Ok(true);
        }
        Ok(false)
    }

    /// Places examples one at a time, resolving conflicts as they arise.
    /// Returns whether the round ended in an unresolved conflict.
    fn build_sequential(
        &mut self,
        ws: &mut Workspace,
        pool: &ConditionPool,
        oracle: &dyn ModelOracle,
        repair: &mut dyn ConstantRepair,
        round: &mut Round,
    ) -> Result<bool> {
        let mut level = 0;
        let examples = self.examples.clone();
        for (ix, &e) in examples.iter().enumerate() {
            self.record_target(ws, oracle, round, e)?;
            trace!("  add example ({}/{}): {} -> {}", ix + 1, examples.len(), e, round.target(e)?);
            let mut er = round.trie.add(e, &mut self.separator.view(ws, &round.levels), level)?;
            trace!("  ...separation class {}", er);
            if er == e {
                continue;
            }
            if round.target(e)? == round.target(er)? {
                // The merge must stay in the explanation even if a later
                // condition separates the two.
                let fact = if self.options.ret_pool {
                    Fact::EvalAgree { at: er, left: er, right: e, equal: true }
                } else {
                    Fact::SameClass(er, e)
                };
                trace!("  ...equal target values, add {}", fact);
                round.trail.push(fact);
                continue;
            }

            loop {
                if self.options.ret_pool {
                    trace!("  ...try merge {} with {}", e, er);
                    let class = round.trie.class_of(er).map(<[_]>::to_vec).unwrap_or_default();
                    if let Some(common) = self.returns.merge(ws, e, &class, &mut round.trail)? {
                        for m in class {
                            round.targets.insert(m, common.clone());
                        }
                        break;
                    }
                } else {
                    round.trail.push(Fact::Separated(e, er));
                }

                if !self.pick_condition(ws, pool, repair, round, level, (e, er))? {
                    match self.guard {
                        Some(g) => round.trail.push(Fact::Guard(g)),
                        None => warn!("conflict exhausted the conditions of an unguarded round"),
                    }
                    return Ok(true);
                }
                let prev = round.trie.class_of(er).map(<[_]>::to_vec).unwrap_or_default();
                round.trie.add_classifier(&mut self.separator.view(ws, &round.levels), level)?;
                level += 1;

                // `e` was last in its class, so heading a class means it is
                // separated from every former member.
                if round.trie.is_representative(e) {
                    trace!("  ...resolves separation conflict with all");
                    break;
                }
                let holds = |trie: &ClassifierTrie, rep: ExampleId| {
                    trie.class_of(rep).is_some_and(|class| class.contains(&e))
                };
                if holds(&round.trie, er) {
                    trace!("  ...does not resolve separation conflict with current");
                    return Ok(true);
                }
                trace!("  ...resolves separation conflict between {} and {}, but not all", e, er);
                er = prev
                    .iter()
                    .copied()
                    .find(|m| *m != er && *m != e && holds(&round.trie, *m))
                    .ok_or(UnifError::LostRepresentative { example: e, rep: er })?;
                trace!("  ...now try separating {} from {}", e, er);
            }
        }
        Ok(false)
    }

    fn pick_condition(
        &mut self,
        ws: &mut Workspace,
        pool: &ConditionPool,
        repair: &mut dyn ConstantRepair,
        round: &mut Round,
        level: usize,
        pair: (ExampleId, ExampleId),
    ) -> Result<bool> {
        let mut res = Resolution {
            ws,
            separator: &mut self.separator,
            pool,
            repair,
            slots: &self.slots,
            levels: &mut round.levels,
            trail: &mut round.trail,
            use_pool: self.options.cond_pool,
            repair_cond: self.options.repair_cond,
        };
        let mut placed = false;
        for resolver in Resolver::ORDER {
            match resolver.attempt(&mut res, level, pair)? {
                Attempt::Separates => return Ok(true),
                Attempt::Placed => placed = true,
                Attempt::Unavailable => {}
            }
        }
        Ok(placed)
    }

    fn finish(
        &mut self,
        ws: &Workspace,
        pool: &ConditionPool,
        cons: BranchCons,
        oracle: &dyn ModelOracle,
        round: Round,
    ) -> Result<BuildResult> {
        let Round { mut trie, mut levels, targets, .. } = round;
        if self.options.heuristic_dt {
            if boolean_targets(&targets) {
                let entailed = self.examples.iter().filter(|e| self.entailed.contains(*e)).count();
                debug!(
                    "...rebuild over {} entailed and {} inferred points",
                    entailed,
                    self.examples.len() - entailed
                );
                let conds: Vec<CondId> = pool.iter().collect();
                let fallback = levels.last().copied().or(pool.last());
                let rebuilt = EntropyRebuilder::new(&mut self.separator, ws, &targets).recompute(
                    &self.examples,
                    &conds,
                    fallback,
                )?;
                if let Some((t, l)) = rebuilt {
                    trie = t;
                    levels = l;
                }
            } else {
                debug!("...non-boolean targets, keeping the incremental tree");
            }
        }
        trace!("...ready to build solution from the tree");
        let program = match self.separator.extract_sol(ws, cons, &trie, &levels, &targets)? {
            Some(p) => p,
            None => oracle.default_program(),
        };
        info!("...solution is {}", program);
        Ok(BuildResult::Program(program))
    }
}
