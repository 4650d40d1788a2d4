use indexmap::IndexMap;
use log::{debug, info};

use crate::{
    cegis::ModelOracle,
    error::{Result, UnifError},
    options::UnifOptions,
    pool::{ConditionPool, FamilyId},
    repair::ConstantRepair,
    separator::{BranchCons, Template},
    session::{BuildResult, DecisionTreeSession},
    term::{Term, Value},
    trail::{EnumVar, Guard},
    workspace::{ExampleId, Workspace},
};

/// Decision-tree unification for several synthesis targets at once.
///
/// Targets fed by the same condition enumerator form a family and share one
/// condition pool.
#[derive(Default)]
pub struct Unifier {
    ws: Workspace,
    pools: IndexMap<FamilyId, ConditionPool>,
    sessions: Vec<DecisionTreeSession>,
}

impl Unifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.ws
    }

    pub fn pool(&self, family: FamilyId) -> Option<&ConditionPool> {
        self.pools.get(&family)
    }

    pub fn add_session(
        &mut self,
        options: UnifOptions,
        family: FamilyId,
        template: Option<Template>,
    ) -> usize {
        self.pools.entry(family).or_default();
        self.sessions.push(DecisionTreeSession::new(options, family, template));
        self.sessions.len() - 1
    }

    pub fn session(&self, id: usize) -> Result<&DecisionTreeSession> {
        self.sessions.get(id).ok_or(UnifError::UnknownSession(id))
    }

    fn session_mut(&mut self, id: usize) -> Result<&mut DecisionTreeSession> {
        self.sessions.get_mut(id).ok_or(UnifError::UnknownSession(id))
    }

    /// Registers a new point for session `id`.
    pub fn add_example(&mut self, id: usize, args: Vec<Value>) -> Result<ExampleId> {
        self.session(id)?;
        let e = self.ws.examples.add(args);
        debug!("session {} gets example {}", id, e);
        self.session_mut(id)?.add_example(e);
        Ok(e)
    }

    pub fn set_entailed(&mut self, id: usize, e: ExampleId) -> Result<()> {
        self.ws.examples.args(e)?;
        self.session_mut(id)?.set_entailed(e);
        Ok(())
    }

    pub fn set_conditions(
        &mut self,
        id: usize,
        guard: Guard,
        enums: &[EnumVar],
        values: &[Term],
    ) -> Result<()> {
        let ids: Vec<_> = values.iter().map(|t| self.ws.conditions.intern(t.clone())).collect();
        let session = self.sessions.get_mut(id).ok_or(UnifError::UnknownSession(id))?;
        let pool = self.pools.entry(session.family()).or_default();
        session.set_conditions(pool, guard, enums, &ids);
        Ok(())
    }

    pub fn build_solution(
        &mut self,
        id: usize,
        cons: BranchCons,
        oracle: &dyn ModelOracle,
        repair: &mut dyn ConstantRepair,
    ) -> Result<BuildResult> {
        let session = self.sessions.get_mut(id).ok_or(UnifError::UnknownSession(id))?;
        let pool = self.pools.entry(session.family()).or_default();
        session.build_solution(&mut self.ws, pool, cons, oracle, repair)
    }

    /// Builds every session, continuing past failures so that one call
    /// collects the lemmas of all targets.
    pub fn construct_solutions(
        &mut self,
        cons: BranchCons,
        oracle: &dyn ModelOracle,
        repair: &mut dyn ConstantRepair,
    ) -> Result<Vec<BuildResult>> {
        let mut out = Vec::with_capacity(self.sessions.len());
        for id in 0..self.sessions.len() {
            out.push(self.build_solution(id, cons, oracle, repair)?);
        }
        let failed = out.iter().filter(|r| r.program().is_none()).count();
        info!("constructed {} of {} solutions", out.len() - failed, out.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::NoRepair;

    struct Sign;

    impl ModelOracle for Sign {
        fn model_value(&self, _: ExampleId, args: &[Value]) -> Term {
            Term::val(Value::Bool(args[0] > Value::int(0)))
        }

        fn default_program(&self) -> Term {
            Term::false_()
        }
    }

    fn x_gt(k: i64) -> Term {
        Term::gt(Term::rvar(0), Term::int(k))
    }

    #[test]
    fn families_share_their_pool() {
        let options = UnifOptions { cond_pool: true, ..Default::default() };
        let mut unif = Unifier::new();
        let a = unif.add_session(options.clone(), FamilyId(0), None);
        let b = unif.add_session(options.clone(), FamilyId(0), None);
        let c = unif.add_session(options, FamilyId(1), None);
        unif.set_conditions(a, Guard(0), &[EnumVar(0)], &[x_gt(0)]).unwrap();
        unif.set_conditions(b, Guard(0), &[EnumVar(0)], &[x_gt(1)]).unwrap();
        unif.set_conditions(c, Guard(0), &[EnumVar(0)], &[x_gt(0)]).unwrap();
        assert_eq!(unif.pool(FamilyId(0)).map(|p| p.len()), Some(2));
        assert_eq!(unif.pool(FamilyId(1)).map(|p| p.len()), Some(1));
    }

    #[test]
    fn failures_do_not_stop_other_sessions() {
        let mut unif = Unifier::new();
        let a = unif.add_session(UnifOptions::default(), FamilyId(0), None);
        let b = unif.add_session(UnifOptions::default(), FamilyId(0), None);
        for x in [-1, 1] {
            unif.add_example(a, vec![Value::int(x)]).unwrap();
            unif.add_example(b, vec![Value::int(x)]).unwrap();
        }
        unif.set_conditions(a, Guard(0), &[], &[]).unwrap();
        unif.set_conditions(b, Guard(0), &[EnumVar(0)], &[x_gt(0)]).unwrap();

        let results = unif.construct_solutions(BranchCons::Ite, &Sign, &mut NoRepair).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].lemma().is_some());
        assert_eq!(results[1].program(), Some(&Term::ite(x_gt(0), Term::true_(), Term::false_())));
    }

    #[test]
    fn unknown_sessions_are_reported() {
        let mut unif = Unifier::new();
        assert_eq!(unif.add_example(3, vec![]).err(), Some(UnifError::UnknownSession(3)));
        assert!(unif.session(0).is_err());
    }
}
