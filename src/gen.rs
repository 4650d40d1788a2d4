//! Random synthesis problems: a hidden boolean decision program over integer
//! thresholds and a grid of points to learn it from.

use rand::{rngs::StdRng, Rng};

use crate::term::{Term, Value};

#[derive(Clone, Debug)]
pub struct Params {
    pub arity: usize,
    pub points: usize,
    /// Coordinates and thresholds are drawn from `-range..=range`. Negative
    /// values count as zero.
    pub range: i64,
    pub depth: usize,
}

impl Default for Params {
    fn default() -> Self {
        Params { arity: 2, points: 12, range: 4, depth: 2 }
    }
}

#[derive(Clone, Debug)]
pub struct Instance {
    pub points: Vec<Vec<Value>>,
    pub reference: Term,
}

impl Instance {
    pub fn random(rng: &mut StdRng, params: &Params) -> Self {
        let arity = params.arity.max(1);
        let range = params.range.max(0);
        let points = (0..params.points)
            .map(|_| (0..arity).map(|_| Value::int(rng.gen_range(-range..=range))).collect())
            .collect();
        let reference = generate_program(rng, arity, range, params.depth);
        Instance { points, reference }
    }

    /// Target value of the reference program on every point.
    pub fn labels(&self) -> Vec<Option<Value>> {
        self.points.iter().map(|pt| self.reference.eval(pt)).collect()
    }
}

// Boolean decision program of at most `depth` nested threshold tests.
fn generate_program(rng: &mut StdRng, arity: usize, range: i64, depth: usize) -> Term {
    if depth == 0 || rng.gen_bool(0.25) {
        return Term::val(Value::Bool(rng.gen()));
    }
    let var = rng.gen_range(0..arity);
    let k = rng.gen_range(-range..=range + 1);
    let cond = Term::lt(Term::rvar(var), Term::int(k));
    let then = generate_program(rng, arity, range, depth - 1);
    let els = generate_program(rng, arity, range, depth - 1);
    if then == els {
        then
    } else {
        Term::ite(cond, then, els)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn generation_is_seeded() {
        let params = Params::default();
        let a = Instance::random(&mut StdRng::seed_from_u64(7), &params);
        let b = Instance::random(&mut StdRng::seed_from_u64(7), &params);
        assert_eq!(a.points, b.points);
        assert_eq!(a.reference, b.reference);
    }

    #[test]
    fn reference_labels_every_point() {
        let params = Params { arity: 3, points: 20, range: 2, depth: 3 };
        for seed in 0..10 {
            let inst = Instance::random(&mut StdRng::seed_from_u64(seed), &params);
            assert_eq!(inst.points.len(), 20);
            assert!(inst.points.iter().all(|pt| pt.len() == 3));
            assert!(inst.labels().iter().all(|v| matches!(v, Some(Value::Bool(_)))));
        }
    }

    #[test]
    fn negative_range_collapses_to_the_origin() {
        let params = Params { arity: 2, points: 5, range: -3, depth: 2 };
        for seed in 0..10 {
            let inst = Instance::random(&mut StdRng::seed_from_u64(seed), &params);
            assert!(inst.points.iter().flatten().all(|v| *v == Value::int(0)));
            assert!(inst.labels().iter().all(|v| v.is_some()));
        }
    }
}
