use std::fmt::Display;

use num_rational::BigRational;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub enum Sort {
    Boolean,
    Rational,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Variable(usize, Sort),
    Value(Value),
    Plus(Box<Term>, Box<Term>),
    Times(BigRational, Box<Term>),
    Eq(Box<Term>, Box<Term>),
    Lt(Box<Term>, Box<Term>),
    Conj(Box<Term>, Box<Term>),
    Neg(Box<Term>),
    Disj(Box<Term>, Box<Term>),
    Impl(Box<Term>, Box<Term>),
    Ite(Box<Term>, Box<Term>, Box<Term>),
}

impl Term {
    pub fn sort(&self) -> Sort {
        match self {
            Term::Variable(_, s) => *s,
            Term::Value(v) => v.sort(),
            Term::Plus(_, _) => Sort::Rational,
            Term::Times(_, _) => Sort::Rational,
            Term::Eq(_, _) => Sort::Boolean,
            Term::Lt(_, _) => Sort::Boolean,
            Term::Conj(_, _) => Sort::Boolean,
            Term::Neg(_) => Sort::Boolean,
            Term::Disj(_, _) => Sort::Boolean,
            Term::Impl(_, _) => Sort::Boolean,
            Term::Ite(_, t, _) => t.sort(),
        }
    }

    pub fn not(t: Term) -> Term {
        Term::Neg(Box::new(t))
    }

    pub fn true_() -> Self {
        Term::Value(Value::Bool(true))
    }

    pub fn false_() -> Self {
        Term::Value(Value::Bool(false))
    }

    pub fn var(ix: usize, sort: Sort) -> Self {
        Term::Variable(ix, sort)
    }

    /// Rational argument `ix`.
    pub fn rvar(ix: usize) -> Self {
        Term::Variable(ix, Sort::Rational)
    }

    pub fn val(v: Value) -> Self {
        Term::Value(v)
    }

    pub fn int(n: i64) -> Self {
        Term::Value(Value::rat(n, 1))
    }

    pub fn plus(a: Self, b: Self) -> Self {
        Term::Plus(Box::new(a), Box::new(b))
    }

    pub fn and(a: Self, b: Self) -> Self {
        Term::Conj(Box::new(a), Box::new(b))
    }

    pub fn or(a: Self, b: Self) -> Self {
        Term::Disj(Box::new(a), Box::new(b))
    }

    pub fn implies(a: Self, b: Self) -> Self {
        Term::Impl(Box::new(a), Box::new(b))
    }

    pub fn lt(a: Self, b: Self) -> Self {
        Term::Lt(Box::new(a), Box::new(b))
    }

    pub fn gt(a: Self, b: Self) -> Self {
        Term::lt(b, a)
    }

    pub fn eq_(a: Self, b: Self) -> Self {
        Term::Eq(Box::new(a), Box::new(b))
    }

    pub fn ite(c: Self, t: Self, e: Self) -> Self {
        Term::Ite(Box::new(c), Box::new(t), Box::new(e))
    }

    /// Evaluates the term on a concrete argument tuple.
    ///
    /// Returns `None` on a sort error or when the term mentions an argument
    /// position outside of `args`.
    pub fn eval(&self, args: &[Value]) -> Option<Value> {
        match self {
            Term::Variable(ix, sort) => {
                let v = args.get(*ix)?;
                if v.sort() != *sort {
                    return None;
                }
                Some(v.clone())
            }
            Term::Value(v) => Some(v.clone()),
            Term::Plus(l, r) => l.eval(args)?.add(r.eval(args)?),
            Term::Times(k, t) => match t.eval(args)? {
                Value::Rat(r) => Some(Value::Rat(r * k)),
                Value::Bool(_) => None,
            },
            Term::Eq(l, r) => {
                let (v1, v2) = (l.eval(args)?, r.eval(args)?);
                if v1.sort() != v2.sort() {
                    return None;
                }
                Some(Value::Bool(v1 == v2))
            }
            Term::Lt(l, r) => l.eval(args)?.lt(r.eval(args)?),
            Term::Conj(l, r) => {
                Some(Value::Bool(l.eval(args)?.as_bool()? && r.eval(args)?.as_bool()?))
            }
            Term::Disj(l, r) => {
                Some(Value::Bool(l.eval(args)?.as_bool()? || r.eval(args)?.as_bool()?))
            }
            Term::Impl(l, r) => {
                Some(Value::Bool(!l.eval(args)?.as_bool()? || r.eval(args)?.as_bool()?))
            }
            Term::Neg(t) => t.eval(args)?.negate(),
            Term::Ite(c, t, e) => {
                if c.eval(args)?.as_bool()? {
                    t.eval(args)
                } else {
                    e.eval(args)
                }
            }
        }
    }

    /// Rational literals of the term, in pre-order.
    pub fn constants(&self) -> Vec<BigRational> {
        let mut out = Vec::new();
        self.collect_constants(&mut out);
        out
    }

    fn collect_constants(&self, out: &mut Vec<BigRational>) {
        match self {
            Term::Variable(_, _) => {}
            Term::Value(Value::Rat(r)) => out.push(r.clone()),
            Term::Value(Value::Bool(_)) => {}
            Term::Times(_, t) | Term::Neg(t) => t.collect_constants(out),
            Term::Plus(l, r)
            | Term::Eq(l, r)
            | Term::Lt(l, r)
            | Term::Conj(l, r)
            | Term::Disj(l, r)
            | Term::Impl(l, r) => {
                l.collect_constants(out);
                r.collect_constants(out);
            }
            Term::Ite(c, t, e) => {
                c.collect_constants(out);
                t.collect_constants(out);
                e.collect_constants(out);
            }
        }
    }

    /// Replaces the rational literals of the term, in the order of [`Term::constants`].
    ///
    /// Literals beyond the end of `consts` are left untouched.
    pub fn with_constants(&self, consts: &[BigRational]) -> Term {
        let mut it = consts.iter();
        self.replace_constants(&mut it)
    }

    fn replace_constants<'a, I>(&self, it: &mut I) -> Term
    where
        I: Iterator<Item = &'a BigRational>,
    {
        match self {
            Term::Variable(_, _) | Term::Value(Value::Bool(_)) => self.clone(),
            Term::Value(Value::Rat(r)) => match it.next() {
                Some(k) => Term::Value(Value::Rat(k.clone())),
                None => Term::Value(Value::Rat(r.clone())),
            },
            Term::Times(k, t) => Term::Times(k.clone(), Box::new(t.replace_constants(it))),
            Term::Neg(t) => Term::Neg(Box::new(t.replace_constants(it))),
            Term::Plus(l, r) => {
                let l = l.replace_constants(it);
                Term::plus(l, r.replace_constants(it))
            }
            Term::Eq(l, r) => {
                let l = l.replace_constants(it);
                Term::eq_(l, r.replace_constants(it))
            }
            Term::Lt(l, r) => {
                let l = l.replace_constants(it);
                Term::lt(l, r.replace_constants(it))
            }
            Term::Conj(l, r) => {
                let l = l.replace_constants(it);
                Term::and(l, r.replace_constants(it))
            }
            Term::Disj(l, r) => {
                let l = l.replace_constants(it);
                Term::or(l, r.replace_constants(it))
            }
            Term::Impl(l, r) => {
                let l = l.replace_constants(it);
                Term::implies(l, r.replace_constants(it))
            }
            Term::Ite(c, t, e) => {
                let c = c.replace_constants(it);
                let t = t.replace_constants(it);
                Term::ite(c, t, e.replace_constants(it))
            }
        }
    }

    /// Replaces every occurrence of variable `ix` by `by`, whatever its sort.
    pub fn substitute(&self, ix: usize, by: &Term) -> Term {
        let sub = |t: &Term| Box::new(t.substitute(ix, by));
        match self {
            Term::Variable(v, _) if *v == ix => by.clone(),
            Term::Variable(_, _) | Term::Value(_) => self.clone(),
            Term::Plus(l, r) => Term::Plus(sub(l), sub(r)),
            Term::Times(k, t) => Term::Times(k.clone(), sub(t)),
            Term::Eq(l, r) => Term::Eq(sub(l), sub(r)),
            Term::Lt(l, r) => Term::Lt(sub(l), sub(r)),
            Term::Conj(l, r) => Term::Conj(sub(l), sub(r)),
            Term::Neg(t) => Term::Neg(sub(t)),
            Term::Disj(l, r) => Term::Disj(sub(l), sub(r)),
            Term::Impl(l, r) => Term::Impl(sub(l), sub(r)),
            Term::Ite(c, t, e) => Term::Ite(sub(c), sub(t), sub(e)),
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            Term::Variable(v, Sort::Boolean) => write!(f, "b{}", v),
            Term::Variable(v, Sort::Rational) => write!(f, "r{}", v),
            Term::Value(v) => write!(f, "{}", v),
            Term::Plus(l, r) => write!(f, "({} + {})", l, r),
            Term::Eq(l, r) => write!(f, "({} = {})", l, r),
            Term::Lt(l, r) => write!(f, "({} < {})", l, r),
            Term::Conj(l, r) => write!(f, "({} ∧ {})", l, r),
            Term::Neg(t) => write!(f, "¬({})", t),
            Term::Disj(l, r) => write!(f, "({} ∨ {})", l, r),
            Term::Impl(l, r) => write!(f, "({} → {})", l, r),
            Term::Times(k, r) => write!(f, "({} * {})", k, r),
            Term::Ite(c, t, e) => write!(f, "ite({}, {}, {})", c, t, e),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Rat(r) => write!(f, "{}", r),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Bool(bool),
    Rat(BigRational),
}

impl Value {
    pub fn sort(&self) -> Sort {
        match self {
            Value::Bool(_) => Sort::Boolean,
            Value::Rat(_) => Sort::Rational,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Rat(_) => None,
        }
    }

    pub fn as_rat(&self) -> Option<&BigRational> {
        match self {
            Value::Rat(r) => Some(r),
            Value::Bool(_) => None,
        }
    }

    pub fn lt(self, o: Self) -> Option<Self> {
        match (self, o) {
            (Value::Rat(a), Value::Rat(b)) => Some(Value::Bool(a < b)),
            _ => None,
        }
    }

    pub fn add(self, o: Self) -> Option<Self> {
        match (self, o) {
            (Value::Rat(a), Value::Rat(b)) => Some(Value::Rat(a + b)),
            _ => None,
        }
    }

    pub fn negate(&self) -> Option<Self> {
        self.as_bool().map(|b| Value::Bool(!b))
    }
}

// Smart constructors

impl Value {
    pub fn rat(a: i64, b: i64) -> Self {
        Value::Rat(BigRational::new(a.into(), b.into()))
    }

    pub fn int(n: i64) -> Self {
        Value::rat(n, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: i64) -> BigRational {
        BigRational::from_integer(n.into())
    }

    #[test]
    fn eval_threshold() {
        let c = Term::gt(Term::rvar(0), Term::int(1));
        assert_eq!(c.eval(&[Value::int(0), Value::int(0)]), Some(Value::Bool(false)));
        assert_eq!(c.eval(&[Value::int(2), Value::int(0)]), Some(Value::Bool(true)));
    }

    #[test]
    fn eval_rejects_ill_sorted() {
        let c = Term::and(Term::rvar(0), Term::true_());
        assert_eq!(c.eval(&[Value::int(1)]), None);
        assert_eq!(Term::rvar(3).eval(&[Value::int(1)]), None);
    }

    #[test]
    fn ite_picks_branch() {
        let t = Term::ite(Term::lt(Term::rvar(0), Term::int(0)), Term::int(-1), Term::int(1));
        assert_eq!(t.eval(&[Value::int(-5)]), Some(Value::int(-1)));
        assert_eq!(t.eval(&[Value::int(5)]), Some(Value::int(1)));
    }

    #[test]
    fn constants_are_replaced_in_order() {
        let t = Term::and(
            Term::lt(Term::int(1), Term::rvar(0)),
            Term::lt(Term::rvar(1), Term::int(7)),
        );
        assert_eq!(t.constants(), vec![k(1), k(7)]);
        let t2 = t.with_constants(&[k(3)]);
        assert_eq!(t2.constants(), vec![k(3), k(7)]);
    }

    #[test]
    fn substitute_template_variable() {
        let templ = Term::not(Term::var(0, Sort::Boolean));
        let inst = templ.substitute(0, &Term::lt(Term::rvar(0), Term::int(2)));
        assert_eq!(inst.eval(&[Value::int(1)]), Some(Value::Bool(false)));
        assert_eq!(format!("{}", inst), "¬((r0 < 2))");
    }
}
