use arbordb_primitives::IdSet;
use std::{cell::OnceCell, fmt, rc::Rc};

///
/// Formula
///
/// Lazily computable id set. The underlying set is produced at most once
/// per formula instance and memoized; clones share the memo. Intersection
/// composes without forcing either side.
///

#[derive(Clone)]
pub struct Formula {
    inner: Rc<FormulaInner>,
}

struct FormulaInner {
    op: FormulaOp,
    memo: OnceCell<Rc<IdSet>>,
}

enum FormulaOp {
    Constant(Rc<IdSet>),
    Deferred(Box<dyn Fn() -> IdSet>),
    Intersect(Formula, Formula),
}

impl Formula {
    #[must_use]
    pub fn empty() -> Self {
        Self::constant(IdSet::new())
    }

    #[must_use]
    pub fn constant(set: IdSet) -> Self {
        Self::from_op(FormulaOp::Constant(Rc::new(set)))
    }

    /// Defer computation to `supplier`; invoked at most once.
    #[must_use]
    pub fn deferred(supplier: impl Fn() -> IdSet + 'static) -> Self {
        Self::from_op(FormulaOp::Deferred(Box::new(supplier)))
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self::from_op(FormulaOp::Intersect(self.clone(), other.clone()))
    }

    fn from_op(op: FormulaOp) -> Self {
        Self {
            inner: Rc::new(FormulaInner {
                op,
                memo: OnceCell::new(),
            }),
        }
    }

    /// Force and memoize the underlying set.
    #[must_use]
    pub fn compute(&self) -> Rc<IdSet> {
        self.inner
            .memo
            .get_or_init(|| match &self.inner.op {
                FormulaOp::Constant(set) => Rc::clone(set),
                FormulaOp::Deferred(supplier) => Rc::new(supplier()),
                FormulaOp::Intersect(a, b) => Rc::new(a.compute().intersect(&b.compute())),
            })
            .clone()
    }

    #[must_use]
    pub fn cardinality(&self) -> u32 {
        self.compute().cardinality()
    }

    /// Whether the set has already been forced.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.inner.memo.get().is_some()
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.op {
            FormulaOp::Constant(set) => f.debug_tuple("Constant").field(set).finish(),
            FormulaOp::Deferred(_) => f
                .debug_tuple("Deferred")
                .field(&self.inner.memo.get())
                .finish(),
            FormulaOp::Intersect(a, b) => f.debug_tuple("Intersect").field(a).field(b).finish(),
        }
    }
}
