use crate::query::formula::Formula;
use arbordb_primitives::PrimaryKey;
use std::{fmt, rc::Rc};

///
/// TraversalPredicate
///
/// Controls output scope: a node for which the predicate returns false is
/// not emitted and neither is anything below it. Scope is orthogonal to
/// visibility — see [`FilteringPredicate`].
///

#[derive(Clone)]
pub struct TraversalPredicate {
    inner: Rc<dyn Fn(PrimaryKey, u32, i32) -> bool>,
}

impl TraversalPredicate {
    /// The default scope: never stop.
    #[must_use]
    pub fn never_stop() -> Self {
        Self::from_fn(|_, _, _| true)
    }

    #[must_use]
    pub fn from_fn(test: impl Fn(PrimaryKey, u32, i32) -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(test),
        }
    }

    /// Continue while the compensated distance from the traversal origin is
    /// at most `max`.
    #[must_use]
    pub fn distance_within(max: u32) -> Self {
        let max = i32::try_from(max).unwrap_or(i32::MAX);
        Self::from_fn(move |_, _, distance| distance <= max)
    }

    /// Continue while the absolute tree level is at most `max`.
    #[must_use]
    pub fn level_within(max: u32) -> Self {
        Self::from_fn(move |_, level, _| level <= max)
    }

    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let a = self.clone();
        let b = other.clone();
        Self::from_fn(move |pk, level, distance| a.test(pk, level, distance) && b.test(pk, level, distance))
    }

    #[must_use]
    pub fn test(&self, node: PrimaryKey, level: u32, distance: i32) -> bool {
        (self.inner)(node, level, distance)
    }
}

impl fmt::Debug for TraversalPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TraversalPredicate")
    }
}

///
/// FilteringPredicate
///
/// Controls node visibility: whether a node counts toward aggregates at
/// all. May carry an associated formula (lazily computed id set); AND
/// composition intersects the formulas of both sides when both are present
/// and keeps whichever exists otherwise.
///

#[derive(Clone)]
pub struct FilteringPredicate {
    inner: Rc<FilterInner>,
}

struct FilterInner {
    test: FilterTest,
    formula: Option<Formula>,
}

enum FilterTest {
    AcceptAll,
    FormulaMembership,
    Custom(Box<dyn Fn(PrimaryKey) -> bool>),
    Excluding(PrimaryKey),
    ExcludingSet(Formula),
    And(FilteringPredicate, FilteringPredicate),
}

impl FilteringPredicate {
    #[must_use]
    pub fn accept_all() -> Self {
        Self::from_parts(FilterTest::AcceptAll, None)
    }

    /// Membership in a lazily computed id set (e.g. the locale-visibility
    /// set). The formula is exposed for merge composition.
    #[must_use]
    pub fn from_formula(formula: Formula) -> Self {
        Self::from_parts(FilterTest::FormulaMembership, Some(formula))
    }

    #[must_use]
    pub fn from_fn(test: impl Fn(PrimaryKey) -> bool + 'static) -> Self {
        Self::from_parts(FilterTest::Custom(Box::new(test)), None)
    }

    /// Single-node exclusion (pivot exclusion for sibling traversals).
    #[must_use]
    pub fn excluding(node: PrimaryKey) -> Self {
        Self::from_parts(FilterTest::Excluding(node), None)
    }

    /// Exclusion of a whole id set (excluded subtree roots).
    #[must_use]
    pub fn excluding_set(nodes: Formula) -> Self {
        Self::from_parts(FilterTest::ExcludingSet(nodes), None)
    }

    fn from_parts(test: FilterTest, formula: Option<Formula>) -> Self {
        Self {
            inner: Rc::new(FilterInner { test, formula }),
        }
    }

    /// Logical AND of both predicates; formulas merge with set-intersection
    /// semantics, preferring whichever side actually has one.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let formula = match (self.formula(), other.formula()) {
            (Some(a), Some(b)) => Some(a.intersect(b)),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };

        Self::from_parts(FilterTest::And(self.clone(), other.clone()), formula)
    }

    #[must_use]
    pub fn test(&self, node: PrimaryKey) -> bool {
        match &self.inner.test {
            FilterTest::AcceptAll => true,
            FilterTest::FormulaMembership => self
                .inner
                .formula
                .as_ref()
                .is_some_and(|f| f.compute().contains(node)),
            FilterTest::Custom(test) => test(node),
            FilterTest::Excluding(excluded) => node != *excluded,
            FilterTest::ExcludingSet(excluded) => !excluded.compute().contains(node),
            FilterTest::And(a, b) => a.test(node) && b.test(node),
        }
    }

    #[must_use]
    pub fn formula(&self) -> Option<&Formula> {
        self.inner.formula.as_ref()
    }

    /// Force any backing formulas once. Idempotent: formula memoization
    /// makes a second call a structural no-op.
    pub fn initialize(&self) {
        if let Some(formula) = &self.inner.formula {
            let _ = formula.compute();
        }

        match &self.inner.test {
            FilterTest::ExcludingSet(excluded) => {
                let _ = excluded.compute();
            }
            FilterTest::And(a, b) => {
                a.initialize();
                b.initialize();
            }
            _ => {}
        }
    }
}

impl fmt::Debug for FilteringPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilteringPredicate")
    }
}
