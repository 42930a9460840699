use crate::{
    error::{HierarchyError, QueryError},
    obs::{self, StatisticsTraceEvent, StatisticsTraceSink},
    query::hierarchy::{
        accumulator::LevelInfo, computer::StatisticsComputer, context::ProducerContext,
        context::QueryExecution, set::HierarchySet,
    },
};
use serde::Serialize;
use std::{collections::BTreeMap, rc::Rc};

///
/// Hierarchy
///
/// The fabricated extra result: named statistics trees for the queried
/// entity's own hierarchy and for each referenced hierarchical entity
/// type. Consumed downstream by response serialization.
///

#[derive(Debug, Serialize)]
pub struct Hierarchy<E> {
    pub self_hierarchy: BTreeMap<String, Vec<LevelInfo<E>>>,
    pub reference_hierarchy: BTreeMap<String, BTreeMap<String, Vec<LevelInfo<E>>>>,
}

impl<E> Hierarchy<E> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.self_hierarchy.is_empty() && self.reference_hierarchy.is_empty()
    }
}

///
/// StatisticsProducer
///
/// Top-level orchestrator. Owns the scoping discipline for
/// [`ProducerContext`]: a context is moved into the scope, every
/// registration inside runs against it, and it is dropped when the scope
/// closes. Opening a scope inside an open scope is a usage error naming
/// the offending constraint.
///

pub struct StatisticsProducer<E> {
    context: Option<Rc<ProducerContext<E>>>,
    self_set: Option<HierarchySet<E>>,
    reference_sets: BTreeMap<String, HierarchySet<E>>,
    trace_sink: Option<&'static dyn StatisticsTraceSink>,
}

impl<E> Default for StatisticsProducer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> StatisticsProducer<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            context: None,
            self_set: None,
            reference_sets: BTreeMap::new(),
            trace_sink: None,
        }
    }

    #[must_use]
    pub const fn with_trace_sink(mut self, sink: &'static dyn StatisticsTraceSink) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Open the scope for `context` and run `body` inside it. The context
    /// is dropped when the scope closes, whatever `body` returns.
    pub fn execute_within_scope<R>(
        &mut self,
        context: ProducerContext<E>,
        body: impl FnOnce(&mut Self) -> Result<R, HierarchyError>,
    ) -> Result<R, HierarchyError> {
        if self.context.is_some() {
            return Err(QueryError::NestedHierarchyScope {
                constraint: context.constraint_name(),
            }
            .into());
        }

        self.context = Some(Rc::new(context));
        let result = body(self);
        self.context = None;

        result
    }

    /// The context of the currently open scope.
    pub fn context(&self) -> Result<Rc<ProducerContext<E>>, QueryError> {
        self.context
            .clone()
            .ok_or(QueryError::MissingHierarchyScope {
                operation: "context access",
            })
    }

    /// Register a computer under a scope-unique output name. The computer
    /// joins the hierarchy set of the scope's target entity type.
    pub fn register_computer(
        &mut self,
        output_name: impl Into<String>,
        computer: StatisticsComputer<E>,
    ) -> Result<(), QueryError> {
        let output_name = output_name.into();
        let context = self
            .context
            .as_ref()
            .ok_or(QueryError::MissingHierarchyScope {
                operation: "computer registration",
            })?;

        let set = match context.reference_name() {
            None => {
                let sorter = context.sorter();
                self.self_set.get_or_insert_with(|| HierarchySet::new(sorter))
            }
            Some(reference) => {
                let sorter = context.sorter();
                self.reference_sets
                    .entry(reference.to_string())
                    .or_insert_with(|| HierarchySet::new(sorter))
            }
        };

        if set.contains_output(&output_name) {
            return Err(QueryError::DuplicateOutputName { name: output_name });
        }

        set.register(output_name, computer);
        Ok(())
    }

    /// Fabricate the final statistics maps. Fails fast when called while a
    /// scope is still open.
    pub fn fabricate(&self, execution: &QueryExecution) -> Result<Hierarchy<E>, HierarchyError> {
        if self.context.is_some() {
            return Err(QueryError::ScopeStillOpen.into());
        }

        let fingerprint = obs::trace::request_fingerprint(
            self.self_set
                .iter()
                .flat_map(HierarchySet::output_names),
            self.reference_sets.keys().map(String::as_str),
        );
        let trace = self.trace_sink.map(|sink| (sink, fingerprint));

        if let Some(sink) = self.trace_sink {
            sink.on_event(StatisticsTraceEvent::Start {
                fingerprint,
                outputs: self.output_count(),
            });
        }

        let result = self.fabricate_inner(execution, trace);

        match (&result, self.trace_sink) {
            (Ok(_), Some(sink)) => {
                sink.on_event(StatisticsTraceEvent::Finish {
                    fingerprint,
                    outputs: self.output_count(),
                });
            }
            (Err(HierarchyError::Internal(err)), sink) => {
                obs::trace::emit_error(sink, fingerprint, err);
            }
            _ => {}
        }

        result
    }

    fn fabricate_inner(
        &self,
        execution: &QueryExecution,
        trace: Option<(&'static dyn StatisticsTraceSink, obs::RequestFingerprint)>,
    ) -> Result<Hierarchy<E>, HierarchyError> {
        let self_hierarchy = match &self.self_set {
            Some(set) => set.create_statistics(execution, trace)?,
            None => BTreeMap::new(),
        };

        let mut reference_hierarchy = BTreeMap::new();
        for (reference, set) in &self.reference_sets {
            reference_hierarchy.insert(reference.clone(), set.create_statistics(execution, trace)?);
        }

        Ok(Hierarchy {
            self_hierarchy,
            reference_hierarchy,
        })
    }

    fn output_count(&self) -> u32 {
        let self_outputs = self
            .self_set
            .iter()
            .flat_map(HierarchySet::output_names)
            .count();
        let reference_outputs: usize = self
            .reference_sets
            .values()
            .map(|set| set.output_names().count())
            .sum();

        u32::try_from(self_outputs + reference_outputs).unwrap_or(u32::MAX)
    }
}
