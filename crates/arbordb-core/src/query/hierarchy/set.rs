use crate::{
    error::HierarchyError,
    obs::{RequestFingerprint, StatisticsTraceEvent, StatisticsTraceSink},
    query::hierarchy::{
        accumulator::LevelInfo,
        computer::StatisticsComputer,
        context::QueryExecution,
        sorter::{self, NestedContextSorter},
    },
};
use arbordb_primitives::IdSet;
use std::{collections::BTreeMap, rc::Rc};

///
/// HierarchySet
///
/// All computers targeting one hierarchical entity type, batched so that
/// one global sort derived from the shared ranking can be applied across
/// their combined output trees instead of once per computer.
///

pub struct HierarchySet<E> {
    sorter: Option<Rc<dyn NestedContextSorter>>,
    computers: Vec<(String, StatisticsComputer<E>)>,
}

impl<E> HierarchySet<E> {
    pub(crate) fn new(sorter: Option<Rc<dyn NestedContextSorter>>) -> Self {
        Self {
            sorter,
            computers: Vec::new(),
        }
    }

    pub(crate) fn contains_output(&self, name: &str) -> bool {
        self.computers.iter().any(|(existing, _)| existing == name)
    }

    pub(crate) fn register(&mut self, name: String, computer: StatisticsComputer<E>) {
        self.computers.push((name, computer));
    }

    pub(crate) fn output_names(&self) -> impl Iterator<Item = &str> {
        self.computers.iter().map(|(name, _)| name.as_str())
    }

    /// Compute every registered output, then apply the single deferred
    /// sort pass over all of them.
    pub(crate) fn create_statistics(
        &self,
        execution: &QueryExecution,
        trace: Option<(&'static dyn StatisticsTraceSink, RequestFingerprint)>,
    ) -> Result<BTreeMap<String, Vec<LevelInfo<E>>>, HierarchyError> {
        let mut results = BTreeMap::new();

        for (name, computer) in &self.computers {
            let infos = computer.create_statistics(execution)?;

            if let Some((sink, fingerprint)) = trace {
                sink.on_event(StatisticsTraceEvent::Computer {
                    fingerprint,
                    kind: computer.trace_kind(),
                    trees: u32::try_from(infos.len()).unwrap_or(u32::MAX),
                });
            }

            results.insert(name.clone(), infos);
        }

        if let Some(sorter) = &self.sorter {
            let mut candidates = Vec::new();
            for infos in results.values() {
                sorter::collect_primary_keys(infos, &mut candidates);
            }

            if !candidates.is_empty() {
                let candidates: IdSet = candidates.into_iter().collect();
                let ranking = sorter::build_ranking(&sorter.sort(&candidates))?;

                for infos in results.values_mut() {
                    sorter::reorder_by_ranking(infos, &ranking);
                }
            }
        }

        Ok(results)
    }
}
