use crate::{error::InternalError, query::hierarchy::accumulator::LevelInfo};
use arbordb_primitives::{IdSet, PrimaryKey};
use std::collections::BTreeMap;

///
/// NestedContextSorter
///
/// External collaborator producing one globally ranked primary-key
/// sequence for a candidate set. The sequence drives the single deferred
/// sort pass over all result trees of a hierarchy set.
///

pub trait NestedContextSorter {
    fn sort(&self, candidates: &IdSet) -> Vec<PrimaryKey>;
}

/// Collect every primary key appearing anywhere in the result trees.
pub(crate) fn collect_primary_keys<E>(infos: &[LevelInfo<E>], out: &mut Vec<PrimaryKey>) {
    for info in infos {
        out.push(info.primary_key);
        collect_primary_keys(&info.children, out);
    }
}

/// Turn a ranked sequence into a position lookup. A duplicate key in the
/// sequence is a sorter defect, not a user error.
pub(crate) fn build_ranking(
    sequence: &[PrimaryKey],
) -> Result<BTreeMap<PrimaryKey, u32>, InternalError> {
    let mut ranking = BTreeMap::new();

    for (position, &key) in sequence.iter().enumerate() {
        let position = u32::try_from(position).unwrap_or(u32::MAX);
        if ranking.insert(key, position).is_some() {
            return Err(InternalError::sorter_invariant(format!(
                "ranked sequence contains primary key {key} more than once"
            )));
        }
    }

    Ok(ranking)
}

/// Deeply reorder every children list (and the top-level list itself) by
/// ranked position. Keys missing from the ranking sort last, ascending, so
/// the pass stays deterministic and idempotent.
pub(crate) fn reorder_by_ranking<E>(
    infos: &mut Vec<LevelInfo<E>>,
    ranking: &BTreeMap<PrimaryKey, u32>,
) {
    infos.sort_by_key(|info| {
        (
            ranking.get(&info.primary_key).copied().unwrap_or(u32::MAX),
            info.primary_key,
        )
    });

    for info in infos {
        reorder_by_ranking(&mut info.children, ranking);
    }
}
