//! Joined-strategy materialization.
//!
//! A single flattened row stream duplicates the parent columns once per
//! child (fan-out). Rows are buffered, sorted with the plan's normalized
//! total order, and folded: each distinct parent identity appears exactly
//! once, each distinct child identity is appended to its parent's
//! accumulation exactly once. Row-level group-pick and pagination are
//! applied only after the deterministic sort, so identity-equivalent row
//! streams in any arrival order produce the same result.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::Error;
use crate::order::RowComparator;
use crate::plan::LoadPlan;
use crate::resolve::KeyResolver;
use crate::row::RowSource;
use crate::sql::SqlBuilder;
use crate::value::Key;

use super::{apply_group_pick, apply_pagination, extract_entity, EntityData, Materialized};

/// Materialize a plan with one joined query.
pub fn materialize_joined<S: RowSource + ?Sized>(
    plan: &LoadPlan,
    source: &S,
) -> Result<Materialized, Error> {
    let prepared = SqlBuilder::new(plan).joined()?;
    let shape = prepared.shape.clone();
    let resolver = KeyResolver::new(&shape);
    let comparator = RowComparator::new(&prepared.ordering, &shape)?;

    let cursor = source.execute(&prepared.statement)?;
    let mut rows = Vec::new();
    for row in cursor {
        let row = row?;
        resolver.check_width(&row)?;
        rows.push(row);
    }

    // Deterministic total order before any fold, group, or page step.
    rows.sort_by(|a, b| comparator.compare(a, b));

    let mut roots: Vec<EntityData> = Vec::new();
    let mut root_index: HashMap<Key, usize> = HashMap::new();
    let mut children: HashMap<String, HashMap<Key, Vec<EntityData>>> = HashMap::new();
    let mut seen: HashMap<String, HashSet<(Key, Key)>> = HashMap::new();

    for include in &plan.includes {
        children.insert(include.path.clone(), HashMap::new());
        seen.insert(include.path.clone(), HashSet::new());
    }

    for row in &rows {
        let root_key = resolver.root_key(row)?;
        if !root_index.contains_key(&root_key) {
            root_index.insert(root_key.clone(), roots.len());
            roots.push(extract_entity(&shape.root, root_key.clone(), row));
        }

        for include in &plan.includes {
            let child_key = resolver.child_key(row, &include.path)?;

            let parent_key = match include.parent_path() {
                None => root_key.clone(),
                Some(parent_path) => match resolver.child_key(row, parent_path)? {
                    Some(key) => key,
                    None => {
                        // A child cannot exist under an absent parent.
                        if child_key.is_some() {
                            return Err(Error::MalformedRow(format!(
                                "path '{}' has a child but its parent path '{}' is null",
                                include.path, parent_path
                            )));
                        }
                        continue;
                    }
                },
            };

            let Some(child_key) = child_key else {
                continue;
            };

            // Fan-out duplicates from sibling include paths collapse here.
            let path_seen = seen.entry(include.path.clone()).or_default();
            if path_seen.insert((parent_key.clone(), child_key.clone())) {
                let segment = shape.segment(Some(&include.path)).ok_or_else(|| {
                    Error::MalformedRow(format!("no segment for path '{}'", include.path))
                })?;
                children
                    .entry(include.path.clone())
                    .or_default()
                    .entry(parent_key)
                    .or_default()
                    .push(extract_entity(segment, child_key, row));
            }
        }
    }

    if let Some(group) = &plan.group {
        apply_group_pick(&mut roots, group);
    }
    if let Some(pagination) = &plan.pagination {
        apply_pagination(&mut roots, pagination);
    }

    debug!(
        rows = rows.len(),
        roots = roots.len(),
        "materialized joined query"
    );

    Ok(Materialized { roots, children })
}
