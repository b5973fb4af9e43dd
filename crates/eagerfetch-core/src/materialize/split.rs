//! Split-strategy materialization.
//!
//! One query fetches the root set; one further query per include path
//! fetches `(parent key, child)` pairs, merged client-side by an equi-match
//! on the relation keys. Per-path queries run sequentially so a single
//! connection is never multiplexed; the merge point is a barrier, so
//! emission order between paths is irrelevant.
//!
//! A child row whose parent key matches no root row is a data-consistency
//! fault (a race, or a faulty correlation filter) and is reported as
//! [`Error::OrphanedChild`], never silently dropped.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::Error;
use crate::plan::LoadPlan;
use crate::resolve::KeyResolver;
use crate::row::RowSource;
use crate::sql::SqlBuilder;
use crate::value::{Key, Value};

use super::{apply_group_pick, apply_pagination, extract_entity, EntityData, Materialized};

/// Materialize a plan with one root query plus one query per include path.
pub fn materialize_split<S: RowSource + ?Sized>(
    plan: &LoadPlan,
    source: &S,
) -> Result<Materialized, Error> {
    let builder = SqlBuilder::new(plan);

    let prepared = builder.split_root()?;
    let shape = prepared.shape.clone();
    let resolver = KeyResolver::new(&shape);

    let cursor = source.execute(&prepared.statement)?;
    let mut roots: Vec<EntityData> = Vec::new();
    for row in cursor {
        let row = row?;
        resolver.check_width(&row)?;
        let key = resolver.root_key(&row)?;
        roots.push(extract_entity(&shape.root, key, &row));
    }

    // Grouping must see the full root set, so when a group step is present
    // the builder leaves pagination out of the statement and both run here.
    if let Some(group) = &plan.group {
        apply_group_pick(&mut roots, group);
        if let Some(pagination) = &plan.pagination {
            apply_pagination(&mut roots, pagination);
        }
    }

    let mut children: HashMap<String, HashMap<Key, Vec<EntityData>>> = HashMap::new();
    // Entities per level, for correlating nested include paths.
    let mut levels: HashMap<String, Vec<EntityData>> = HashMap::new();
    levels.insert(String::new(), roots.clone());

    for include in &plan.includes {
        let parent_level = include.parent_path().unwrap_or("");
        let parents = levels.get(parent_level).map(|v| v.as_slice()).unwrap_or(&[]);

        let mut path_children: HashMap<Key, Vec<EntityData>> = HashMap::new();
        let mut level_entities: Vec<EntityData> = Vec::new();

        if parents.is_empty() {
            children.insert(include.path.clone(), path_children);
            levels.insert(include.path.clone(), level_entities);
            continue;
        }

        // Correlation key -> identities of the parents carrying it. The
        // relation key is usually the parent identity, but nothing requires
        // it to be unique across parents.
        let mut by_fk: HashMap<Value, Vec<Key>> = HashMap::new();
        let mut fk_values: Vec<Value> = Vec::new();
        for parent in parents {
            let fk = parent
                .value(&include.relation.from_key)
                .cloned()
                .unwrap_or(Value::Null);
            if fk.is_null() {
                continue;
            }
            let entry = by_fk.entry(fk.clone()).or_insert_with(|| {
                fk_values.push(fk);
                Vec::new()
            });
            entry.push(parent.key.clone());
        }

        let prepared = builder.split_child(include, &fk_values)?;
        let child_shape = prepared.shape.clone();
        let child_resolver = KeyResolver::new(&child_shape);
        let correlation_index = child_shape
            .column_index(None, &include.relation.to_key)
            .ok_or_else(|| {
                Error::InvalidPlan(format!(
                    "relation key '{}' not projected for path '{}'",
                    include.relation.to_key, include.path
                ))
            })?;

        let mut seen: HashSet<(Key, Key)> = HashSet::new();
        let mut level_seen: HashSet<Key> = HashSet::new();

        let cursor = source.execute(&prepared.statement)?;
        for row in cursor {
            let row = row?;
            child_resolver.check_width(&row)?;
            let child_key = child_resolver.root_key(&row)?;
            let correlation = row[correlation_index].clone();

            let parent_keys = by_fk.get(&correlation).ok_or_else(|| Error::OrphanedChild {
                path: include.path.clone(),
                parent_key: Key::single(correlation.clone()),
            })?;

            let child = extract_entity(&child_shape.root, child_key.clone(), &row);
            for parent_key in parent_keys {
                if seen.insert((parent_key.clone(), child_key.clone())) {
                    path_children
                        .entry(parent_key.clone())
                        .or_default()
                        .push(child.clone());
                }
            }
            if level_seen.insert(child_key) {
                level_entities.push(child);
            }
        }

        children.insert(include.path.clone(), path_children);
        levels.insert(include.path.clone(), level_entities);
    }

    debug!(
        roots = roots.len(),
        paths = plan.includes.len(),
        "materialized split query"
    );

    Ok(Materialized { roots, children })
}
