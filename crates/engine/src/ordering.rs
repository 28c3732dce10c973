//! Dependency ordering for import
//!
//! Kahn's algorithm over the edges between nodes of one bundle. Among nodes
//! whose dependencies are all placed, the smallest goes next (for entities:
//! kind table order, then identifier), so the result never depends on input
//! order. Edges to nodes outside the input are ignored here; the import
//! pipeline checks those against the store.

use assetport_core::{AssetError, AssetResult, EntityRecord};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;

/// Indices of `records` in apply order (dependencies first)
pub fn order_records(records: &[EntityRecord]) -> AssetResult<Vec<usize>> {
    let nodes: Vec<_> = records
        .iter()
        .map(|r| (r.entity_ref(), r.dependencies()))
        .collect();
    dependency_order(&nodes)
}

/// Indices of `nodes` in apply order
///
/// Each node is `(id, dependencies)`.
///
/// # Errors
///
/// - `Validation` if two nodes share an id
/// - `CyclicDependency` naming the nodes of one cycle, first node repeated at
///   the end
pub fn dependency_order<N>(nodes: &[(N, Vec<N>)]) -> AssetResult<Vec<usize>>
where
    N: Ord + Hash + Display,
{
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, (id, _)) in nodes.iter().enumerate() {
        if index.insert(id, i).is_some() {
            return Err(AssetError::validation(
                id.to_string(),
                "entity appears more than once in the bundle",
            ));
        }
    }

    let deps: Vec<Vec<usize>> = nodes
        .iter()
        .map(|(_, ds)| {
            let mut resolved: Vec<usize> =
                ds.iter().filter_map(|d| index.get(d).copied()).collect();
            resolved.sort_unstable();
            resolved.dedup();
            resolved
        })
        .collect();

    let mut indegree: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, ds) in deps.iter().enumerate() {
        for &d in ds {
            dependents[d].push(i);
        }
    }

    let mut ready: BTreeSet<(&N, usize)> = indegree
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == 0)
        .map(|(i, _)| (&nodes[i].0, i))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some((_, i)) = ready.pop_first() {
        order.push(i);
        for &dependent in &dependents[i] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.insert((&nodes[dependent].0, dependent));
            }
        }
    }

    if order.len() < nodes.len() {
        return Err(AssetError::CyclicDependency {
            cycle: find_cycle(nodes, &deps, &indegree),
        });
    }
    Ok(order)
}

/// Walk unplaced nodes along unplaced dependencies until one repeats
///
/// Every unplaced node has at least one unplaced dependency, so the walk
/// always closes a cycle.
fn find_cycle<N>(nodes: &[(N, Vec<N>)], deps: &[Vec<usize>], indegree: &[usize]) -> Vec<String>
where
    N: Ord + Display,
{
    let unplaced = |i: usize| indegree[i] > 0;
    let by_node = |a: &usize, b: &usize| nodes[*a].0.cmp(&nodes[*b].0);
    let name = |i: usize| nodes[i].0.to_string();

    let Some(start) = (0..nodes.len()).filter(|&i| unplaced(i)).min_by(by_node) else {
        return Vec::new();
    };

    let mut path = Vec::new();
    let mut position = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&at) = position.get(&current) {
            let mut cycle: Vec<String> = path[at..].iter().map(|&i| name(i)).collect();
            cycle.push(name(current));
            return cycle;
        }
        position.insert(current, path.len());
        path.push(current);

        match deps[current]
            .iter()
            .copied()
            .filter(|&d| unplaced(d))
            .min_by(by_node)
        {
            Some(next) => current = next,
            None => return path.iter().map(|&i| name(i)).collect(),
        }
    }
}
