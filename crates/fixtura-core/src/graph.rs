use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::{Domain, EntityType};

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub self_references: usize,
}

/// Report for FK dependency ordering.
///
/// Self-references are counted but never reported as cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<EntityType>>,
    pub cycle: Option<Vec<EntityType>>,
}

/// Build a deterministic FK dependency report for a domain; referenced types
/// come before the types referencing them.
pub fn build_fk_graph_report(domain: &Domain) -> FkGraphReport {
    let (graph, self_references) = build_adjacency(domain);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary {
        nodes,
        edges,
        self_references,
    };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(domain: &Domain) -> (BTreeMap<EntityType, BTreeSet<EntityType>>, usize) {
    let mut graph: BTreeMap<EntityType, BTreeSet<EntityType>> = BTreeMap::new();
    let mut self_references = 0;

    for definition in &domain.entities {
        let entity_type = &definition.entity_type;
        graph.entry(entity_type.clone()).or_default();

        for fk in &definition.foreign_keys {
            if fk.is_self_reference(entity_type) {
                self_references += 1;
                continue;
            }
            graph
                .entry(fk.referenced_type.clone())
                .or_default()
                .insert(entity_type.clone());
        }
    }

    (graph, self_references)
}

fn toposort(
    graph: &BTreeMap<EntityType, BTreeSet<EntityType>>,
) -> Result<Vec<EntityType>, Vec<EntityType>> {
    let mut indegree: BTreeMap<&EntityType, usize> = graph.keys().map(|node| (node, 0)).collect();

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&EntityType> = indegree
        .iter()
        .filter_map(|(node, count)| if *count == 0 { Some(*node) } else { None })
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());

        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target);
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes = indegree
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(node.clone()) } else { None })
            .collect();
        Err(cycle_nodes)
    }
}
