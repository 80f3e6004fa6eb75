use crate::history::GenerationHistory;
use crate::record::Lineage;
use autoevo_data::SpeciesId;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;

/// A species in the phylogeny.
pub struct SpeciesNode {
    pub id: SpeciesId,
    pub name: String,
    /// Generation the species was first recorded in.
    pub first_generation: u32,
    pub peak_population: i64,
    /// Population in the latest generation, zero once extinct.
    pub population: i64,
}

/// Split tree of every species that ever appeared in a history.
pub struct SpeciesTree {
    pub graph: DiGraph<SpeciesNode, u32>,
    id_map: BTreeMap<SpeciesId, NodeIndex>,
}

impl Default for SpeciesTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesTree {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_map: BTreeMap::new(),
        }
    }

    /// Build the tree from recorded splits. Edges carry the split generation.
    pub fn from_history(history: &GenerationHistory) -> Self {
        let mut tree = Self::new();
        let mut splits = Vec::new();

        for (generation, record) in history.iter() {
            for (&id, species) in &record.species {
                let population = species.population();
                match tree.id_map.get(&id) {
                    Some(&idx) => {
                        let node = &mut tree.graph[idx];
                        node.peak_population = node.peak_population.max(population);
                    }
                    None => {
                        let name = species
                            .species()
                            .map_or_else(|| format!("Species {id}"), |s| s.name.clone());
                        let idx = tree.graph.add_node(SpeciesNode {
                            id,
                            name,
                            first_generation: generation,
                            peak_population: population,
                            population: 0,
                        });
                        tree.id_map.insert(id, idx);
                    }
                }
                if let Lineage::Split { from } = species.lineage() {
                    splits.push((from, id, generation));
                }
            }
        }

        if let Some(latest) = history.latest() {
            for (&id, species) in &latest.species {
                if let Some(&idx) = tree.id_map.get(&id) {
                    tree.graph[idx].population = species.population().max(0);
                }
            }
        }

        for (parent, child, generation) in splits {
            if let (Some(&p_idx), Some(&c_idx)) = (tree.id_map.get(&parent), tree.id_map.get(&child))
            {
                tree.graph.add_edge(p_idx, c_idx, generation);
            }
        }

        tree
    }

    pub fn node(&self, id: SpeciesId) -> Option<&SpeciesNode> {
        self.id_map.get(&id).map(|&idx| &self.graph[idx])
    }

    /// Direct descendants of `id`, in split order.
    pub fn children(&self, id: SpeciesId) -> Vec<SpeciesId> {
        let Some(&idx) = self.id_map.get(&id) else {
            return Vec::new();
        };
        let mut children: Vec<_> = self
            .graph
            .neighbors(idx)
            .map(|child| self.graph[child].id)
            .collect();
        children.sort_unstable();
        children
    }

    /// Export the tree to Graphviz DOT format.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph Phylogeny {\n");
        dot.push_str("  node [shape=box, style=filled, fontname=\"Arial\"];\n");

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let color = if node.population > 0 {
                "#e1f5fe"
            } else {
                "#eeeeee"
            };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{} (Gen {})\\nPeak: {}\", fillcolor=\"{}\"];\n",
                node.id, node.name, node.first_generation, node.peak_population, color
            ));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    self.graph[from].id, self.graph[to].id, self.graph[edge]
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }
}
