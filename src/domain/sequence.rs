//! Entry-point analysis of question sequences.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use generational_arena::Index;
use tracing::instrument;

use crate::domain::arena::AlgorithmGraph;
use crate::domain::entities::NodeId;
use crate::domain::error::DomainError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceAnalysis {
    /// IDs of the questions recorded directly as predecessors of the sequence
    pub predecessor_ids: BTreeSet<NodeId>,
    /// Members without predecessors, collected through nested sequences in
    /// member order, each listed once
    pub entry_points: Vec<Index>,
}

/// Analyse one question sequence.
///
/// Fails with `StaleIndex` when `sequence` is not in the graph, with
/// `NotASequence` for any other node kind and with `SequenceCycle` when a
/// sequence is re-entered while it is still being visited.
#[instrument(level = "trace", skip(graph))]
pub fn analyse(graph: &AlgorithmGraph, sequence: Index) -> Result<SequenceAnalysis, DomainError> {
    let node = graph
        .get(sequence)
        .ok_or(DomainError::StaleIndex(sequence))?;
    if !node.is_sequence() {
        return Err(DomainError::NotASequence(node.id));
    }

    let predecessor_ids = node
        .predecessors
        .iter()
        .map(|p| graph.node(p.question).id)
        .collect();

    let mut walk = EntryWalk {
        graph,
        visiting: HashSet::new(),
        seen: HashSet::new(),
        entry_points: Vec::new(),
    };
    walk.visit(sequence)?;

    Ok(SequenceAnalysis {
        predecessor_ids,
        entry_points: walk.entry_points,
    })
}

struct EntryWalk<'g> {
    graph: &'g AlgorithmGraph,
    /// Sequences on the current path
    visiting: HashSet<Index>,
    seen: HashSet<Index>,
    entry_points: Vec<Index>,
}

impl EntryWalk<'_> {
    fn visit(&mut self, sequence: Index) -> Result<(), DomainError> {
        let node = self.graph.node(sequence);
        if !self.visiting.insert(sequence) {
            return Err(DomainError::SequenceCycle(node.id));
        }
        for &member in node.sequence().unwrap_or_default() {
            let m = self.graph.node(member);
            if m.is_sequence() {
                self.visit(member)?;
            } else if m.is_question() && m.predecessors.is_empty() && self.seen.insert(member) {
                self.entry_points.push(member);
            }
        }
        self.visiting.remove(&sequence);
        Ok(())
    }
}

/// Per-diagram cache of sequence analyses.
#[derive(Debug)]
pub struct SequenceAnalyzer<'g> {
    graph: &'g AlgorithmGraph,
    cache: HashMap<Index, SequenceAnalysis>,
}

impl<'g> SequenceAnalyzer<'g> {
    pub fn new(graph: &'g AlgorithmGraph) -> Self {
        Self {
            graph,
            cache: HashMap::new(),
        }
    }

    pub fn analyse(&mut self, sequence: Index) -> Result<&SequenceAnalysis, DomainError> {
        match self.cache.entry(sequence) {
            Entry::Occupied(cached) => Ok(&*cached.into_mut()),
            Entry::Vacant(slot) => Ok(&*slot.insert(analyse(self.graph, sequence)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::GraphBuilder;
    use crate::domain::document::AlgorithmDocument;

    fn graph(json: &str) -> AlgorithmGraph {
        let doc: AlgorithmDocument = serde_json::from_str(json).unwrap();
        GraphBuilder::new().build(&doc).unwrap()
    }

    fn ids(graph: &AlgorithmGraph, idxs: &[Index]) -> Vec<NodeId> {
        idxs.iter().map(|&i| graph.node(i).id).collect()
    }

    #[test]
    fn given_nested_sequence_with_entry_question_when_analysing_outer_then_includes_it() {
        let g = graph(r#"{"nodes": [
            {"type": "question", "id": 1, "answers": [{"id": 11}]},
            {"type": "question", "id": 2, "answers": [{"id": 21}],
             "predecessors": [{"question": 1, "answer": 11}]},
            {"type": "question_sequence", "id": 10, "sequence": [1]},
            {"type": "question", "id": 3, "answers": [{"id": 31}]},
            {"type": "question_sequence", "id": 20, "sequence": [3, 2, 10],
             "predecessors": [{"question": 3, "answer": 31}]}
        ]}"#);

        let analysis = analyse(&g, g.index_of(20).unwrap()).unwrap();

        assert_eq!(ids(&g, &analysis.entry_points), vec![3, 1]);
        assert_eq!(analysis.predecessor_ids, BTreeSet::from([3]));
    }

    #[test]
    fn given_shared_nested_sequence_when_analysing_then_lists_entry_once() {
        let g = graph(r#"{"nodes": [
            {"type": "question", "id": 1},
            {"type": "question_sequence", "id": 10, "sequence": [1]},
            {"type": "question_sequence", "id": 11, "sequence": [10]},
            {"type": "question_sequence", "id": 20, "sequence": [10, 11]}
        ]}"#);

        let analysis = analyse(&g, g.index_of(20).unwrap()).unwrap();

        assert_eq!(ids(&g, &analysis.entry_points), vec![1]);
    }

    #[test]
    fn given_cyclic_containment_when_analysing_then_errors() {
        let g = graph(r#"{"nodes": [
            {"type": "question_sequence", "id": 10, "sequence": [11]},
            {"type": "question_sequence", "id": 11, "sequence": [10]}
        ]}"#);

        let err = analyse(&g, g.index_of(10).unwrap()).unwrap_err();

        assert_eq!(err, DomainError::SequenceCycle(10));
    }

    #[test]
    fn given_question_when_analysing_then_not_a_sequence() {
        let g = graph(r#"{"nodes": [{"type": "question", "id": 1}]}"#);

        let err = analyse(&g, g.index_of(1).unwrap()).unwrap_err();

        assert_eq!(err, DomainError::NotASequence(1));
    }

    #[test]
    fn given_index_from_other_graph_when_analysing_then_stale_index() {
        let small = graph(r#"{"nodes": [{"type": "question", "id": 1}]}"#);
        let large = graph(r#"{"nodes": [
            {"type": "question", "id": 1},
            {"type": "question", "id": 2},
            {"type": "question_sequence", "id": 10, "sequence": [1, 2]}
        ]}"#);
        let foreign = large.index_of(10).unwrap();

        let err = analyse(&small, foreign).unwrap_err();

        assert_eq!(err, DomainError::StaleIndex(foreign));
    }

    #[test]
    fn given_analyzer_when_called_twice_then_returns_cached_analysis() {
        let g = graph(r#"{"nodes": [
            {"type": "question", "id": 1},
            {"type": "question_sequence", "id": 10, "sequence": [1]}
        ]}"#);
        let mut analyzer = SequenceAnalyzer::new(&g);
        let idx = g.index_of(10).unwrap();

        let first = analyzer.analyse(idx).unwrap().clone();
        let second = analyzer.analyse(idx).unwrap();

        assert_eq!(&first, second);
    }
}
