//! Node/edge model of the playback graph.
//!
//! The graph always owns one output node. Every other node is attached by
//! the pipeline and removed again by [`AudioGraph::detach_all`]. Chains are
//! linear: a node feeds at most one node and is fed by at most one node.

use serde::Serialize;
use std::fmt;

use super::effect::EffectSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Player,
    Effect { effect: EffectSpec },
    Output,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Effect { effect } => effect.unit_name(),
            Self::Output => "output",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} is not attached")]
    UnknownNode(NodeId),

    #[error("the output node cannot feed another node")]
    OutputHasNoOutlet,

    #[error("node {0} already feeds another node")]
    OutletInUse(NodeId),

    #[error("node {0} already has an input")]
    InletInUse(NodeId),

    #[error("cannot connect node {0} to itself")]
    SelfConnection(NodeId),
}

#[derive(Debug, Clone)]
pub struct AudioGraph {
    nodes: Vec<(NodeId, NodeKind)>,
    connections: Vec<(NodeId, NodeId)>,
    output: NodeId,
    next_id: usize,
}

impl AudioGraph {
    pub fn new() -> Self {
        let output = NodeId(0);
        Self {
            nodes: vec![(output, NodeKind::Output)],
            connections: Vec::new(),
            output,
            next_id: 1,
        }
    }

    pub fn output(&self) -> NodeId {
        self.output
    }

    pub fn attach(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push((id, kind));
        id
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.kind(from).ok_or(GraphError::UnknownNode(from))?;
        self.kind(to).ok_or(GraphError::UnknownNode(to))?;

        if from == to {
            return Err(GraphError::SelfConnection(from));
        }
        if from == self.output {
            return Err(GraphError::OutputHasNoOutlet);
        }
        if self.connections.iter().any(|&(f, _)| f == from) {
            return Err(GraphError::OutletInUse(from));
        }
        if self.connections.iter().any(|&(_, t)| t == to) {
            return Err(GraphError::InletInUse(to));
        }

        self.connections.push((from, to));
        Ok(())
    }

    /// Remove every node except the output, and all connections.
    pub fn detach_all(&mut self) {
        let output = self.output;
        self.nodes.retain(|(id, _)| *id == output);
        self.connections.clear();
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes
            .iter()
            .find(|(node, _)| *node == id)
            .map(|(_, kind)| kind)
    }

    /// Attached node count, output included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connections(&self) -> &[(NodeId, NodeId)] {
        &self.connections
    }

    /// Nodes from `from` to the output, following connections.
    ///
    /// `None` when the chain from `from` does not reach the output.
    pub fn path_to_output(&self, from: NodeId) -> Option<Vec<NodeId>> {
        self.kind(from)?;

        let mut path = vec![from];
        let mut current = from;
        while current != self.output {
            let (_, next) = self.connections.iter().find(|&&(f, _)| f == current)?;
            // Linear chains cannot revisit a node, but guard against a malformed graph
            if path.contains(next) {
                return None;
            }
            path.push(*next);
            current = *next;
        }
        Some(path)
    }

    /// Node kinds along the chain that starts at the first player.
    ///
    /// Only the output when no player is attached.
    pub fn topology(&self) -> Vec<NodeKind> {
        let player = self
            .nodes
            .iter()
            .find(|(_, kind)| *kind == NodeKind::Player)
            .map(|(id, _)| *id);

        let ids = match player {
            Some(player) => self.walk_from(player),
            None => vec![self.output],
        };

        ids.into_iter()
            .filter_map(|id| self.kind(id).cloned())
            .collect()
    }

    fn walk_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut ids = vec![start];
        let mut current = start;
        while let Some(&(_, next)) = self.connections.iter().find(|&&(f, _)| f == current) {
            if ids.contains(&next) {
                break;
            }
            ids.push(next);
            current = next;
        }
        ids
    }
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_only_has_output() {
        let graph = AudioGraph::new();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.topology(), vec![NodeKind::Output]);
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn linear_chain_reaches_output() {
        let mut graph = AudioGraph::new();
        let player = graph.attach(NodeKind::Player);
        let effect = graph.attach(NodeKind::Effect {
            effect: EffectSpec::PitchShift { cents: 1000.0 },
        });

        graph.connect(player, effect).unwrap();
        graph.connect(effect, graph.output()).unwrap();

        assert_eq!(
            graph.path_to_output(player),
            Some(vec![player, effect, graph.output()])
        );
        assert_eq!(graph.connections().len(), 2);
    }

    #[test]
    fn fan_out_and_fan_in_are_rejected() {
        let mut graph = AudioGraph::new();
        let player = graph.attach(NodeKind::Player);
        let a = graph.attach(NodeKind::Effect {
            effect: EffectSpec::PitchShift { cents: 100.0 },
        });
        let b = graph.attach(NodeKind::Effect {
            effect: EffectSpec::PitchShift { cents: -100.0 },
        });

        graph.connect(player, a).unwrap();
        assert_eq!(graph.connect(player, b), Err(GraphError::OutletInUse(player)));
        assert_eq!(graph.connect(b, a), Err(GraphError::InletInUse(a)));
        assert_eq!(
            graph.connect(graph.output(), b),
            Err(GraphError::OutputHasNoOutlet)
        );
    }

    #[test]
    fn detach_all_keeps_only_output() {
        let mut graph = AudioGraph::new();
        let player = graph.attach(NodeKind::Player);
        graph.connect(player, graph.output()).unwrap();

        graph.detach_all();

        assert_eq!(graph.node_count(), 1);
        assert!(graph.connections().is_empty());
        assert_eq!(
            graph.connect(player, graph.output()),
            Err(GraphError::UnknownNode(player))
        );
    }

    #[test]
    fn unconnected_player_has_no_path() {
        let mut graph = AudioGraph::new();
        let player = graph.attach(NodeKind::Player);
        assert_eq!(graph.path_to_output(player), None);
    }
}
