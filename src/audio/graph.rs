//! Signal routing as an explicit graph of typed processing nodes.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]; edges are a flat
//! connection list. Edges may only point forward (lower id to higher id), so
//! arena order is a valid processing order and the graph is acyclic by
//! construction. Dropping the graph tears down every filter and tap at once.

use super::{AnalysisTap, Biquad};
use crate::error::GraphError;

/// Index of a node in its graph's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Processing performed by a node
#[derive(Debug)]
pub enum NodeKind {
    /// Stereo input: output 0 = left, output 1 = right
    Source,
    /// Mono filter: input 0 -> output 0
    Filter(Biquad),
    /// Records input 0 into an analysis tap and passes it through
    Tap(AnalysisTap),
    /// Stereo output: input 0 = left, input 1 = right
    Destination,
}

impl NodeKind {
    fn inputs(&self) -> usize {
        match self {
            NodeKind::Source => 0,
            NodeKind::Filter(_) | NodeKind::Tap(_) => 1,
            NodeKind::Destination => 2,
        }
    }

    fn outputs(&self) -> usize {
        match self {
            NodeKind::Source => 2,
            NodeKind::Filter(_) | NodeKind::Tap(_) => 1,
            NodeKind::Destination => 0,
        }
    }
}

/// Directed edge from an output port to an input port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from: NodeId,
    pub output: usize,
    pub to: NodeId,
    pub input: usize,
}

/// Arena of nodes plus the edges between them
#[derive(Debug, Default)]
pub struct SignalGraph {
    nodes: Vec<NodeKind>,
    connections: Vec<Connection>,

    // Per-node scratch, reused across blocks
    inputs: Vec<[f32; 2]>,
    outputs: Vec<[f32; 2]>,
    tap_blocks: Vec<Vec<f32>>,
}

impl SignalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(kind);
        self.inputs.push([0.0; 2]);
        self.outputs.push([0.0; 2]);
        self.tap_blocks.push(Vec::new());
        id
    }

    pub fn connect(
        &mut self,
        from: NodeId,
        output: usize,
        to: NodeId,
        input: usize,
    ) -> Result<(), GraphError> {
        let from_node = self
            .nodes
            .get(from.0)
            .ok_or(GraphError::UnknownNode(from.0))?;
        let to_node = self.nodes.get(to.0).ok_or(GraphError::UnknownNode(to.0))?;

        if from.0 >= to.0 {
            return Err(GraphError::BackwardEdge {
                from: from.0,
                to: to.0,
            });
        }
        if output >= from_node.outputs() {
            return Err(GraphError::NoSuchPort {
                node: from.0,
                port: output,
            });
        }
        if input >= to_node.inputs() {
            return Err(GraphError::NoSuchPort {
                node: to.0,
                port: input,
            });
        }

        // Kept sorted by destination so processing can walk it once per frame
        let at = self.connections.partition_point(|c| c.to <= to);
        self.connections.insert(
            at,
            Connection {
                from,
                output,
                to,
                input,
            },
        );
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every analysis tap attached to the graph
    pub fn taps(&self) -> impl Iterator<Item = &AnalysisTap> {
        self.nodes.iter().filter_map(|node| match node {
            NodeKind::Tap(tap) => Some(tap),
            _ => None,
        })
    }

    pub fn filter_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, NodeKind::Filter(_)))
            .count()
    }

    /// Run one block of stereo frames through the graph.
    ///
    /// `output` receives what reaches the destination node(s); it must be at
    /// least as long as `input`. Taps are updated once per block.
    pub fn process(&mut self, input: &[[f32; 2]], output: &mut [[f32; 2]]) {
        for block in &mut self.tap_blocks {
            block.clear();
        }

        for (frame_in, frame_out) in input.iter().zip(output.iter_mut()) {
            *frame_out = [0.0; 2];
            self.inputs.fill([0.0; 2]);

            let mut edge = 0;
            for index in 0..self.nodes.len() {
                // Gather: edges into this node come from earlier nodes,
                // whose outputs are already computed for this frame
                while let Some(c) = self.connections.get(edge).filter(|c| c.to.0 == index) {
                    self.inputs[index][c.input] += self.outputs[c.from.0][c.output];
                    edge += 1;
                }

                let node_in = self.inputs[index];
                let node_out = match &mut self.nodes[index] {
                    NodeKind::Source => *frame_in,
                    NodeKind::Filter(filter) => [filter.process(node_in[0]), 0.0],
                    NodeKind::Tap(_) => {
                        self.tap_blocks[index].push(node_in[0]);
                        [node_in[0], 0.0]
                    }
                    NodeKind::Destination => {
                        frame_out[0] += node_in[0];
                        frame_out[1] += node_in[1];
                        [0.0; 2]
                    }
                };
                self.outputs[index] = node_out;
            }
        }

        for (node, block) in self.nodes.iter().zip(&self.tap_blocks) {
            if let NodeKind::Tap(tap) = node {
                tap.push_block(block);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::FilterKind;

    #[test]
    fn test_source_to_destination_passthrough() {
        let mut graph = SignalGraph::new();
        let source = graph.add_node(NodeKind::Source);
        let dest = graph.add_node(NodeKind::Destination);
        graph.connect(source, 0, dest, 0).unwrap();
        graph.connect(source, 1, dest, 1).unwrap();

        let input = [[0.25, -0.5], [1.0, 0.0]];
        let mut output = [[9.0; 2]; 2];
        graph.process(&input, &mut output);

        assert_eq!(output, input);
    }

    #[test]
    fn test_tap_records_one_channel() {
        let mut graph = SignalGraph::new();
        let source = graph.add_node(NodeKind::Source);
        let tap = AnalysisTap::new(4);
        let tap_node = graph.add_node(NodeKind::Tap(tap.clone()));
        graph.connect(source, 1, tap_node, 0).unwrap();

        let input = [[0.1, 0.2], [0.3, 0.4], [0.5, 0.6], [0.7, 0.8]];
        let mut output = [[0.0; 2]; 4];
        graph.process(&input, &mut output);

        assert_eq!(tap.snapshot(), vec![0.2, 0.4, 0.6, 0.8]);
        assert_eq!(output, [[0.0; 2]; 4]); // nothing reaches a destination
    }

    #[test]
    fn test_filter_chain_feeds_tap() {
        let mut graph = SignalGraph::new();
        let source = graph.add_node(NodeKind::Source);
        let filter = graph.add_node(NodeKind::Filter(Biquad::new(
            FilterKind::LowPass { cutoff_hz: 10.0 },
            48_000.0,
        )));
        let tap = AnalysisTap::new(8);
        let tap_node = graph.add_node(NodeKind::Tap(tap.clone()));
        graph.connect(source, 0, filter, 0).unwrap();
        graph.connect(filter, 0, tap_node, 0).unwrap();

        // Alternating full-scale signal is far above cutoff
        let input: Vec<[f32; 2]> = (0..8)
            .map(|i| if i % 2 == 0 { [1.0, 0.0] } else { [-1.0, 0.0] })
            .collect();
        let mut output = vec![[0.0; 2]; 8];
        graph.process(&input, &mut output);

        assert!(tap.snapshot().iter().all(|s| s.abs() < 0.01));
    }

    #[test]
    fn test_rejects_backward_edge() {
        let mut graph = SignalGraph::new();
        let dest = graph.add_node(NodeKind::Destination);
        let source = graph.add_node(NodeKind::Source);

        assert_eq!(
            graph.connect(source, 0, dest, 0),
            Err(GraphError::BackwardEdge { from: 1, to: 0 })
        );
    }

    #[test]
    fn test_rejects_bad_ports_and_nodes() {
        let mut graph = SignalGraph::new();
        let source = graph.add_node(NodeKind::Source);
        let tap = graph.add_node(NodeKind::Tap(AnalysisTap::new(2)));

        assert_eq!(
            graph.connect(source, 2, tap, 0),
            Err(GraphError::NoSuchPort { node: 0, port: 2 })
        );
        assert_eq!(
            graph.connect(source, 0, tap, 1),
            Err(GraphError::NoSuchPort { node: 1, port: 1 })
        );
        assert_eq!(
            graph.connect(source, 0, NodeId(7), 0),
            Err(GraphError::UnknownNode(7))
        );
    }
}
