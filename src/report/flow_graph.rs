//! Layered preprocessing flow graph built from transition counts.
//!
//! Nodes sit on one horizontal layer per [`Stage`] (`y = -stage order`) and are
//! centred on `x = 0` within their layer. Edge weights are bucketed into
//! [`EdgeBand`]s that carry the stroke colour and width used by renderers.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::processing::aggregate::Pair;
use crate::pipeline::processing::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EdgeBand {
    UpTo5,
    UpTo10,
    UpTo15,
    UpTo20,
    UpTo30,
    UpTo35,
    Over35,
}

impl EdgeBand {
    pub const ALL: [EdgeBand; 7] = [
        EdgeBand::UpTo5,
        EdgeBand::UpTo10,
        EdgeBand::UpTo15,
        EdgeBand::UpTo20,
        EdgeBand::UpTo30,
        EdgeBand::UpTo35,
        EdgeBand::Over35,
    ];

    pub fn for_weight(weight: usize) -> Self {
        match weight {
            0..=5 => EdgeBand::UpTo5,
            6..=10 => EdgeBand::UpTo10,
            11..=15 => EdgeBand::UpTo15,
            16..=20 => EdgeBand::UpTo20,
            21..=30 => EdgeBand::UpTo30,
            31..=35 => EdgeBand::UpTo35,
            _ => EdgeBand::Over35,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            EdgeBand::UpTo5 => "#d3d3d3",
            EdgeBand::UpTo10 => "#696363",
            EdgeBand::UpTo15 => "#612943a9",
            EdgeBand::UpTo20 => "#022f81",
            EdgeBand::UpTo30 => "#460372",
            EdgeBand::UpTo35 => "#361c0a",
            EdgeBand::Over35 => "black",
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            EdgeBand::UpTo5 => 1.5,
            EdgeBand::UpTo10 => 2.0,
            EdgeBand::UpTo15 => 2.5,
            EdgeBand::UpTo20 => 3.0,
            EdgeBand::UpTo30 => 3.6,
            EdgeBand::UpTo35 => 4.0,
            EdgeBand::Over35 => 4.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EdgeBand::UpTo5 => "1-5 articles",
            EdgeBand::UpTo10 => "6-10 articles",
            EdgeBand::UpTo15 => "11-15 articles",
            EdgeBand::UpTo20 => "16-20 articles",
            EdgeBand::UpTo30 => "21-30 articles",
            EdgeBand::UpTo35 => "31-35 articles",
            EdgeBand::Over35 => "36+ articles",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub keyword: String,
    pub stage: String,
    pub color: String,
    /// In plus out edges; a self-loop counts twice
    pub degree: usize,
    pub size: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub weight: usize,
    pub color: &'static str,
    pub width: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    /// Nodes appear in first-mention order over the edges.
    pub fn from_transitions(transitions: &BTreeMap<Pair, usize>) -> Self {
        let mut order: Vec<&str> = Vec::new();
        let mut degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut edges = Vec::with_capacity(transitions.len());

        for ((from, to), weight) in transitions {
            for node in [from.as_str(), to.as_str()] {
                if !degree.contains_key(node) {
                    order.push(node);
                }
                *degree.entry(node).or_default() += 1;
            }
            let band = EdgeBand::for_weight(*weight);
            edges.push(FlowEdge {
                from: from.clone(),
                to: to.clone(),
                weight: *weight,
                color: band.color(),
                width: band.width(),
            });
        }

        let mut per_layer: BTreeMap<usize, usize> = BTreeMap::new();
        for node in &order {
            *per_layer.entry(Stage::classify(node).order()).or_default() += 1;
        }

        let mut placed: BTreeMap<usize, usize> = BTreeMap::new();
        let nodes = order
            .into_iter()
            .map(|keyword| {
                let stage = Stage::classify(keyword);
                let layer = stage.order();
                let slot = placed.entry(layer).or_default();
                let count = per_layer[&layer];
                let x = *slot as f64 - (count as f64 - 1.0) / 2.0;
                *slot += 1;
                let degree = degree[keyword];
                FlowNode {
                    keyword: keyword.to_string(),
                    stage: stage.label().to_string(),
                    color: stage.color().to_string(),
                    degree,
                    size: 300 + 200 * degree,
                    x,
                    y: -(layer as f64),
                }
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn node(&self, keyword: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.keyword == keyword)
    }

    pub fn write_nodes_csv(&self, path: &Path) -> Result<()> {
        write_records(path, &self.nodes)
    }

    pub fn write_edges_csv(&self, path: &Path) -> Result<()> {
        write_records(path, &self.edges)
    }

    /// Graphviz rendering with stage fill colours and banded edge strokes.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph preprocessing_flow {\n  rankdir=TB;\n  node [style=filled];\n");
        for node in &self.nodes {
            let _ = writeln!(
                dot,
                "  \"{}\" [fillcolor=\"{}\", pos=\"{},{}!\", tooltip=\"{}\"];",
                escape(&node.keyword),
                node.color,
                node.x,
                node.y,
                node.stage
            );
        }
        for edge in &self.edges {
            let _ = writeln!(
                dot,
                "  \"{}\" -> \"{}\" [label=\"{}\", color=\"{}\", penwidth={}];",
                escape(&edge.from),
                escape(&edge.to),
                edge.weight,
                edge.color,
                edge.width
            );
        }
        let bands: Vec<EdgeBand> = EdgeBand::ALL
            .into_iter()
            .filter(|band| self.edges.iter().any(|e| EdgeBand::for_weight(e.weight) == *band))
            .collect();
        if !bands.is_empty() {
            dot.push_str("  subgraph cluster_legend {\n    label=\"Transitions\";\n");
            for (i, band) in bands.iter().enumerate() {
                let _ = writeln!(
                    dot,
                    "    legend_{} [shape=plaintext, style=\"\", label=\"{}\", fontcolor=\"{}\"];",
                    i,
                    band.label(),
                    band.color()
                );
            }
            dot.push_str("  }\n");
        }
        dot.push_str("}\n");
        dot
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transitions(rows: &[(&str, &str, usize)]) -> BTreeMap<Pair, usize> {
        rows.iter()
            .map(|(a, b, n)| ((a.to_string(), b.to_string()), *n))
            .collect()
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(EdgeBand::for_weight(1), EdgeBand::UpTo5);
        assert_eq!(EdgeBand::for_weight(5), EdgeBand::UpTo5);
        assert_eq!(EdgeBand::for_weight(6), EdgeBand::UpTo10);
        assert_eq!(EdgeBand::for_weight(30), EdgeBand::UpTo30);
        assert_eq!(EdgeBand::for_weight(35), EdgeBand::UpTo35);
        assert_eq!(EdgeBand::for_weight(36), EdgeBand::Over35);
        assert_eq!(EdgeBand::Over35.color(), "black");
        assert_eq!(EdgeBand::ALL.len(), 7);
    }

    #[test]
    fn test_layout_layers_and_centres() {
        let graph = FlowGraph::from_transitions(&transitions(&[
            ("High-pass filter", "Low-pass filter", 3),
            ("Low-pass filter", "IC decomposition", 12),
            ("IC decomposition", "PSD", 40),
        ]));

        let hp = graph.node("High-pass filter").unwrap();
        let lp = graph.node("Low-pass filter").unwrap();
        assert_eq!(hp.y, -1.0);
        assert_eq!((hp.x, lp.x), (-0.5, 0.5));
        assert_eq!(lp.degree, 2);
        assert_eq!(lp.size, 700);

        let ica = graph.node("IC decomposition").unwrap();
        assert_eq!((ica.x, ica.y), (0.0, -3.0));
        assert_eq!(graph.node("PSD").unwrap().y, -5.0);

        let heavy = graph.edges.iter().find(|e| e.to == "PSD").unwrap();
        assert_eq!(heavy.width, 4.5);
    }

    #[test]
    fn test_unknown_keywords_land_on_raw_layer() {
        let graph = FlowGraph::from_transitions(&transitions(&[("Foobar", "Foobar", 1)]));
        let node = graph.node("Foobar").unwrap();
        assert_eq!(node.y, 0.0);
        assert_eq!(node.degree, 2);
        assert_eq!(node.stage, Stage::RawData.label());
    }

    #[test]
    fn test_exports() {
        let graph = FlowGraph::from_transitions(&transitions(&[("ICA \"v2\"", "PSD", 2)]));
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph preprocessing_flow {"));
        assert!(dot.contains(r#""ICA \"v2\"" -> "PSD""#));
        assert!(dot.contains("fillcolor=\"#3CB371\""));
        assert!(dot.contains("subgraph cluster_legend"));
        assert!(dot.contains("label=\"1-5 articles\""));
        assert!(!dot.contains("6-10 articles"));

        let dir = tempfile::tempdir().unwrap();
        let nodes = dir.path().join("nodes.csv");
        let edges = dir.path().join("edges.csv");
        graph.write_nodes_csv(&nodes).unwrap();
        graph.write_edges_csv(&edges).unwrap();
        let nodes = std::fs::read_to_string(nodes).unwrap();
        assert!(nodes.starts_with("keyword,stage,color,degree,size,x,y\n"));
        let edges = std::fs::read_to_string(edges).unwrap();
        assert!(edges.starts_with("from,to,weight,color,width\n"));
        assert!(edges.contains("PSD,2,#d3d3d3,1.5"));
    }
}
