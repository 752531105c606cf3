/**
 * GRAPHE D'ARCHITECTURE - Noeuds (services, bases, APIs, queues) et liens dirigés
 *
 * RÔLE : Modèle de données feuille du kernel. Décrit le système analysé,
 * sérialisé tel quel dans le prompt d'analyse et servi au renderer.
 *
 * INTÉGRITÉ : vérifiée à l'ingestion (ids uniques, liens vers des noeuds
 * existants, latences finies et positives). `status` reste indicatif.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Database,
    Service,
    Api,
    Queue,
    AiLayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Healthy,
    Bottleneck,
    Legacy,
    Unoptimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Sync,
    Async,
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub status: NodeStatus,
    pub details: String,
    /// Mutée uniquement par le layout (drag côté renderer)
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLink {
    pub source: String,
    pub target: String,
    /// Millisecondes
    pub latency: f64,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("link {from} -> {target} references unknown node {missing}")]
    DanglingLink {
        from: String,
        target: String,
        missing: String,
    },
    #[error("link {from} -> {target} has invalid latency {latency}")]
    InvalidLatency {
        from: String,
        target: String,
        latency: f64,
    },
    #[error("unknown node: {0}")]
    UnknownNode(String),
}

/// Graphe validé. Les champs sont privés pour que toute mutation passe
/// par les méthodes qui préservent l'intégrité.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graph {
    nodes: Vec<SystemNode>,
    links: Vec<SystemLink>,
}

/// Forme brute reçue sur `PUT /graph`, avant validation
#[derive(Debug, Clone, Deserialize)]
pub struct GraphInput {
    pub nodes: Vec<SystemNode>,
    pub links: Vec<SystemLink>,
}

impl Graph {
    pub fn new(nodes: Vec<SystemNode>, links: Vec<SystemLink>) -> Result<Self, GraphError> {
        let mut ids = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        for link in &links {
            for endpoint in [&link.source, &link.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingLink {
                        from: link.source.clone(),
                        target: link.target.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            if !link.latency.is_finite() || link.latency < 0.0 {
                return Err(GraphError::InvalidLatency {
                    from: link.source.clone(),
                    target: link.target.clone(),
                    latency: link.latency,
                });
            }
        }

        Ok(Self { nodes, links })
    }

    pub fn nodes(&self) -> &[SystemNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SystemLink] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&SystemNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Met à jour le statut d'un noeud. Retourne false si l'id est inconnu.
    pub fn set_node_status(&mut self, id: &str, status: NodeStatus) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.status = status;
                true
            }
            None => false,
        }
    }

    /// Drag-to-reposition : ne touche que `pos`
    pub fn move_node(&mut self, id: &str, pos: Position) -> Result<&SystemNode, GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.pos = pos;
        Ok(node)
    }

    pub fn count_with_status(&self, status: NodeStatus) -> usize {
        self.nodes.iter().filter(|n| n.status == status).count()
    }
}

impl TryFrom<GraphInput> for Graph {
    type Error = GraphError;

    fn try_from(input: GraphInput) -> Result<Self, Self::Error> {
        Graph::new(input.nodes, input.links)
    }
}
