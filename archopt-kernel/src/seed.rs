//! Données codées en dur : graphe initial, série de métriques des graphiques,
//! et noeud ciblé par l'heuristique "database".

use crate::graph::{Graph, GraphError, LinkType, NodeStatus, NodeType, Position, SystemLink, SystemNode};
use serde::Serialize;

/// Noeud passé à `healthy` quand une proposition "db"/"database" est appliquée.
///
/// Limitation connue : le ciblage repose sur le nom de la proposition, pas sur
/// les noeuds qu'elle touche réellement. Inventory DB est le seul noeud visé.
pub const DATABASE_TARGET_NODE: &str = "n3";

fn node(id: &str, label: &str, node_type: NodeType, status: NodeStatus, details: &str, x: f64, y: f64) -> SystemNode {
    SystemNode {
        id: id.to_string(),
        label: label.to_string(),
        node_type,
        status,
        details: details.to_string(),
        pos: Position { x, y },
    }
}

fn link(source: &str, target: &str, latency: f64, link_type: LinkType) -> SystemLink {
    SystemLink {
        source: source.to_string(),
        target: target.to_string(),
        latency,
        link_type,
    }
}

pub fn initial_nodes() -> Vec<SystemNode> {
    vec![
        node("n1", "Auth Monolith", NodeType::Service, NodeStatus::Legacy, "Node.js v12, Express, Sync Auth", 100.0, 100.0),
        node("n2", "User DB (Postgres)", NodeType::Database, NodeStatus::Healthy, "Customer Profiles, RBAC", 300.0, 50.0),
        node("n3", "Inventory DB (Mongo)", NodeType::Database, NodeStatus::Unoptimized, "Duplicate User Meta Data", 300.0, 200.0),
        node("n4", "Legacy SOAP API", NodeType::Api, NodeStatus::Bottleneck, "ERP Integration, 800ms Latency", 500.0, 100.0),
        node("n5", "Payment Gateway", NodeType::Api, NodeStatus::Healthy, "Stripe Integration", 500.0, 250.0),
        node("n6", "Analytics Pipeline", NodeType::Queue, NodeStatus::Legacy, "Batch processed nightly", 100.0, 250.0),
    ]
}

pub fn initial_links() -> Vec<SystemLink> {
    vec![
        link("n1", "n2", 15.0, LinkType::Sync),
        link("n1", "n3", 45.0, LinkType::Sync),
        link("n1", "n4", 850.0, LinkType::Legacy),
        link("n1", "n6", 2000.0, LinkType::Async),
        link("n4", "n5", 120.0, LinkType::Sync),
    ]
}

pub fn initial_graph() -> Result<Graph, GraphError> {
    Graph::new(initial_nodes(), initial_links())
}

/// Point de la série temporelle affichée par les deux vues graphiques
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub name: &'static str,
    pub latency: u32,
    pub cost: u32,
    pub ai_score: u32,
}

pub const SYSTEM_HEALTH_METRICS: [MetricSample; 4] = [
    MetricSample { name: "Jan", latency: 450, cost: 2400, ai_score: 30 },
    MetricSample { name: "Feb", latency: 420, cost: 2350, ai_score: 35 },
    MetricSample { name: "Mar", latency: 510, cost: 2600, ai_score: 32 },
    MetricSample { name: "Apr", latency: 380, cost: 2100, ai_score: 40 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_graph_is_valid() {
        let graph = initial_graph().unwrap();
        assert_eq!(graph.nodes().len(), 6);
        assert_eq!(graph.links().len(), 5);
        assert_eq!(graph.count_with_status(NodeStatus::Bottleneck), 1);
    }

    #[test]
    fn test_database_target_exists_and_starts_unhealthy() {
        let graph = initial_graph().unwrap();
        let target = graph.node(DATABASE_TARGET_NODE).unwrap();
        assert_eq!(target.node_type, NodeType::Database);
        assert_eq!(target.status, NodeStatus::Unoptimized);
    }

    #[test]
    fn test_metric_sample_wire_names() {
        let json = serde_json::to_value(&SYSTEM_HEALTH_METRICS[0]).unwrap();
        assert_eq!(json["aiScore"], 30);
        assert_eq!(json["name"], "Jan");
    }
}
