use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::record::{Content, LogRecord};

/// Directed follow graph: `source -> dest -> weight`, weight > 0 means follows.
///
/// A missing edge ("never followed") and a non-positive edge ("unfollowed")
/// are different things and callers rely on telling them apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustGraph {
    edges: BTreeMap<String, BTreeMap<String, i64>>,
}

/// Weight recorded for an active follow.
pub const FOLLOW_WEIGHT: i64 = 1;
/// Weight recorded for an explicit unfollow or block.
pub const UNFOLLOW_WEIGHT: i64 = -1;

impl TrustGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: &str, dest: &str, weight: i64) {
        self.edges
            .entry(source.to_string())
            .or_default()
            .insert(dest.to_string(), weight);
    }

    /// Registers `source` as a node even if it has no outgoing edges.
    pub fn add_node(&mut self, source: &str) {
        self.edges.entry(source.to_string()).or_default();
    }

    pub fn weight(&self, source: &str, dest: &str) -> Option<i64> {
        self.edges.get(source).and_then(|out| out.get(dest)).copied()
    }

    pub fn follows(&self, source: &str, dest: &str) -> bool {
        self.weight(source, dest).is_some_and(|w| w > 0)
    }

    /// Every identity appearing as a source or a destination.
    pub fn identities(&self) -> BTreeSet<&str> {
        let mut ids: BTreeSet<&str> = self.edges.keys().map(String::as_str).collect();
        for out in self.edges.values() {
            ids.extend(out.keys().map(String::as_str));
        }
        ids
    }

    /// Builds the graph from `contact` records; the newest record per
    /// (author, contact) pair decides the edge.
    pub fn from_contacts<'a>(records: impl IntoIterator<Item = &'a LogRecord>) -> Self {
        let mut latest: BTreeMap<(&str, &str), (i64, i64)> = BTreeMap::new();

        for record in records {
            let Content::Contact(contact) = record.content() else {
                continue;
            };
            let weight = if contact.blocking == Some(true) {
                UNFOLLOW_WEIGHT
            } else {
                match contact.following {
                    Some(true) => FOLLOW_WEIGHT,
                    Some(false) => UNFOLLOW_WEIGHT,
                    None => continue,
                }
            };
            let edge = (record.author(), contact.contact.as_str());
            match latest.get(&edge) {
                Some((ts, _)) if *ts > record.timestamp() => {}
                _ => {
                    latest.insert(edge, (record.timestamp(), weight));
                }
            }
        }

        let mut graph = TrustGraph::new();
        for ((source, dest), (_, weight)) in latest {
            graph.insert(source, dest, weight);
            graph.add_node(dest);
        }
        graph
    }
}

impl<const N: usize> From<[(&str, &[(&str, i64)]); N]> for TrustGraph {
    fn from(nodes: [(&str, &[(&str, i64)]); N]) -> Self {
        let mut graph = TrustGraph::new();
        for (source, edges) in nodes {
            graph.add_node(source);
            for (dest, weight) in edges {
                graph.insert(source, dest, *weight);
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact(key: &str, author: &str, ts: i64, target: &str, following: bool) -> LogRecord {
        serde_json::from_value(json!({
            "key": key,
            "value": {
                "author": author,
                "timestamp": ts,
                "content": { "type": "contact", "contact": target, "following": following }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_and_negative_edges_differ() {
        let graph = TrustGraph::from([("A", &[("B", -1)][..]), ("B", &[][..])]);
        assert_eq!(graph.weight("A", "B"), Some(-1));
        assert_eq!(graph.weight("B", "A"), None);
        assert!(!graph.follows("A", "B"));
    }

    #[test]
    fn test_latest_contact_wins() {
        let records = vec![
            contact("%2", "A", 20, "B", false),
            contact("%1", "A", 10, "B", true),
            contact("%3", "B", 5, "A", true),
        ];
        let graph = TrustGraph::from_contacts(&records);
        assert_eq!(graph.weight("A", "B"), Some(UNFOLLOW_WEIGHT));
        assert!(graph.follows("B", "A"));
    }

    #[test]
    fn test_identities_include_destinations() {
        let graph = TrustGraph::from([("A", &[("B", 1), ("C", 1)][..])]);
        let ids: Vec<&str> = graph.identities().into_iter().collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
