//! Connection matrix and graph exports.

use serde::Serialize;

use crate::error::Result;
use crate::model::ConnectionMatrix;
use crate::network::VisualizationData;

/// One pair of the expanded edge list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeRecord {
    /// Lower agent id
    pub source: usize,
    /// Higher agent id
    pub target: usize,
    /// Connection strength
    pub strength: f64,
}

/// CSV with a header row and a leading agent id column.
///
/// ```text
/// agent,0,1,2
/// 0,0,0.25,0.1
/// 1,0.25,0,0.8
/// 2,0.1,0.8,0
/// ```
pub fn matrix_to_csv(connections: &ConnectionMatrix) -> String {
    let n = connections.len();
    let mut out = String::from("agent");
    for j in 0..n {
        out.push_str(&format!(",{j}"));
    }
    out.push('\n');

    for (i, row) in connections.rows().iter().enumerate() {
        out.push_str(&i.to_string());
        for value in row {
            out.push_str(&format!(",{value}"));
        }
        out.push('\n');
    }
    out
}

/// Full symmetric matrix as a JSON array of rows.
pub fn matrix_to_json(connections: &ConnectionMatrix) -> Result<String> {
    Ok(serde_json::to_string_pretty(connections)?)
}

/// Every unordered pair `i < j`, zero-strength pairs included.
pub fn edge_list(connections: &ConnectionMatrix) -> Vec<EdgeRecord> {
    connections
        .edges_above(0.0)
        .into_iter()
        .map(|(source, target, strength)| EdgeRecord {
            source,
            target,
            strength,
        })
        .collect()
}

/// [`edge_list`] as JSON.
pub fn edge_list_json(connections: &ConnectionMatrix) -> Result<String> {
    Ok(serde_json::to_string_pretty(&edge_list(connections))?)
}

/// Display graph as JSON `{nodes, links}`.
pub fn visualization_json(data: &VisualizationData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConnectionMatrix {
        let mut m = ConnectionMatrix::new(3);
        m.set(0, 1, 0.25);
        m.set(1, 2, 0.75);
        m
    }

    #[test]
    fn test_csv_layout() {
        let csv = matrix_to_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "agent,0,1,2");
        assert_eq!(lines[1], "0,0,0.25,0");
        assert_eq!(lines[2], "1,0.25,0,0.75");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_json_matrix_is_symmetric_rows() {
        let json: Vec<Vec<f64>> = serde_json::from_str(&matrix_to_json(&sample()).unwrap()).unwrap();
        assert_eq!(json.len(), 3);
        assert_eq!(json[1][2], json[2][1]);
        assert_eq!(json[0][1], 0.25);
    }

    #[test]
    fn test_edge_list_covers_every_pair_once() {
        let edges = edge_list(&sample());
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|e| e.source < e.target));
        assert_eq!(
            edges[2],
            EdgeRecord {
                source: 1,
                target: 2,
                strength: 0.75
            }
        );

        let json: serde_json::Value = serde_json::from_str(&edge_list_json(&sample()).unwrap()).unwrap();
        assert_eq!(json[0]["strength"], 0.25);
    }
}
