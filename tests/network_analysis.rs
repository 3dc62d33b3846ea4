//! Network analysis tests on hand-built graphs.
//!
//! These tests check the graph metrics against values worked out by hand,
//! and the split between the analysis graph (strength > 0) and the display
//! graph (strength >= threshold).

use opinet::network::{
    betweenness_centrality, closeness_centrality, clustering_coefficient, connected_components,
    modularity, prepare_visualization_data, shortest_path_distance, to_dot,
};
use opinet::{Agent, ConnectionMatrix, NetworkAnalyzer};

fn agents(clusters: &[usize]) -> Vec<Agent> {
    clusters
        .iter()
        .enumerate()
        .map(|(id, &c)| Agent::new(id, vec![1.0, 0.0], c))
        .collect()
}

fn matrix(n: usize, edges: &[(usize, usize, f64)]) -> ConnectionMatrix {
    let mut m = ConnectionMatrix::new(n);
    for &(i, j, s) in edges {
        m.set(i, j, s);
    }
    m
}

/// Test two dense groups linked by one weak bridge
#[test]
fn test_bridge_between_communities() {
    // {0,1,2} and {3,4,5} fully connected, bridge 2-3
    let m = matrix(
        6,
        &[
            (0, 1, 0.9),
            (0, 2, 0.8),
            (1, 2, 0.7),
            (3, 4, 0.9),
            (3, 5, 0.8),
            (4, 5, 0.7),
            (2, 3, 0.05),
        ],
    );
    let labels = agents(&[0, 0, 0, 1, 1, 1]);

    let bc = betweenness_centrality(&m);
    // Bridge endpoints carry every cross-group path
    assert!(bc[2] > bc[0] && bc[3] > bc[5]);
    assert!((bc[2] - bc[3]).abs() < 1e-12);

    let cc = closeness_centrality(&m);
    assert!(cc[2] > cc[0]);

    assert!(modularity(&m, &labels).unwrap() > 0.3);
    assert_eq!(connected_components(&m).len(), 1);
    assert_eq!(shortest_path_distance(&m, 0, 5).unwrap(), Some(3));

    // The bridge is too weak to be displayed
    let display = prepare_visualization_data(&m, &labels, 0.5).unwrap();
    assert_eq!(display.links.len(), 6);
    assert!(!to_dot(&display).contains("2 -- 3"));
}

/// Test a triangle with a pendant node
#[test]
fn test_triangle_with_pendant() {
    let m = matrix(4, &[(0, 1, 0.5), (1, 2, 0.5), (0, 2, 0.5), (2, 3, 0.5)]);
    // Local coefficients: 1, 1, 1/3, 0, averaged over all four nodes
    let expected = (1.0 + 1.0 + 1.0 / 3.0) / 4.0;
    assert!((clustering_coefficient(&m) - expected).abs() < 1e-12);
}

/// Test disconnected graphs report unreachable pairs as None
#[test]
fn test_disconnected_graph() {
    let m = matrix(5, &[(0, 1, 0.4), (2, 3, 0.4)]);
    assert_eq!(
        connected_components(&m),
        vec![vec![0, 1], vec![2, 3], vec![4]]
    );
    assert_eq!(shortest_path_distance(&m, 0, 3).unwrap(), None);
    assert_eq!(closeness_centrality(&m)[4], 0.0);
    assert!(shortest_path_distance(&m, 0, 9).is_err());
}

/// Test the analyzer summary agrees with the free functions
#[test]
fn test_analyzer_summary_consistency() {
    let m = matrix(5, &[(0, 1, 0.3), (1, 2, 0.6), (2, 3, 0.2), (3, 4, 0.9), (4, 0, 0.1)]);
    let labels = agents(&[0, 0, 1, 1, 1]);
    let analyzer = NetworkAnalyzer::new(&m, &labels).unwrap();
    let summary = analyzer.summary();

    assert_eq!(summary.edge_count, 5);
    assert_eq!(summary.component_count, 1);
    assert!((summary.density - 0.5).abs() < 1e-12);
    assert!((summary.clustering_coefficient - clustering_coefficient(&m)).abs() < 1e-12);
    assert!((summary.modularity - modularity(&m, &labels).unwrap()).abs() < 1e-12);

    // A 5-cycle is vertex-transitive: every agent scores the same
    let bc = analyzer.betweenness_centrality();
    assert!(bc.iter().all(|&b| (b - bc[0]).abs() < 1e-12));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["node_count"], 5);
    assert_eq!(json["top_degree"].as_array().unwrap().len(), 5);
}
