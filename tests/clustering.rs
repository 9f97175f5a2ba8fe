mod common;

use common::{init_logging, sample_points};
use geocluster::compute::projection::{lat_y, lng_x, project_f32};
use geocluster::{
    ClusterError, ClusterId, ClusterNode, ClusterOptions, LatLngBounds, Point, PointFeature,
    Supercluster,
};

fn loaded(points: Vec<PointFeature<usize>>) -> Supercluster<usize> {
    let mut index = Supercluster::new(ClusterOptions::default()).expect("valid options");
    index.load(points).expect("Failed to load points");
    index
}

fn total_count<T, A>(nodes: &[ClusterNode<'_, T, A>]) -> usize {
    nodes.iter().map(ClusterNode::point_count).sum()
}

/// Every zoom level accounts for every input point exactly once.
#[test]
fn test_point_count_is_conserved() {
    init_logging();
    let index = loaded(sample_points(2_000, 7));

    for zoom in 0..=17 {
        let nodes = index
            .get_clusters(&LatLngBounds::world(), f64::from(zoom))
            .expect("Query failed");
        assert_eq!(total_count(&nodes), 2_000, "zoom {}", zoom);
    }
}

/// Coarser zooms never show more groups than finer ones.
#[test]
fn test_monotonic_coarsening() {
    let index = loaded(sample_points(2_000, 11));

    let counts: Vec<usize> = (0..=17)
        .map(|zoom| {
            index
                .get_clusters(&LatLngBounds::world(), f64::from(zoom))
                .expect("Query failed")
                .len()
        })
        .collect();

    for pair in counts.windows(2) {
        assert!(pair[0] <= pair[1], "counts by zoom: {:?}", counts);
    }
    assert_eq!(counts[17], 2_000);
}

/// Leaves of a cluster match its count, and their centroid is its position.
#[test]
fn test_drill_down_consistency() {
    let index = loaded(sample_points(1_000, 3));

    for zoom in [2.0, 5.0, 9.0] {
        for node in index.get_clusters(&LatLngBounds::world(), zoom).unwrap() {
            let ClusterNode::Cluster(cluster) = node else {
                continue;
            };

            let leaves = index
                .get_leaves(cluster.id, usize::MAX, 0)
                .expect("Cluster should have leaves");
            assert_eq!(leaves.len(), cluster.point_count);

            let (sx, sy) = leaves.iter().fold((0.0, 0.0), |(sx, sy), leaf| {
                let (x, y) = project_f32(&leaf.feature.position);
                (sx + x, sy + y)
            });
            let n = leaves.len() as f64;
            assert!((lng_x(cluster.position.x()) - sx / n).abs() < 1e-7);
            assert!((lat_y(cluster.position.y()) - sy / n).abs() < 1e-7);

            let children = index.get_children(cluster.id).unwrap();
            assert_eq!(total_count(&children), cluster.point_count);
        }
    }
}

/// Loading the same points twice builds identical indices.
#[test]
fn test_reload_is_deterministic() {
    let points = sample_points(1_500, 5);
    let mut index = loaded(points.clone());
    let other = loaded(points.clone());

    for zoom in 0..=17 {
        assert_eq!(index.index_at(zoom), other.index_at(zoom), "zoom {}", zoom);
    }

    let before = index.get_clusters(&LatLngBounds::world(), 4.0).unwrap().len();
    index.load(points).expect("Reload failed");
    for zoom in 0..=17 {
        assert_eq!(index.index_at(zoom), other.index_at(zoom), "zoom {}", zoom);
    }
    assert_eq!(
        index.get_clusters(&LatLngBounds::world(), 4.0).unwrap().len(),
        before
    );
}

#[test]
fn test_three_point_scenario() {
    let mut index = Supercluster::new(ClusterOptions::default()).unwrap();
    index
        .load(vec![
            PointFeature::new(Point::new(0.0, 0.0), 0),
            PointFeature::new(Point::new(0.0001, 0.0001), 1),
            PointFeature::new(Point::new(50.0, 50.0), 2),
        ])
        .unwrap();

    // The far point is about 0.21 world widths away, beyond the zoom 0 radius
    // of 40 / 512 = 0.078, so both zooms show the same two entities.
    for zoom in [16.0, 0.0] {
        let nodes = index.get_clusters(&LatLngBounds::world(), zoom).unwrap();
        assert_eq!(nodes.len(), 2, "zoom {}", zoom);

        let cluster = nodes.iter().find(|n| n.is_cluster()).unwrap();
        assert_eq!(cluster.point_count(), 2);
        let leaf = nodes.iter().find_map(ClusterNode::as_leaf).unwrap();
        assert_eq!(leaf.index, 2);
    }

    let nodes = index.get_clusters(&LatLngBounds::world(), 17.0).unwrap();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.iter().all(|n| !n.is_cluster()));

    let id = index
        .get_clusters(&LatLngBounds::world(), 0.0)
        .unwrap()
        .iter()
        .find_map(ClusterNode::cluster_id)
        .unwrap();
    assert_eq!(index.get_cluster_expansion_zoom(id).unwrap(), 17);
}

#[test]
fn test_empty_load() {
    init_logging();
    let mut index = Supercluster::<()>::new(ClusterOptions::default()).unwrap();
    index.load(Vec::new()).expect("Empty load should succeed");

    for zoom in [0.0, 8.5, 16.0, 25.0] {
        let nodes = index
            .get_clusters(&LatLngBounds::new(-10.0, -10.0, 10.0, 10.0), zoom)
            .unwrap();
        assert!(nodes.is_empty());
    }
    assert!(index.get_tile(0, 0, 0).is_none());
}

#[test]
fn test_query_before_load_is_empty() {
    let index = Supercluster::<()>::new(ClusterOptions::default()).unwrap();
    assert!(index.get_clusters(&LatLngBounds::world(), 3.0).unwrap().is_empty());
}

#[test]
fn test_unknown_cluster_id() {
    let index = loaded(sample_points(100, 1));

    for id in [ClusterId(5), ClusterId(12_345_678), ClusterId(100 + (3 << 5) + 30)] {
        let err = index.get_children(id).unwrap_err();
        assert!(matches!(err, ClusterError::NoSuchCluster(bad) if bad == id.get()));
        assert!(err.to_string().contains("No cluster with the specified id"));
    }
    assert!(index.get_leaves(ClusterId(5), 10, 0).is_err());
    assert!(index.get_cluster_expansion_zoom(ClusterId(5)).is_err());
}

#[test]
fn test_leaves_pagination() {
    let index = loaded(sample_points(600, 9));
    let nodes = index.get_clusters(&LatLngBounds::world(), 0.0).unwrap();
    let biggest = nodes
        .iter()
        .filter_map(|n| match n {
            ClusterNode::Cluster(c) => Some(*c),
            ClusterNode::Leaf(_) => None,
        })
        .max_by_key(|c| c.point_count)
        .unwrap();
    assert!(biggest.point_count > 20);

    let all: Vec<usize> = index
        .get_leaves(biggest.id, usize::MAX, 0)
        .unwrap()
        .iter()
        .map(|leaf| leaf.index)
        .collect();

    let mut paged = Vec::new();
    let mut offset = 0;
    loop {
        let page = index.get_leaves(biggest.id, 7, offset).unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= 7);
        offset += page.len();
        paged.extend(page.iter().map(|leaf| leaf.index));
    }
    assert_eq!(paged, all);
    assert!(index.get_leaves(biggest.id, 0, 0).unwrap().is_empty());
}

#[test]
fn test_antimeridian_queries() {
    let mut index = Supercluster::new(ClusterOptions::default()).unwrap();
    index
        .load(vec![
            PointFeature::new(Point::new(179.5, 0.0), "east"),
            PointFeature::new(Point::new(-179.5, 0.0), "west"),
            PointFeature::new(Point::new(0.0, 0.0), "middle"),
        ])
        .unwrap();

    let crossing = LatLngBounds::new(179.0, -10.0, -179.0, 10.0);
    let nodes = index.get_clusters(&crossing, 17.0).unwrap();
    let mut names: Vec<&str> = nodes
        .iter()
        .filter_map(|n| n.as_leaf().map(|leaf| leaf.feature.properties))
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["east", "west"]);

    let wide = LatLngBounds::new(-200.0, -10.0, 200.0, 10.0);
    assert_eq!(index.get_clusters(&wide, 17.0).unwrap().len(), 3);

    let shifted = LatLngBounds::new(179.0 + 360.0, -10.0, 181.0 + 360.0, 10.0);
    assert_eq!(index.get_clusters(&shifted, 17.0).unwrap().len(), 2);
}

#[test]
fn test_invalid_query_bounds() {
    let index = loaded(sample_points(10, 2));
    let inverted = LatLngBounds::new(0.0, 10.0, 10.0, -10.0);
    assert!(matches!(
        index.get_clusters(&inverted, 3.0),
        Err(ClusterError::InvalidInput(_))
    ));
}

#[test]
fn test_min_points() {
    let points = vec![
        PointFeature::new(Point::new(10.0, 10.0), 0),
        PointFeature::new(Point::new(10.001, 10.0), 1),
    ];

    let mut index = Supercluster::new(ClusterOptions::default().with_min_points(3)).unwrap();
    index.load(points.clone()).unwrap();
    assert_eq!(index.get_clusters(&LatLngBounds::world(), 0.0).unwrap().len(), 2);

    let mut index = Supercluster::new(ClusterOptions::default()).unwrap();
    index.load(points).unwrap();
    assert_eq!(index.get_clusters(&LatLngBounds::world(), 0.0).unwrap().len(), 1);
}

#[test]
fn test_aggregated_properties() {
    let points = sample_points(800, 21);
    let mut index = Supercluster::with_aggregator(
        ClusterOptions::default(),
        |i: &usize| *i as u64,
        |sum: &mut u64, other: &u64| *sum += *other,
    )
    .unwrap();
    index.load(points).unwrap();

    let nodes = index.get_clusters(&LatLngBounds::world(), 3.0).unwrap();
    let mut clusters = 0;
    for node in nodes {
        if let ClusterNode::Cluster(cluster) = node {
            clusters += 1;
            let expected: u64 = index
                .get_leaves(cluster.id, usize::MAX, 0)
                .unwrap()
                .iter()
                .map(|leaf| leaf.feature.properties as u64)
                .sum();
            assert_eq!(cluster.properties, Some(&expected));
        }
    }
    assert!(clusters > 0);
}

#[test]
fn test_abbreviated_counts() {
    let index = loaded(sample_points(3_000, 13));
    let nodes = index.get_clusters(&LatLngBounds::world(), 0.0).unwrap();
    for node in nodes {
        if let ClusterNode::Cluster(cluster) = node {
            let label = cluster.abbreviated_count();
            if cluster.point_count >= 1_000 {
                assert!(label.ends_with('k'));
            } else {
                assert_eq!(label, cluster.point_count.to_string());
            }
        }
    }
}

#[test]
fn test_tiles_cover_all_points() {
    let index = loaded(sample_points(1_000, 17));

    let mut total = 0;
    for x in 0..4 {
        for y in 0..4 {
            if let Some(tile) = index.get_tile(2, x, y) {
                for feature in &tile.features {
                    if (0..512).contains(&feature.x) && (0..512).contains(&feature.y) {
                        total += feature.node.point_count();
                    }
                }
            }
        }
    }
    // Points exactly on a tile edge round into the neighbor's buffer.
    assert!(total <= 1_000);
    assert!(total >= 990);
}
