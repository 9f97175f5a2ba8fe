//! GeoJSON input and output for the cluster engine.

use crate::cluster::{ClusterNode, PointFeature};
use crate::error::{ClusterError, Result};
use geo::Point;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use serde::Serialize;

/// Point features of a collection, ready for `Supercluster::load`.
///
/// Features without a geometry or with a non-point geometry are skipped.
/// Numeric feature ids are kept as point ids.
pub fn features_from_geojson(
    collection: &FeatureCollection,
) -> Result<Vec<PointFeature<JsonObject>>> {
    let mut features = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for feature in &collection.features {
        let Some(Value::Point(coords)) = feature.geometry.as_ref().map(|g| &g.value) else {
            skipped += 1;
            continue;
        };
        if coords.len() < 2 {
            return Err(ClusterError::InvalidInput(
                "Point must have at least 2 coordinates".to_string(),
            ));
        }

        let mut point = PointFeature::new(
            Point::new(coords[0], coords[1]),
            feature.properties.clone().unwrap_or_default(),
        );
        if let Some(Id::Number(id)) = &feature.id
            && let Some(id) = id.as_u64()
        {
            point = point.with_id(id);
        }
        features.push(point);
    }

    if skipped > 0 {
        log::warn!("Skipped {} features without a point geometry", skipped);
    }
    Ok(features)
}

/// Parse a GeoJSON `FeatureCollection` string into point features.
pub fn parse_feature_collection(json: &str) -> Result<Vec<PointFeature<JsonObject>>> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    features_from_geojson(&collection)
}

impl<T: Serialize, A: Serialize> ClusterNode<'_, T, A> {
    /// A GeoJSON point feature for this query result.
    ///
    /// Leaves carry their own properties and id. Clusters carry `cluster`,
    /// `cluster_id`, `point_count` and `point_count_abbreviated`, on top of any
    /// aggregated properties.
    pub fn to_geojson_feature(&self) -> Result<Feature> {
        let position = self.position();
        let geometry = Geometry::new(Value::Point(vec![position.x(), position.y()]));

        let (id, properties) = match self {
            ClusterNode::Leaf(leaf) => (
                leaf.feature.id.map(|id| Id::Number(id.into())),
                to_object(&leaf.feature.properties)?,
            ),
            ClusterNode::Cluster(cluster) => {
                let mut properties = match cluster.properties {
                    Some(props) => to_object(props)?,
                    None => JsonObject::new(),
                };
                properties.insert("cluster".to_string(), JsonValue::Bool(true));
                properties.insert("cluster_id".to_string(), cluster.id.get().into());
                properties.insert("point_count".to_string(), cluster.point_count.into());
                properties.insert(
                    "point_count_abbreviated".to_string(),
                    cluster.abbreviated_count().into(),
                );
                (Some(Id::Number(cluster.id.get().into())), properties)
            }
        };

        Ok(Feature {
            bbox: None,
            geometry: Some(geometry),
            id,
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

/// Serialize into a JSON object; non-object values land under `"value"`.
fn to_object<S: Serialize>(value: &S) -> Result<JsonObject> {
    Ok(match serde_json::to_value(value)? {
        JsonValue::Object(map) => map,
        JsonValue::Null => JsonObject::new(),
        other => {
            let mut map = JsonObject::new();
            map.insert("value".to_string(), other);
            map
        }
    })
}
