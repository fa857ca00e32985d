use crate::error::LocatorError;
use log::info;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::read_to_string;
use std::path::Path;

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// The first feature of a GeoJSON FeatureCollection.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    pub geometry: Value,
    pub properties: Option<Map<String, Value>>,
    /// Number of features in the source collection, of which only the first is kept.
    pub feature_count: usize,
}

impl AreaOfInterest {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, LocatorError> {
        let path = path.as_ref();
        info!("Opening geojson file {}..", path.display());
        let content = read_to_string(path).map_err(|e| {
            LocatorError::Input(format!("unable to read {}: {}", path.display(), e))
        })?;
        let aoi = Self::from_geojson(&content)
            .map_err(|e| LocatorError::Input(format!("{}: {}", path.display(), e)))?;
        info!("Geojson file has {} features.", aoi.feature_count);
        Ok(aoi)
    }

    pub fn from_geojson(content: &str) -> Result<Self, String> {
        let collection: FeatureCollection =
            serde_json::from_str(content).map_err(|e| format!("not a feature collection: {e}"))?;
        let feature_count = collection.features.len();
        let first = collection
            .features
            .into_iter()
            .next()
            .ok_or("feature collection has no features")?;
        if !first.geometry.is_object() {
            return Err("first feature has no geometry".to_string());
        }
        Ok(Self {
            geometry: first.geometry,
            properties: first.properties,
            feature_count,
        })
    }

    pub fn bounding_box(self: &Self) -> Result<BoundingBox, LocatorError> {
        let mut bbox: Option<BoundingBox> = None;
        extend_with_geometry(&mut bbox, &self.geometry)?;
        bbox.ok_or(LocatorError::Input(
            "area of interest geometry has no coordinates".to_string(),
        ))
    }
}

/// Axis-aligned extents in the native CRS of the geometry they were taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    fn from_point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// `[min_x, min_y, max_x, max_y]`, the order used by `gdalwarp -te` and GeoJSON.
    pub fn to_array(self: &Self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

fn extend_with_geometry(bbox: &mut Option<BoundingBox>, geometry: &Value) -> Result<(), LocatorError> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or(LocatorError::Input("geometry without a type".to_string()))?;

    if kind == "GeometryCollection" {
        let members = geometry
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or(LocatorError::Input("GeometryCollection without geometries".to_string()))?;
        for member in members {
            extend_with_geometry(bbox, member)?;
        }
        return Ok(());
    }

    let coordinates = geometry
        .get("coordinates")
        .ok_or(LocatorError::Input(format!("{kind} without coordinates")))?;
    extend_with_coordinates(bbox, coordinates)
}

// Positions are the innermost arrays whose first element is a number; the
// nesting depth differs per geometry type.
fn extend_with_coordinates(bbox: &mut Option<BoundingBox>, coordinates: &Value) -> Result<(), LocatorError> {
    let array = coordinates
        .as_array()
        .ok_or(LocatorError::Input(format!("invalid coordinates: {coordinates}")))?;

    match array.first() {
        None => Ok(()),
        Some(Value::Number(_)) => {
            let (x, y) = match (
                array.first().and_then(Value::as_f64),
                array.get(1).and_then(Value::as_f64),
            ) {
                (Some(x), Some(y)) => (x, y),
                _ => return Err(LocatorError::Input(format!("invalid position: {coordinates}"))),
            };
            *bbox = Some(match *bbox {
                Some(mut b) => {
                    b.include(x, y);
                    b
                }
                None => BoundingBox::from_point(x, y),
            });
            Ok(())
        }
        Some(_) => {
            for child in array {
                extend_with_coordinates(bbox, child)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
            ]]
        })
    }

    fn feature_collection(geometries: &[Value]) -> String {
        let features: Vec<Value> = geometries
            .iter()
            .enumerate()
            .map(|(i, g)| json!({"type": "Feature", "properties": {"name": format!("aoi-{i}")}, "geometry": g}))
            .collect();
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    #[test]
    fn test_uses_first_feature_and_counts_all() {
        let content = feature_collection(&[
            polygon(10.0, 20.0, 11.0, 21.0),
            polygon(0.0, 0.0, 1.0, 1.0),
            polygon(5.0, 5.0, 6.0, 6.0),
        ]);
        let aoi = AreaOfInterest::from_geojson(&content).unwrap();
        assert_eq!(aoi.feature_count, 3);
        assert_eq!(aoi.geometry, polygon(10.0, 20.0, 11.0, 21.0));
        assert_eq!(aoi.properties.unwrap()["name"], "aoi-0");
    }

    #[test]
    fn test_read_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aoi.geojson");
        fs::write(&path, feature_collection(&[polygon(14.1, 50.0, 14.6, 50.2)])).unwrap();

        let aoi = AreaOfInterest::read(&path).unwrap();
        assert_eq!(aoi.feature_count, 1);
    }

    #[test]
    fn test_empty_collection_is_input_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.geojson");
        fs::write(&path, feature_collection(&[])).unwrap();

        assert!(matches!(
            AreaOfInterest::read(&path),
            Err(LocatorError::Input(_))
        ));
    }

    #[test]
    fn test_missing_and_unparsable_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AreaOfInterest::read(dir.path().join("missing.geojson")),
            Err(LocatorError::Input(_))
        ));

        let path = dir.path().join("broken.geojson");
        fs::write(&path, "{\"type\": \"FeatureCollection\", \"features\": [").unwrap();
        assert!(matches!(
            AreaOfInterest::read(&path),
            Err(LocatorError::Input(_))
        ));
    }

    #[test]
    fn test_null_geometry_is_rejected() {
        let content = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {}, "geometry": null}]
        })
        .to_string();
        assert!(AreaOfInterest::from_geojson(&content).is_err());
    }

    #[test]
    fn test_polygon_bounding_box() {
        let content = feature_collection(&[polygon(10.0, 20.0, 11.0, 21.0)]);
        let aoi = AreaOfInterest::from_geojson(&content).unwrap();
        assert_eq!(aoi.bounding_box().unwrap().to_array(), [10.0, 20.0, 11.0, 21.0]);
    }

    #[test]
    fn test_multipolygon_bounding_box() {
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[14.0, 50.0], [14.5, 50.0], [14.5, 50.5], [14.0, 50.0]]],
                [[[13.2, 49.1], [13.9, 49.8], [13.2, 49.8], [13.2, 49.1]]]
            ]
        });
        let aoi = AreaOfInterest::from_geojson(&feature_collection(&[geometry])).unwrap();
        assert_eq!(aoi.bounding_box().unwrap().to_array(), [13.2, 49.1, 14.5, 50.5]);
    }

    #[test]
    fn test_geometry_collection_bounding_box() {
        let geometry = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [-3.0, 40.0]},
                {"type": "LineString", "coordinates": [[-4.0, 41.0, 120.0], [-2.5, 39.5, 80.0]]}
            ]
        });
        let aoi = AreaOfInterest::from_geojson(&feature_collection(&[geometry])).unwrap();
        assert_eq!(aoi.bounding_box().unwrap().to_array(), [-4.0, 39.5, -2.5, 41.0]);
    }

    #[test]
    fn test_empty_coordinates_have_no_bounding_box() {
        let geometry = json!({"type": "Polygon", "coordinates": []});
        let aoi = AreaOfInterest::from_geojson(&feature_collection(&[geometry])).unwrap();
        assert!(matches!(aoi.bounding_box(), Err(LocatorError::Input(_))));
    }
}
