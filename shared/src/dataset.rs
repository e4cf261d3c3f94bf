use std::collections::HashMap;
use std::fmt;

use geojson::{Feature, GeoJson, Position, Value};
use serde_json::Value as JsonValue;

use crate::area::{
    AreaFeature, AreaRecord, DatasetStats, PointOfInterest, UNKNOWN_AREA_NAME, UNNAMED_PLACE,
};
use crate::geo::{Bounds, LonLat, Polygon, Ring, Shape};

#[derive(Debug)]
pub enum DatasetError {
    Parse(geojson::Error),
    NotFeatureCollection,
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "invalid GeoJSON: {e}"),
            Self::NotFeatureCollection => f.write_str("GeoJSON root must be a FeatureCollection"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::NotFeatureCollection => None,
        }
    }
}

impl From<geojson::Error> for DatasetError {
    fn from(e: geojson::Error) -> Self {
        Self::Parse(e)
    }
}

/// Areas and points loaded once from the static dataset.
///
/// `areas` is sorted by name; `features[i]` is the geometry of `areas[i]`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub areas: Vec<AreaRecord>,
    pub features: Vec<AreaFeature>,
    pub points: Vec<PointOfInterest>,
    index: HashMap<String, usize>,
}

impl Dataset {
    pub fn from_geojson_str(input: &str) -> Result<Self, DatasetError> {
        let GeoJson::FeatureCollection(collection) = input.parse::<GeoJson>()? else {
            return Err(DatasetError::NotFeatureCollection);
        };
        Ok(Self::from_features(collection.features))
    }

    /// Partition features into areas (Polygon/MultiPolygon) and points (Point).
    /// Other geometry kinds and features without geometry are skipped.
    pub fn from_features(features: Vec<Feature>) -> Self {
        let mut areas: Vec<(AreaRecord, Shape)> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut points = Vec::new();

        for feature in features {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            match &geometry.value {
                Value::Polygon(rings) => {
                    let shape = Shape {
                        polygons: vec![to_polygon(rings)],
                    };
                    push_area(&mut areas, &mut by_name, area_record(&feature), shape);
                }
                Value::MultiPolygon(polys) => {
                    let shape = Shape {
                        polygons: polys.iter().map(|rings| to_polygon(rings)).collect(),
                    };
                    push_area(&mut areas, &mut by_name, area_record(&feature), shape);
                }
                Value::Point(pos) => {
                    if let Some(p) = to_lonlat(pos) {
                        points.push(point_record(&feature, p));
                    }
                }
                _ => {}
            }
        }

        areas.sort_by(|(a, _), (b, _)| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut records = Vec::with_capacity(areas.len());
        let mut shapes = Vec::with_capacity(areas.len());
        let mut index = HashMap::with_capacity(areas.len());
        for (i, (record, shape)) in areas.into_iter().enumerate() {
            index.insert(record.name.clone(), i);
            shapes.push(AreaFeature::new(record.name.clone(), shape));
            records.push(record);
        }

        Self {
            areas: records,
            features: shapes,
            points,
            index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn area(&self, name: &str) -> Option<&AreaRecord> {
        self.index.get(name).map(|&i| &self.areas[i])
    }

    /// Drawable geometry for an exact area name. `None` when no polygon with
    /// that name was loaded or none of its coordinates were usable.
    pub fn feature(&self, name: &str) -> Option<&AreaFeature> {
        self.index
            .get(name)
            .map(|&i| &self.features[i])
            .filter(|f| !f.shape.is_empty())
    }

    pub fn area_names(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(|a| a.name.as_str())
    }

    /// Names of the areas that have drawable geometry.
    pub fn rendered_names(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .filter(|f| !f.shape.is_empty())
            .map(|f| f.name.as_str())
    }

    /// Extent of every area polygon.
    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        for f in &self.features {
            b.union(&f.bounds);
        }
        b
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            area_count: self.areas.len(),
            point_count: self.points.len(),
            total_population: self.areas.iter().map(|a| a.population).sum(),
            total_households: self.areas.iter().map(|a| a.households).sum(),
        }
    }
}

/// Same-named polygons are merged into one area; the first record wins.
fn push_area(
    areas: &mut Vec<(AreaRecord, Shape)>,
    by_name: &mut HashMap<String, usize>,
    record: AreaRecord,
    shape: Shape,
) {
    if let Some(&i) = by_name.get(&record.name) {
        areas[i].1.polygons.extend(shape.polygons);
        return;
    }
    by_name.insert(record.name.clone(), areas.len());
    areas.push((record, shape));
}

fn area_record(feature: &Feature) -> AreaRecord {
    AreaRecord {
        name: text_prop(feature, "NAME").unwrap_or_else(|| UNKNOWN_AREA_NAME.to_string()),
        population: count_prop(feature, "pop"),
        households: count_prop(feature, "HH"),
        mean_income: amount_prop(feature, "meanPinc"),
    }
}

fn point_record(feature: &Feature, p: LonLat) -> PointOfInterest {
    PointOfInterest {
        name: text_prop(feature, "name").unwrap_or_else(|| UNNAMED_PLACE.to_string()),
        area_name: text_prop(feature, "area").unwrap_or_default(),
        photo_url: text_prop(feature, "photo"),
        description: text_prop(feature, "description"),
        lon: p.lon,
        lat: p.lat,
    }
}

fn to_lonlat(pos: &Position) -> Option<LonLat> {
    match pos.as_slice() {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(LonLat::new(*lon, *lat)),
        _ => None,
    }
}

fn to_polygon(rings: &[Vec<Position>]) -> Polygon {
    rings
        .iter()
        .map(|ring| ring.iter().filter_map(to_lonlat).collect::<Ring>())
        .filter(|ring| !ring.is_empty())
        .collect()
}

/// Non-blank string (numbers are stringified). Blank or missing yields `None`.
fn text_prop(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        JsonValue::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_prop(feature: &Feature, key: &str) -> Option<f64> {
    let value = match feature.property(key)? {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn count_prop(feature: &Feature, key: &str) -> u64 {
    number_prop(feature, key)
        .map(|v| v.max(0.0).round() as u64)
        .unwrap_or(0)
}

fn amount_prop(feature: &Feature, key: &str) -> f64 {
    number_prop(feature, key).map(|v| v.max(0.0)).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "NAME": "Willemstad", "pop": 150000, "HH": 52000, "meanPinc": 2450.5 },
                "geometry": { "type": "Polygon", "coordinates": [[[-68.95,12.08],[-68.90,12.08],[-68.90,12.13],[-68.95,12.13],[-68.95,12.08]]] }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Bandabou", "pop": 8000, "HH": "2900", "meanPinc": null },
                "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[-69.16,12.30],[-69.10,12.30],[-69.10,12.36],[-69.16,12.36],[-69.16,12.30]]],
                    [[[-69.08,12.25],[-69.05,12.25],[-69.05,12.28],[-69.08,12.28],[-69.08,12.25]]]
                ] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Fortkerk", "area": "willemstad", "photo": "https://example.org/fortkerk.jpg", "description": "Protestant church in Fort Amsterdam" },
                "geometry": { "type": "Point", "coordinates": [-68.934, 12.105] }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [-69.1, 12.3] }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Road" },
                "geometry": { "type": "LineString", "coordinates": [[-69.0,12.1],[-68.9,12.2]] }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Nowhere" },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn loads_areas_sorted_alphabetically() {
        let ds = Dataset::from_geojson_str(SAMPLE).expect("sample parses");
        let names: Vec<_> = ds.area_names().collect();
        assert_eq!(names, ["Bandabou", "Willemstad"]);
        assert_eq!(ds.area("Willemstad").map(|a| a.population), Some(150_000));
        assert_eq!(ds.area("Bandabou").map(|a| a.population), Some(8_000));
    }

    #[test]
    fn feature_names_match_area_names() {
        let ds = Dataset::from_geojson_str(SAMPLE).expect("sample parses");
        let feature_names: Vec<_> = ds.features.iter().map(|f| f.name.as_str()).collect();
        let area_names: Vec<_> = ds.area_names().collect();
        assert_eq!(feature_names, area_names);
        assert_eq!(ds.features[0].shape.polygons.len(), 2);
    }

    #[test]
    fn missing_properties_fall_back_to_defaults() {
        let ds = Dataset::from_geojson_str(SAMPLE).expect("sample parses");
        let banda = ds.area("Bandabou").expect("Bandabou");
        assert_eq!(banda.households, 2_900);
        assert_eq!(banda.mean_income, 0.0);

        let unnamed = &ds.points[1];
        assert_eq!(unnamed.name, UNNAMED_PLACE);
        assert_eq!(unnamed.area_name, "");
        assert_eq!(unnamed.photo_url, None);
    }

    #[test]
    fn points_keep_their_properties() {
        let ds = Dataset::from_geojson_str(SAMPLE).expect("sample parses");
        assert_eq!(ds.points.len(), 2);
        let fortkerk = &ds.points[0];
        assert_eq!(fortkerk.name, "Fortkerk");
        assert_eq!(fortkerk.area_name, "willemstad");
        assert_eq!(
            fortkerk.photo_url.as_deref(),
            Some("https://example.org/fortkerk.jpg")
        );
        assert_eq!(fortkerk.lon, -68.934);
    }

    #[test]
    fn unnamed_polygons_get_placeholder_name() {
        let input = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"pop":-5},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let ds = Dataset::from_geojson_str(input).expect("parses");
        let area = ds.area(UNKNOWN_AREA_NAME).expect("placeholder area");
        assert_eq!(area.population, 0);
        assert_eq!(area.households, 0);
    }

    #[test]
    fn duplicate_names_merge_geometry() {
        let input = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"NAME":"Westpunt","pop":100},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{"NAME":"Westpunt","pop":999},"geometry":{"type":"Polygon","coordinates":[[[2,2],[3,2],[3,3],[2,2]]]}}
        ]}"#;
        let ds = Dataset::from_geojson_str(input).expect("parses");
        assert_eq!(ds.areas.len(), 1);
        assert_eq!(ds.areas[0].population, 100);
        assert_eq!(ds.features[0].shape.polygons.len(), 2);
    }

    #[test]
    fn polygon_without_usable_coordinates_keeps_its_record() {
        let input = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"NAME":"Westpunt","pop":100},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{"NAME":"Hollow","pop":40},"geometry":{"type":"Polygon","coordinates":[]}}
        ]}"#;
        let ds = Dataset::from_geojson_str(input).expect("parses");
        let names: Vec<_> = ds.area_names().collect();
        assert_eq!(names, ["Hollow", "Westpunt"]);
        assert_eq!(ds.features.len(), 2);
        assert_eq!(ds.area("Hollow").map(|a| a.population), Some(40));
        assert!(ds.feature("Hollow").is_none());
        assert!(ds.feature("Westpunt").is_some());
        assert_eq!(ds.rendered_names().collect::<Vec<_>>(), ["Westpunt"]);
        assert_eq!(ds.stats().total_population, 140);
    }

    #[test]
    fn stats_sum_population_and_households() {
        let ds = Dataset::from_geojson_str(SAMPLE).expect("sample parses");
        let stats = ds.stats();
        assert_eq!(stats.area_count, 2);
        assert_eq!(stats.point_count, 2);
        assert_eq!(stats.total_population, 158_000);
        assert_eq!(stats.total_households, 54_900);
        assert!(ds.bounds().contains(LonLat::new(-69.0, 12.2)));
    }

    #[test]
    fn rejects_non_collection_roots() {
        let input = r#"{"type":"Point","coordinates":[0,0]}"#;
        assert!(matches!(
            Dataset::from_geojson_str(input),
            Err(DatasetError::NotFeatureCollection)
        ));
        assert!(matches!(
            Dataset::from_geojson_str("not json"),
            Err(DatasetError::Parse(_))
        ));
    }
}
