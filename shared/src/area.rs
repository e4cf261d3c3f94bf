use serde::{Deserialize, Serialize};

use crate::geo::{Bounds, LonLat, Shape};

pub const UNKNOWN_AREA_NAME: &str = "Unknown area";
pub const UNNAMED_PLACE: &str = "Unnamed place";

/// Demographic record for one administrative area. `name` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub name: String,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub households: u64,
    #[serde(default)]
    pub mean_income: f64,
}

impl AreaRecord {
    /// Average household size, `None` when the area has no households.
    pub fn persons_per_household(&self) -> Option<f64> {
        if self.households == 0 {
            return None;
        }
        Some(self.population as f64 / self.households as f64)
    }
}

/// Rendered geometry of an area, keyed by the same name as its [`AreaRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct AreaFeature {
    pub name: String,
    pub shape: Shape,
    pub bounds: Bounds,
    /// Label anchor.
    pub centroid: LonLat,
}

impl AreaFeature {
    pub fn new(name: String, shape: Shape) -> Self {
        let bounds = shape.bounds();
        let centroid = shape.centroid().unwrap_or_else(|| {
            LonLat::new(
                (bounds.west + bounds.east) / 2.0,
                (bounds.south + bounds.north) / 2.0,
            )
        });
        Self {
            name,
            shape,
            bounds,
            centroid,
        }
    }
}

/// A point feature (e.g. a church) belonging to one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    /// Matched case-insensitively against [`AreaRecord::name`].
    pub area_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub lon: f64,
    pub lat: f64,
}

impl PointOfInterest {
    pub fn position(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }

    pub fn belongs_to(&self, area_name: &str) -> bool {
        names_match_ignore_case(&self.area_name, area_name)
    }
}

/// Case-insensitive name comparison used for point-of-interest lookups.
pub fn names_match_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Island-wide totals shown in the stats bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DatasetStats {
    pub area_count: usize,
    pub point_count: usize,
    pub total_population: u64,
    pub total_households: u64,
}

/// Group digits in threes: `150000` -> `"150,000"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Mean income rounded to whole guilders.
pub fn format_income(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "n/a".to_string();
    }
    format!("NAf {}", format_count(value.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(150_000), "150,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn format_income_rounds_and_handles_missing() {
        assert_eq!(format_income(2345.6), "NAf 2,346");
        assert_eq!(format_income(0.0), "n/a");
        assert_eq!(format_income(f64::NAN), "n/a");
    }

    #[test]
    fn persons_per_household_guards_zero() {
        let mut area = AreaRecord {
            name: "Willemstad".into(),
            population: 150_000,
            households: 50_000,
            mean_income: 0.0,
        };
        assert_eq!(area.persons_per_household(), Some(3.0));
        area.households = 0;
        assert_eq!(area.persons_per_household(), None);
    }

    #[test]
    fn point_area_match_ignores_case() {
        let poi = PointOfInterest {
            name: "Fortkerk".into(),
            area_name: "Willemstad".into(),
            photo_url: None,
            description: None,
            lon: -68.93,
            lat: 12.10,
        };
        assert!(poi.belongs_to("WILLEMSTAD"));
        assert!(poi.belongs_to("willemstad"));
        assert!(!poi.belongs_to("Bandabou"));
    }
}
