use std::f64::consts::PI;

/// Size of the whole world in projected units at zoom 0 (one 256px tile).
pub const WORLD_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Longitude/latitude pair in degrees, GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Spherical Web Mercator into world units where `[0, WORLD_SIZE)` spans the globe
/// and `y` grows southward.
pub fn project(p: LonLat) -> (f64, f64) {
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lon + 180.0) / 360.0 * WORLD_SIZE;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * WORLD_SIZE;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64) -> LonLat {
    let lon = x / WORLD_SIZE * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / WORLD_SIZE;
    let lat = n.sinh().atan().to_degrees();
    LonLat { lon, lat }
}

/// Axis-aligned box in lon/lat degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            west: f64::MAX,
            south: f64::MAX,
            east: f64::MIN,
            north: f64::MIN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.west > self.east || self.south > self.north
    }

    pub fn extend(&mut self, p: LonLat) {
        self.west = self.west.min(p.lon);
        self.east = self.east.max(p.lon);
        self.south = self.south.min(p.lat);
        self.north = self.north.max(p.lat);
    }

    pub fn union(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.extend(LonLat::new(other.west, other.south));
        self.extend(LonLat::new(other.east, other.north));
    }

    pub fn contains(&self, p: LonLat) -> bool {
        p.lon >= self.west && p.lon <= self.east && p.lat >= self.south && p.lat <= self.north
    }

    /// Projected `(min_x, min_y, max_x, max_y)`; north maps to the smaller y.
    pub fn projected(&self) -> (f64, f64, f64, f64) {
        let (min_x, min_y) = project(LonLat::new(self.west, self.north));
        let (max_x, max_y) = project(LonLat::new(self.east, self.south));
        (min_x, min_y, max_x, max_y)
    }
}

/// A closed ring of positions. The closing vertex may or may not repeat the first.
pub type Ring = Vec<LonLat>;

/// One polygon: outer ring followed by holes.
pub type Polygon = Vec<Ring>;

/// Geometry of an area. Single polygons are stored as a one-element multipolygon.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub polygons: Vec<Polygon>,
}

impl Shape {
    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        for ring in self.polygons.iter().flatten() {
            for &p in ring {
                b.extend(p);
            }
        }
        b
    }

    /// Mean of the outer-ring vertices of every polygon.
    pub fn centroid(&self) -> Option<LonLat> {
        let (mut sum_lon, mut sum_lat, mut n) = (0.0, 0.0, 0usize);
        for outer in self.polygons.iter().filter_map(|poly| poly.first()) {
            for p in open_ring(outer) {
                sum_lon += p.lon;
                sum_lat += p.lat;
                n += 1;
            }
        }
        if n == 0 {
            return None;
        }
        Some(LonLat::new(sum_lon / n as f64, sum_lat / n as f64))
    }

    /// Even-odd containment across all rings of all polygons.
    pub fn contains(&self, p: LonLat) -> bool {
        self.polygons.iter().any(|poly| polygon_contains(poly, p))
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(|poly| poly.iter().all(Vec::is_empty))
    }
}

/// Drop a repeated closing vertex so averages don't double-count it.
fn open_ring(ring: &[LonLat]) -> &[LonLat] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn polygon_contains(poly: &Polygon, p: LonLat) -> bool {
    let mut inside = false;
    for ring in poly {
        if ring_crossings(ring, p) % 2 == 1 {
            inside = !inside;
        }
    }
    inside
}

fn ring_crossings(ring: &[LonLat], p: LonLat) -> usize {
    let pts = open_ring(ring);
    if pts.len() < 3 {
        return 0;
    }
    let mut crossings = 0;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (a, b) = (pts[i], pts[j]);
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let x = (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon;
            if p.lon < x {
                crossings += 1;
            }
        }
        j = i;
    }
    crossings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn square(west: f64, south: f64, size: f64) -> Ring {
        vec![
            LonLat::new(west, south),
            LonLat::new(west + size, south),
            LonLat::new(west + size, south + size),
            LonLat::new(west, south + size),
            LonLat::new(west, south),
        ]
    }

    #[test]
    fn project_origin_is_world_center() {
        let (x, y) = project(LonLat::new(0.0, 0.0));
        assert_close(x, 128.0);
        assert_close(y, 128.0);
    }

    #[test]
    fn project_then_unproject_recovers_curacao() {
        let p = LonLat::new(-68.93, 12.11);
        let (x, y) = project(p);
        let back = unproject(x, y);
        assert!((back.lon - p.lon).abs() < 1e-9);
        assert!((back.lat - p.lat).abs() < 1e-9);
    }

    #[test]
    fn north_projects_above_south() {
        let (_, north) = project(LonLat::new(-69.0, 12.4));
        let (_, south) = project(LonLat::new(-69.0, 12.0));
        assert!(north < south);
    }

    #[test]
    fn centroid_ignores_closing_vertex() {
        let shape = Shape {
            polygons: vec![vec![square(0.0, 0.0, 2.0)]],
        };
        let c = shape.centroid().expect("centroid");
        assert_close(c.lon, 1.0);
        assert_close(c.lat, 1.0);
    }

    #[test]
    fn centroid_of_empty_shape_is_none() {
        assert_eq!(Shape::default().centroid(), None);
        assert!(Shape::default().is_empty());
    }

    #[test]
    fn contains_respects_holes() {
        let shape = Shape {
            polygons: vec![vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)]],
        };
        assert!(shape.contains(LonLat::new(1.0, 1.0)));
        assert!(!shape.contains(LonLat::new(5.0, 5.0)));
        assert!(!shape.contains(LonLat::new(11.0, 1.0)));
    }

    #[test]
    fn multipolygon_contains_either_part() {
        let shape = Shape {
            polygons: vec![vec![square(0.0, 0.0, 1.0)], vec![square(5.0, 5.0, 1.0)]],
        };
        assert!(shape.contains(LonLat::new(0.5, 0.5)));
        assert!(shape.contains(LonLat::new(5.5, 5.5)));
        assert!(!shape.contains(LonLat::new(3.0, 3.0)));
    }

    #[test]
    fn bounds_union_and_projection_order() {
        let mut b = Shape {
            polygons: vec![vec![square(-69.2, 12.0, 0.1)]],
        }
        .bounds();
        b.union(&Bounds::empty());
        b.union(
            &Shape {
                polygons: vec![vec![square(-68.8, 12.3, 0.1)]],
            }
            .bounds(),
        );
        assert_close(b.west, -69.2);
        assert_close(b.north, 12.4);
        let (min_x, min_y, max_x, max_y) = b.projected();
        assert!(min_x < max_x);
        assert!(min_y < max_y);
        assert!(b.contains(LonLat::new(-69.0, 12.2)));
    }
}
