/// Static dataset with area polygons and church points.
pub const DATASET_PATH: &str = "/data/curacao.geojson";

pub const TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "\u{00A9} OpenStreetMap contributors";
pub const TILE_ATTRIBUTION_URL: &str = "https://www.openstreetmap.org/copyright";
pub const TILE_MIN_ZOOM: u8 = 0;
pub const TILE_MAX_ZOOM: u8 = 19;
/// Loaded tile images kept before the cache drops other zoom levels.
pub const TILE_CACHE_LIMIT: usize = 384;

/// Island extent used before the dataset arrives and for the reset shortcut fallback.
pub const INITIAL_WEST: f64 = -69.17;
pub const INITIAL_SOUTH: f64 = 12.02;
pub const INITIAL_EAST: f64 = -68.73;
pub const INITIAL_NORTH: f64 = 12.40;

/// Zoom applied when a church marker is clicked.
pub const MARKER_FOCUS_ZOOM: f64 = 16.0;
/// Extra space around an area when the view is fitted to it, as a fraction of its size.
pub const AREA_FIT_PADDING: f64 = 0.15;

pub const MARKER_RADIUS_PX: f64 = 7.0;
pub const CLICK_SLOP_PX: f64 = 5.0;
