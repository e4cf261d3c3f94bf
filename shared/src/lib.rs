pub mod area;
pub mod colors;
pub mod dataset;
pub mod geo;
pub mod info;
pub mod poi;
pub mod search;
pub mod selection;

pub use area::*;
pub use colors::area_color;
pub use dataset::{Dataset, DatasetError};
pub use geo::{Bounds, LonLat, Shape};
pub use info::{AreaInfoSummary, InfoEndpoints, InfoLookup, InfoTransport, fetch_area_info};
pub use poi::MarkerOverlay;
pub use search::filter_areas;
pub use selection::{
    AreaPopup, DisplayState, FeatureStyle, FetchTicket, LabelState, SelectOutcome, SelectionController,
    style_for,
};
