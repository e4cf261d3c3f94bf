//! Area selection, hover emphasis and label visibility.
//!
//! Every rendered area has one entry in the controller's side-table holding its
//! current style and the visibility of its label. Labels are toggled, never
//! removed, for as long as the controller lives.

use std::collections::HashMap;

use crate::colors::{ACCENT, area_color};
use crate::geo::LonLat;
use crate::info::AreaInfoSummary;

pub const DEFAULT_STROKE: &str = "#ffffff";
pub const HOVER_STROKE: &str = "#666666";

/// Visual attributes applied to one area polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStyle {
    pub fill: &'static str,
    pub weight: f64,
    pub stroke: &'static str,
    pub fill_opacity: f64,
}

/// Style of `name` given the global selection.
pub fn style_for(name: &str, selection: Option<&str>) -> FeatureStyle {
    let fill = area_color(name);
    if selection == Some(name) {
        FeatureStyle {
            fill,
            weight: 3.0,
            stroke: ACCENT,
            fill_opacity: 0.9,
        }
    } else {
        FeatureStyle {
            fill,
            weight: 1.0,
            stroke: DEFAULT_STROKE,
            fill_opacity: 0.7,
        }
    }
}

/// Style applied while the pointer is over an area.
pub fn hover_style(name: &str) -> FeatureStyle {
    FeatureStyle {
        fill: area_color(name),
        weight: 3.0,
        stroke: HOVER_STROKE,
        fill_opacity: 0.9,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Default,
    Hovered,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelState {
    pub visible: bool,
    /// Bold, outlined rendering used for the selected area.
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct FeatureSlot {
    style: FeatureStyle,
    label: LabelState,
    hovered: bool,
}

/// Identifies one info request. A response is only applied while its ticket
/// is still the latest one issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub area: String,
}

/// Result of a selection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOutcome {
    /// Present when a rendered layer exists for the area; the caller should
    /// fit the view to it and fetch its info with this ticket.
    pub ticket: Option<FetchTicket>,
}

/// Popup bound to the selected area. `summary` stays `None` until the info
/// lookup for `generation` resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaPopup {
    pub area: String,
    pub generation: u64,
    pub anchor: LonLat,
    pub summary: Option<AreaInfoSummary>,
}

impl AreaPopup {
    /// Placeholder shown while the lookup for `ticket` is in flight.
    pub fn loading(ticket: &FetchTicket, anchor: LonLat) -> Self {
        Self {
            area: ticket.area.clone(),
            generation: ticket.generation,
            anchor,
            summary: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionController {
    selected: Option<String>,
    order: Vec<String>,
    slots: HashMap<String, FeatureSlot>,
    generation: u64,
}

impl SelectionController {
    /// One slot per rendered area, all in default style with hidden labels.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Vec::new();
        let mut slots = HashMap::new();
        for name in names {
            let name = name.into();
            if slots.contains_key(&name) {
                continue;
            }
            slots.insert(
                name.clone(),
                FeatureSlot {
                    style: style_for(&name, None),
                    label: LabelState::default(),
                    hovered: false,
                },
            );
            order.push(name);
        }
        Self {
            selected: None,
            order,
            slots,
            generation: 0,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.as_deref() == Some(name)
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Pointer entered an area. Touches no other feature. Returns `false` for
    /// unknown names.
    pub fn pointer_enter(&mut self, name: &str) -> bool {
        let selected = self.is_selected(name);
        let Some(slot) = self.slots.get_mut(name) else {
            return false;
        };
        slot.hovered = true;
        if !selected {
            slot.style = hover_style(name);
        }
        slot.label.visible = true;
        true
    }

    /// Pointer left an area. The selected area keeps its emphasis.
    pub fn pointer_leave(&mut self, name: &str) -> bool {
        let selected = self.is_selected(name);
        let Some(slot) = self.slots.get_mut(name) else {
            return false;
        };
        slot.hovered = false;
        if !selected {
            slot.style = style_for(name, None);
            slot.label = LabelState::default();
        }
        true
    }

    /// Record `name` as the selection and restyle every area.
    ///
    /// Reselecting the current area runs the whole procedure again and issues a
    /// fresh ticket.
    pub fn select(&mut self, name: &str) -> SelectOutcome {
        self.selected = Some(name.to_string());
        self.generation = self.generation.wrapping_add(1);
        self.restyle_all();

        let ticket = self.has_feature(name).then(|| FetchTicket {
            generation: self.generation,
            area: name.to_string(),
        });
        SelectOutcome { ticket }
    }

    /// Hover emphasis does not survive a selection; the pointer has to
    /// re-enter an area to get it back.
    fn restyle_all(&mut self) {
        let selected = self.selected.as_deref();
        for (name, slot) in self.slots.iter_mut() {
            let is_selected = selected == Some(name.as_str());
            slot.hovered = false;
            slot.style = style_for(name, selected);
            slot.label = LabelState {
                visible: is_selected,
                emphasized: is_selected,
            };
        }
    }

    /// Whether a response for `ticket` may still be applied.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && self.is_selected(&ticket.area)
    }

    /// Popup to open for a resolved lookup, or `None` when a newer selection
    /// has superseded `ticket`. Whatever popup is currently shown plays no part.
    pub fn bind_summary(
        &self,
        ticket: &FetchTicket,
        anchor: LonLat,
        summary: AreaInfoSummary,
    ) -> Option<AreaPopup> {
        self.is_current(ticket).then(|| AreaPopup {
            summary: Some(summary),
            ..AreaPopup::loading(ticket, anchor)
        })
    }

    pub fn display_state(&self, name: &str) -> Option<DisplayState> {
        let slot = self.slots.get(name)?;
        Some(if self.is_selected(name) {
            DisplayState::Selected
        } else if slot.hovered {
            DisplayState::Hovered
        } else {
            DisplayState::Default
        })
    }

    pub fn style(&self, name: &str) -> Option<FeatureStyle> {
        self.slots.get(name).map(|slot| slot.style)
    }

    pub fn label(&self, name: &str) -> Option<LabelState> {
        self.slots.get(name).map(|slot| slot.label)
    }

    /// Areas in render order with their current style and label.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureStyle, LabelState)> {
        self.order.iter().filter_map(|name| {
            let slot = self.slots.get(name)?;
            Some((name.as_str(), slot.style, slot.label))
        })
    }
}
