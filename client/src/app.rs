use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use std::cell::RefCell;

use curacao_shared::{
    AreaPopup, Bounds, Dataset, MarkerOverlay, SelectOutcome, SelectionController, area_color,
    format_count,
};

use crate::canvas::MapCanvas;
use crate::config::{
    AREA_FIT_PADDING, INITIAL_EAST, INITIAL_NORTH, INITIAL_SOUTH, INITIAL_WEST, MARKER_FOCUS_ZOOM,
};
use crate::data::fetch_dataset;
use crate::info_client::load_area_info;
use crate::popup::{AreaInfoPopup, MarkerPopup};
use crate::sidebar::Sidebar;
use crate::viewport::Viewport;

pub(crate) const SIDEBAR_WIDTH: f64 = 340.0;

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

fn set_loading_shell_step(step: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    if let Some(step_el) = document.get_element_by_id("app-loading-step") {
        step_el.set_text_content(Some(step));
    }
}

fn remove_loading_shell() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    if let Some(shell) = document.get_element_by_id("app-loading-shell") {
        shell.remove();
    }
}

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Area under the pointer, for the tooltip. Styling lives in the controller.
#[derive(Clone, Copy)]
pub(crate) struct Hovered(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SearchQuery(pub RwSignal<String>);
#[derive(Clone, Copy)]
pub(crate) struct SidebarOpen(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct SidebarIndex(pub RwSignal<usize>);
#[derive(Clone, Copy)]
pub(crate) struct SidebarItems(pub RwSignal<Vec<String>>);
/// Index into `Dataset::points` of the marker whose popup is open.
#[derive(Clone, Copy)]
pub(crate) struct OpenMarker(pub RwSignal<Option<usize>>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoadState {
    Loading,
    Ready,
    Failed,
}

#[derive(Clone, Copy)]
pub(crate) struct DatasetLoad(pub RwSignal<LoadState>);

/// Everything the map, sidebar and popups can ask of each other.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MapCommand {
    SelectArea(String),
    ShowMarkers(String),
    ClearMarkers,
    FocusMarker(usize),
    ClosePopup,
    CloseMarkerPopup,
    ResetView,
}

/// Handle for issuing [`MapCommand`]s. Holds only signals owned by [`App`], so
/// commands stop having any effect once the app is unmounted.
#[derive(Clone, Copy)]
pub(crate) struct MapCommands {
    dataset: RwSignal<Dataset>,
    controller: RwSignal<SelectionController>,
    viewport: RwSignal<Viewport>,
    popup: RwSignal<Option<AreaPopup>>,
    markers: RwSignal<MarkerOverlay>,
    open_marker: RwSignal<Option<usize>>,
}

impl MapCommands {
    pub fn dispatch(&self, command: MapCommand) {
        match command {
            MapCommand::SelectArea(name) => self.select_area(&name),
            MapCommand::ShowMarkers(area) => {
                let shown = self.dataset.with_untracked(|ds| {
                    let mut shown = 0;
                    self.markers
                        .update(|m| shown = m.show_for_area(&ds.points, &area));
                    shown
                });
                self.open_marker.set(None);
                web_sys::console::info_1(&format!("showing {shown} marker(s) for {area}").into());
            }
            MapCommand::ClearMarkers => {
                if !self.markers.with_untracked(MarkerOverlay::is_empty) {
                    self.markers.update(MarkerOverlay::clear);
                }
                self.open_marker.set(None);
            }
            MapCommand::FocusMarker(index) => {
                let Some(position) = self
                    .dataset
                    .with_untracked(|ds| ds.points.get(index).map(|p| p.position()))
                else {
                    return;
                };
                let (wx, wy) = curacao_shared::geo::project(position);
                let (cw, ch) = canvas_dimensions();
                self.viewport
                    .update(|vp| vp.center_on(wx, wy, MARKER_FOCUS_ZOOM, cw, ch));
                self.open_marker.set(Some(index));
            }
            MapCommand::ClosePopup => self.popup.set(None),
            MapCommand::CloseMarkerPopup => self.open_marker.set(None),
            MapCommand::ResetView => {
                let bounds = self.dataset.with_untracked(Dataset::bounds);
                let (cw, ch) = canvas_dimensions();
                self.viewport.update(|vp| {
                    if bounds.is_empty() {
                        vp.fit_geo_bounds(&initial_bounds(), cw, ch, 0.0);
                    } else {
                        vp.fit_geo_bounds(&bounds, cw, ch, 0.05);
                    }
                });
            }
        }
    }

    /// Restyle every area, then fit the view and start the info lookup when a
    /// rendered feature exists for `name`.
    fn select_area(&self, name: &str) {
        let Some(SelectOutcome { ticket }) = self.controller.try_update(|c| c.select(name)) else {
            return;
        };
        let Some(ticket) = ticket else {
            web_sys::console::info_1(&format!("no map feature for {name}").into());
            return;
        };
        let Some((bounds, anchor)) = self
            .dataset
            .with_untracked(|ds| ds.feature(name).map(|f| (f.bounds, f.centroid)))
        else {
            return;
        };

        let (cw, ch) = canvas_dimensions();
        self.viewport
            .update(|vp| vp.fit_geo_bounds(&bounds, cw, ch, AREA_FIT_PADDING));
        self.popup.set(Some(AreaPopup::loading(&ticket, anchor)));
        load_area_info(ticket, anchor, self.controller, self.popup);
    }
}

fn initial_bounds() -> Bounds {
    Bounds {
        west: INITIAL_WEST,
        south: INITIAL_SOUTH,
        east: INITIAL_EAST,
        north: INITIAL_NORTH,
    }
}

fn initial_viewport() -> Viewport {
    let mut vp = Viewport::default();
    let (cw, ch) = canvas_dimensions();
    vp.fit_geo_bounds(&initial_bounds(), cw, ch, 0.0);
    vp
}

#[component]
pub fn App() -> impl IntoView {
    let dataset: RwSignal<Dataset> = RwSignal::new(Dataset::default());
    let controller: RwSignal<SelectionController> = RwSignal::new(SelectionController::default());
    let viewport: RwSignal<Viewport> = RwSignal::new(initial_viewport());
    let hovered: RwSignal<Option<String>> = RwSignal::new(None);
    let search_query: RwSignal<String> = RwSignal::new(String::new());
    let mouse_pos: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));
    let markers: RwSignal<MarkerOverlay> = RwSignal::new(MarkerOverlay::default());
    let popup: RwSignal<Option<AreaPopup>> = RwSignal::new(None);
    let open_marker: RwSignal<Option<usize>> = RwSignal::new(None);
    let sidebar_open: RwSignal<bool> = RwSignal::new(true);
    let sidebar_index: RwSignal<usize> = RwSignal::new(0);
    let sidebar_items: RwSignal<Vec<String>> = RwSignal::new(Vec::new());
    let load_state: RwSignal<LoadState> = RwSignal::new(LoadState::Loading);

    let commands = MapCommands {
        dataset,
        controller,
        viewport,
        popup,
        markers,
        open_marker,
    };

    provide_context(dataset);
    provide_context(controller);
    provide_context(viewport);
    provide_context(mouse_pos);
    provide_context(markers);
    provide_context(popup);
    provide_context(commands);
    provide_context(Hovered(hovered));
    provide_context(SearchQuery(search_query));
    provide_context(SidebarOpen(sidebar_open));
    provide_context(SidebarIndex(sidebar_index));
    provide_context(SidebarItems(sidebar_items));
    provide_context(OpenMarker(open_marker));
    provide_context(DatasetLoad(load_state));

    set_loading_shell_step("Loading area data");
    spawn_local(async move {
        match fetch_dataset().await {
            Ok(ds) => {
                let stats = ds.stats();
                web_sys::console::info_1(
                    &format!(
                        "dataset: {} areas, {} points of interest",
                        stats.area_count, stats.point_count
                    )
                    .into(),
                );
                controller.set(SelectionController::new(ds.rendered_names()));
                dataset.set(ds);
                load_state.set(LoadState::Ready);
            }
            Err(e) => {
                web_sys::console::warn_1(&format!("dataset load failed: {e}").into());
                load_state.set(LoadState::Failed);
            }
        }
        remove_loading_shell();
    });

    // Global keyboard shortcuts
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                let target_tag = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .map(|el| el.tag_name())
                    .unwrap_or_default();

                // Don't intercept when typing in an input
                if target_tag == "INPUT" || target_tag == "TEXTAREA" {
                    if key == "Escape"
                        && let Some(el) = e
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    {
                        el.blur().ok();
                    }
                    return;
                }

                match key.as_str() {
                    "Escape" => {
                        if open_marker.get_untracked().is_some() {
                            commands.dispatch(MapCommand::CloseMarkerPopup);
                        } else {
                            commands.dispatch(MapCommand::ClosePopup);
                        }
                    }
                    "/" => {
                        e.prevent_default();
                        let Some(window) = web_sys::window() else {
                            return;
                        };
                        let Some(doc) = window.document() else {
                            return;
                        };
                        if let Some(el) = doc.query_selector("[data-search-input]").ok().flatten()
                            && let Ok(input) = el.dyn_into::<web_sys::HtmlElement>()
                        {
                            input.focus().ok();
                        }
                    }
                    "m" => commands.dispatch(MapCommand::ClearMarkers),
                    "r" | "0" => commands.dispatch(MapCommand::ResetView),
                    "j" | "ArrowDown" => {
                        e.prevent_default();
                        let len = sidebar_items.with_untracked(Vec::len);
                        if len > 0 {
                            sidebar_index.update(|i| *i = (*i + 1).min(len - 1));
                        }
                    }
                    "k" | "ArrowUp" => {
                        e.prevent_default();
                        if sidebar_items.with_untracked(|items| !items.is_empty()) {
                            sidebar_index.update(|i| *i = i.saturating_sub(1));
                        }
                    }
                    "Enter" => {
                        let idx = sidebar_index.get_untracked();
                        if let Some(name) = sidebar_items.with_untracked(|items| items.get(idx).cloned())
                        {
                            if !sidebar_open.get_untracked() {
                                sidebar_open.set(true);
                            }
                            commands.dispatch(MapCommand::SelectArea(name));
                        }
                    }
                    "ArrowLeft" => {
                        e.prevent_default();
                        viewport.update(|vp| vp.pan(80.0, 0.0));
                    }
                    "ArrowRight" => {
                        e.prevent_default();
                        viewport.update(|vp| vp.pan(-80.0, 0.0));
                    }
                    "+" | "=" => {
                        e.prevent_default();
                        let (cw, ch) = canvas_dimensions();
                        viewport.update(|vp| vp.zoom_at(-120.0, cw / 2.0, ch / 2.0));
                    }
                    "-" => {
                        e.prevent_default();
                        let (cw, ch) = canvas_dimensions();
                        viewport.update(|vp| vp.zoom_at(120.0, cw / 2.0, ch / 2.0));
                    }
                    _ => {}
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative;">
            <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #aad3df;">
                <MapCanvas />
                <AreaInfoPopup />
                <MarkerPopup />
            </div>
            <div
                class="sidebar-wrapper"
                style={format!(
                    "position: absolute; top: 0; right: 0; height: 100%; width: {SIDEBAR_WIDTH}px; z-index: 10; transition: transform 0.2s ease;"
                )}
                style:transform=move || if sidebar_open.get() { "translateX(0)" } else { "translateX(100%)" }
                style:pointer-events=move || if sidebar_open.get() { "auto" } else { "none" }
            >
                <SidebarToggle />
                <Sidebar />
            </div>
        </div>
        <Tooltip />
    }
}

/// Toggle button for showing/hiding the sidebar. Attached to the sidebar's left edge.
#[component]
fn SidebarToggle() -> impl IntoView {
    let SidebarOpen(sidebar_open) = expect_context();

    view! {
        <button
            class="sidebar-toggle"
            title=move || if sidebar_open.get() { "Hide sidebar" } else { "Show sidebar" }
            style="position: absolute; top: 16px; left: -44px; z-index: 11; width: 32px; height: 32px; background: #13161f; border: 1px solid #282c3e; border-radius: 6px; cursor: pointer; display: flex; align-items: center; justify-content: center; color: #9a9590; font-family: 'JetBrains Mono', monospace; font-size: 1.1rem; line-height: 1; pointer-events: auto;"
            on:click=move |_| sidebar_open.update(|v| *v = !*v)
        >
            {move || if sidebar_open.get() { "\u{00BB}" } else { "\u{00AB}" }}
        </button>
    }
}

/// Tooltip that follows the mouse cursor when hovering an area.
#[component]
fn Tooltip() -> impl IntoView {
    let Hovered(hovered) = expect_context();
    let dataset: RwSignal<Dataset> = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();

    let tooltip_info = Memo::new(move |_| {
        let name = hovered.get()?;
        let population = dataset.with(|ds| ds.area(&name).map(|a| a.population))?;
        Some((name, population))
    });

    view! {
        {move || {
            let Some((name, population)) = tooltip_info.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            let (x, y) = mouse_pos.get();
            let swatch = area_color(&name);
            view! {
                <div
                    class="tooltip-animate"
                    style:left=format!("{}px", x + 16.0)
                    style:top=format!("{}px", y - 8.0)
                    style="position: fixed; pointer-events: none; z-index: 100; background: #161921; border: 1px solid #282c3e; border-radius: 6px; overflow: hidden; box-shadow: 0 4px 16px rgba(0,0,0,0.5); max-width: 240px; display: flex; flex-direction: row;"
                >
                    <div style={format!("width: 3px; flex-shrink: 0; background: {swatch};")} />
                    <div style="padding: 8px 10px; flex: 1;">
                        <div style="font-size: 0.82rem; font-weight: 700; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; line-height: 1.3;">
                            {name}
                        </div>
                        <div style="font-size: 0.65rem; margin-top: 5px; padding-top: 4px; border-top: 1px solid rgba(40,44,62,0.5); display: flex; justify-content: space-between; align-items: center; gap: 8px;">
                            <span style="color: #9a9590; font-family: 'Inter', system-ui, sans-serif;">"Population"</span>
                            <span style="color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-variant-numeric: tabular-nums;">{format_count(population)}</span>
                        </div>
                        <div style="font-size: 0.6rem; color: #5a5860; margin-top: 4px; font-family: 'Inter', system-ui, sans-serif;">
                            "Click for details"
                        </div>
                    </div>
                </div>
            }.into_any()
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curacao_shared::LonLat;

    #[test]
    fn initial_bounds_cover_the_island() {
        let b = initial_bounds();
        assert!(!b.is_empty());
        assert!(b.contains(LonLat::new(-68.93, 12.11)));
    }
}
