use leptos::prelude::*;

use curacao_shared::geo::project;
use curacao_shared::poi::count_for_area;
use curacao_shared::{AreaPopup, Dataset, LonLat, MarkerOverlay, area_color, format_count, format_income};

use crate::app::{MapCommand, MapCommands, OpenMarker};
use crate::viewport::Viewport;

const CARD_STYLE: &str = "position: absolute; z-index: 6; transform: translate(-50%, calc(-100% - 14px)); width: 300px; background: #161921; border: 1px solid #282c3e; border-radius: 8px; box-shadow: 0 6px 24px rgba(0,0,0,0.5); color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;";
const CLOSE_STYLE: &str = "background: none; border: none; color: #5a5860; cursor: pointer; font-size: 1.1rem; line-height: 1; padding: 0 2px;";
const ARROW_STYLE: &str = "position: absolute; left: 50%; bottom: -7px; width: 12px; height: 12px; background: #161921; border-right: 1px solid #282c3e; border-bottom: 1px solid #282c3e; transform: translateX(-50%) rotate(45deg);";

/// Canvas position of a geographic anchor under the current view.
fn screen_anchor(viewport: RwSignal<Viewport>, anchor: LonLat) -> (f64, f64) {
    let (wx, wy) = project(anchor);
    viewport.with(|vp| vp.world_to_screen(wx, wy))
}

/// Popup for the selected area. Shows a loading note until the info lookup
/// resolves, then the summary alongside the area's figures.
#[component]
pub fn AreaInfoPopup() -> impl IntoView {
    let popup: RwSignal<Option<AreaPopup>> = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();

    let position = Memo::new(move |_| {
        let anchor = popup.with(|p| p.as_ref().map(|p| p.anchor))?;
        Some(screen_anchor(viewport, anchor))
    });

    view! {
        <Show when=move || position.get().is_some()>
            <div
                style=CARD_STYLE
                style:left=move || format!("{}px", position.get().map_or(0.0, |p| p.0))
                style:top=move || format!("{}px", position.get().map_or(0.0, |p| p.1))
            >
                {move || popup.get().map(|open| view! { <AreaPopupBody open=open /> })}
                <div style=ARROW_STYLE />
            </div>
        </Show>
    }
}

#[component]
fn AreaPopupBody(open: AreaPopup) -> impl IntoView {
    let dataset: RwSignal<Dataset> = expect_context();
    let commands: MapCommands = expect_context();

    let AreaPopup { area, summary, .. } = open;
    let title = summary
        .as_ref()
        .map_or_else(|| area.clone(), |s| s.title.clone());
    let record = dataset.with_untracked(|ds| ds.area(&area).cloned());

    let body = match summary {
        None => view! {
            <div style="padding: 4px 14px 12px; font-size: 0.8rem; color: #9a9590;">"Loading information..."</div>
        }
        .into_any(),
        Some(summary) => {
            let extract = summary.display_extract();
            view! {
                <div style="padding: 0 14px 10px;">
                    {summary.thumbnail_url.map(|src| view! {
                        <img src=src alt="" style="width: 100%; max-height: 140px; object-fit: cover; border-radius: 4px; margin-bottom: 8px; display: block;" />
                    })}
                    <p style="margin: 0; font-size: 0.8rem; line-height: 1.45; color: #c8c6be;">{extract}</p>
                    {summary.source_url.map(|href| view! {
                        <a href=href target="_blank" rel="noopener" style="display: inline-block; margin-top: 6px; font-size: 0.75rem; color: #f5c542; text-decoration: none;">
                            "Read more on Wikipedia \u{2192}"
                        </a>
                    })}
                </div>
            }
            .into_any()
        }
    };

    let figures = record.map(|r| {
        let per_household = r
            .persons_per_household()
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
        let rows = [
            ("Population", format_count(r.population)),
            ("Households", format_count(r.households)),
            ("Mean income", format_income(r.mean_income)),
            ("Persons / household", per_household),
        ];
        view! {
            <div style="padding: 8px 14px; border-top: 1px solid rgba(40,44,62,0.7);">
                {rows
                    .into_iter()
                    .map(|(label, value)| view! {
                        <div style="display: flex; justify-content: space-between; gap: 8px; font-size: 0.72rem; padding: 1px 0;">
                            <span style="color: #9a9590;">{label}</span>
                            <span style="font-family: 'JetBrains Mono', monospace; font-variant-numeric: tabular-nums;">{value}</span>
                        </div>
                    })
                    .collect_view()}
            </div>
        }
    });

    let swatch = area_color(&area);

    view! {
        <div style="display: flex; align-items: center; gap: 8px; padding: 10px 10px 8px 14px;">
            <div style={format!("width: 10px; height: 10px; border-radius: 2px; flex-shrink: 0; background: {swatch};")} />
            <div style="flex: 1; min-width: 0; font-size: 0.92rem; font-weight: 700; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{title}</div>
            <button title="Close (esc)" style=CLOSE_STYLE on:click=move |_| commands.dispatch(MapCommand::ClosePopup)>"\u{00D7}"</button>
        </div>
        {body}
        {figures}
        <ChurchToggle area=area />
    }
}

/// Show or hide the church markers belonging to `area`.
#[component]
fn ChurchToggle(area: String) -> impl IntoView {
    let dataset: RwSignal<Dataset> = expect_context();
    let markers: RwSignal<MarkerOverlay> = expect_context();
    let commands: MapCommands = expect_context();

    let count = dataset.with_untracked(|ds| count_for_area(&ds.points, &area));
    let area_for_check = area.clone();
    let showing = Memo::new(move |_| {
        markers.with(|m| !m.is_empty() && m.area() == Some(area_for_check.as_str()))
    });

    let button_style = "width: 100%; padding: 7px 10px; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 5px; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; font-size: 0.75rem; cursor: pointer;";

    view! {
        <div style="padding: 8px 14px 12px; border-top: 1px solid rgba(40,44,62,0.7);">
            {move || {
                if count == 0 {
                    view! { <div style="font-size: 0.72rem; color: #5a5860;">"No churches recorded in this area"</div> }.into_any()
                } else if showing.get() {
                    view! {
                        <button style=button_style on:click=move |_| commands.dispatch(MapCommand::ClearMarkers)>
                            "Hide churches"
                        </button>
                    }
                    .into_any()
                } else {
                    let area = area.clone();
                    view! {
                        <button
                            style=button_style
                            on:click=move |_| commands.dispatch(MapCommand::ShowMarkers(area.clone()))
                        >
                            {format!("Show churches ({count})")}
                        </button>
                    }
                    .into_any()
                }
            }}
        </div>
    }
}

/// Popup for a clicked church marker.
#[component]
pub fn MarkerPopup() -> impl IntoView {
    let dataset: RwSignal<Dataset> = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let commands: MapCommands = expect_context();
    let OpenMarker(open_marker) = expect_context();

    let point = Memo::new(move |_| {
        let index = open_marker.get()?;
        dataset.with(|ds| ds.points.get(index).cloned())
    });
    let position = Memo::new(move |_| {
        let anchor = point.with(|p| p.as_ref().map(|p| p.position()))?;
        Some(screen_anchor(viewport, anchor))
    });

    view! {
        <Show when=move || position.get().is_some()>
            <div
                style=CARD_STYLE
                style:left=move || format!("{}px", position.get().map_or(0.0, |p| p.0))
                style:top=move || format!("{}px", position.get().map_or(0.0, |p| p.1 - 6.0))
            >
                {move || point.get().map(|poi| view! {
                    <div style="display: flex; align-items: center; gap: 8px; padding: 10px 10px 8px 14px;">
                        <div style="flex: 1; min-width: 0;">
                            <div style="font-size: 0.9rem; font-weight: 700;">{poi.name.clone()}</div>
                            <div style="font-size: 0.7rem; color: #9a9590; margin-top: 2px;">{poi.area_name.clone()}</div>
                        </div>
                        <button title="Close (esc)" style=CLOSE_STYLE on:click=move |_| commands.dispatch(MapCommand::CloseMarkerPopup)>"\u{00D7}"</button>
                    </div>
                    <div style="padding: 0 14px 12px;">
                        {poi.photo_url.clone().map(|src| view! {
                            <img src=src alt=poi.name.clone() style="width: 100%; max-height: 160px; object-fit: cover; border-radius: 4px; margin-bottom: 8px; display: block;" />
                        })}
                        {poi.description.clone().map(|text| view! {
                            <p style="margin: 0; font-size: 0.78rem; line-height: 1.45; color: #c8c6be;">{text}</p>
                        })}
                    </div>
                })}
                <div style=ARROW_STYLE />
            </div>
        </Show>
    }
}
