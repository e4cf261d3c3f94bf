use leptos::prelude::*;
use wasm_bindgen::JsCast;

use curacao_shared::{
    AreaRecord, Dataset, MarkerOverlay, SelectionController, area_color, filter_areas,
    format_count,
};

use crate::app::{
    DatasetLoad, LoadState, MapCommand, MapCommands, SearchQuery, SidebarIndex, SidebarItems,
    SidebarOpen,
};

#[component]
pub fn Sidebar() -> impl IntoView {
    let SidebarOpen(sidebar_open) = expect_context();
    let SidebarIndex(sidebar_index) = expect_context();

    // Scroll focused item into view when index changes
    Effect::new(move || {
        if !sidebar_open.get() {
            return;
        }
        let idx = sidebar_index.get();
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(doc) = window.document() else {
            return;
        };
        let Ok(Some(scroll_el)) = doc.query_selector("[data-sidebar-scroll]") else {
            return;
        };
        let Ok(scroll_el) = scroll_el.dyn_into::<web_sys::HtmlElement>() else {
            return;
        };
        let Ok(Some(item_el)) = scroll_el.query_selector(&format!("[data-sidebar-idx='{}']", idx))
        else {
            return;
        };
        let Ok(item_el) = item_el.dyn_into::<web_sys::HtmlElement>() else {
            return;
        };

        // Adjust only the sidebar's own scroll position, never the page.
        let scroll_rect = scroll_el.get_bounding_client_rect();
        let item_rect = item_el.get_bounding_client_rect();
        let current_top = scroll_el.scroll_top();
        if item_rect.top() < scroll_rect.top() {
            let delta = (item_rect.top() - scroll_rect.top()).floor() as i32;
            scroll_el.set_scroll_top(current_top + delta);
        } else if item_rect.bottom() > scroll_rect.bottom() {
            let delta = (item_rect.bottom() - scroll_rect.bottom()).ceil() as i32;
            scroll_el.set_scroll_top(current_top + delta);
        }
    });

    view! {
        <div
            class="sidebar-inner"
            style:display=move || if sidebar_open.get() { "flex" } else { "none" }
            style="width: 100%; min-width: 100%; height: 100%; background: #13161f; border-left: 1px solid #282c3e; display: flex; flex-direction: column; z-index: 10; box-shadow: -4px 0 20px rgba(0,0,0,0.4);"
        >
            <SidebarHeader />
            <SearchBar />
            <div data-sidebar-scroll="" class="scrollbar-thin" style="flex: 1; overflow-y: auto;">
                <AreaList />
                <InstructionsPanel />
            </div>
            <StatsBar />
        </div>
    }
}

#[component]
fn SidebarHeader() -> impl IntoView {
    view! {
        <div style="padding: 20px 24px 16px; border-bottom: 1px solid #282c3e;">
            <div style="font-family: 'Inter', system-ui, sans-serif; font-size: 1.25rem; font-weight: 700; letter-spacing: 0.18em; text-transform: uppercase; color: #f5c542;">"Cura\u{00E7}ao"</div>
            <div style="font-family: 'Inter', system-ui, sans-serif; font-size: 0.72rem; color: #5a5860; margin-top: 3px; letter-spacing: 0.08em;">
                "Areas, population & churches"
            </div>
        </div>
    }
}

#[component]
fn SearchBar() -> impl IntoView {
    let SearchQuery(search_query) = expect_context();

    let on_input = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(input) = target.dyn_into::<web_sys::HtmlInputElement>() else {
            return;
        };
        search_query.set(input.value());
    };

    view! {
        <div style="padding: 12px 24px; border-bottom: 1px solid #282c3e;">
            <div style="position: relative;">
                <div style="position: absolute; left: 12px; top: 50%; transform: translateY(-50%); pointer-events: none; color: #5a5860; width: 14px; height: 14px;">
                    <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 20" fill="currentColor" width="14" height="14">
                        <path fill-rule="evenodd" d="M9 3.5a5.5 5.5 0 100 11 5.5 5.5 0 000-11zM2 9a7 7 0 1112.452 4.391l3.328 3.329a.75.75 0 11-1.06 1.06l-3.329-3.328A7 7 0 012 9z" clip-rule="evenodd" />
                    </svg>
                </div>
                <input
                    data-search-input=""
                    style="width: 100%; padding: 10px 14px 10px 34px; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; font-size: 0.9rem; outline: none; box-sizing: border-box;"
                    type="text"
                    placeholder="Search areas..."
                    prop:value=move || search_query.get()
                    on:input=on_input
                    on:focus=|e| {
                        if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                            el.style().set_property("border-color", "#f5c542").ok();
                        }
                    }
                    on:blur=|e| {
                        if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                            el.style().set_property("border-color", "#282c3e").ok();
                        }
                    }
                />
                <div style="position: absolute; right: 10px; top: 50%; transform: translateY(-50%); font-family: 'JetBrains Mono', monospace; font-size: 0.62rem; color: #3a3f5c; background: #13161f; padding: 1px 5px; border-radius: 3px; border: 1px solid #282c3e; pointer-events: none;">"/"</div>
            </div>
        </div>
    }
}

/// Area names matching the search box, in dataset order.
#[component]
fn AreaList() -> impl IntoView {
    let SearchQuery(search_query) = expect_context();
    let DatasetLoad(load_state) = expect_context();
    let dataset: RwSignal<Dataset> = expect_context();
    let controller: RwSignal<SelectionController> = expect_context();
    let commands: MapCommands = expect_context();
    let SidebarIndex(sidebar_index) = expect_context();
    let SidebarItems(sidebar_items) = expect_context();

    let filtered = Memo::new(move |_| {
        let query = search_query.get();
        dataset.with(|ds| {
            filter_areas(&ds.areas, &query)
                .into_iter()
                .cloned()
                .collect::<Vec<AreaRecord>>()
        })
    });

    // Sync sidebar items for keyboard navigation
    Effect::new(move || {
        let items: Vec<String> = filtered.with(|f| f.iter().map(|a| a.name.clone()).collect());
        let prev = sidebar_items.get_untracked();
        if items != prev {
            sidebar_index.set(0);
            sidebar_items.set(items);
        }
    });

    let selected_name = Memo::new(move |_| controller.with(|c| c.selected().map(str::to_string)));
    // Keep the keyboard cursor on the area picked from the map.
    Effect::new(move || {
        let Some(name) = selected_name.get() else {
            return;
        };
        if let Some(idx) = filtered.with_untracked(|f| f.iter().position(|a| a.name == name)) {
            sidebar_index.set(idx);
        }
    });

    let result_count = Memo::new(move |_| filtered.with(Vec::len));
    let total = Memo::new(move |_| dataset.with(|ds| ds.areas.len()));

    view! {
        <div style="border-bottom: 1px solid #282c3e;">
            <div style="padding: 14px 24px 8px; display: flex; align-items: baseline; justify-content: space-between;">
                <span style="font-family: 'Inter', system-ui, sans-serif; font-size: 0.78rem; font-weight: 600; text-transform: uppercase; letter-spacing: 0.14em; color: #5a5860;">"Areas"</span>
                <span style="font-family: 'JetBrains Mono', monospace; font-size: 0.65rem; color: #3a3f5c;">
                    {move || {
                        let (shown, total) = (result_count.get(), total.get());
                        if shown == total { format!("{total}") } else { format!("{shown} of {total}") }
                    }}
                </span>
            </div>
            {move || match load_state.get() {
                LoadState::Loading => view! {
                    <div style="padding: 8px 24px 16px; font-size: 0.8rem; color: #5a5860; font-family: 'Inter', system-ui, sans-serif;">"Loading areas..."</div>
                }.into_any(),
                LoadState::Failed => view! {
                    <div style="padding: 8px 24px 16px; font-size: 0.8rem; color: #e06c5a; font-family: 'Inter', system-ui, sans-serif;">"Area data could not be loaded."</div>
                }.into_any(),
                LoadState::Ready if result_count.get() == 0 => view! {
                    <div style="padding: 8px 24px 16px; font-size: 0.8rem; color: #5a5860; font-family: 'Inter', system-ui, sans-serif;">"No matching areas"</div>
                }.into_any(),
                LoadState::Ready => ().into_any(),
            }}
            <div style="padding: 0 12px 12px;">
                <For
                    each={move || filtered.get().into_iter().enumerate().collect::<Vec<_>>()}
                    key=|(idx, area)| (*idx, area.name.clone())
                    children=move |(list_idx, area)| {
                        let name = area.name.clone();
                        let name_for_click = name.clone();
                        let name_for_style = name.clone();
                        let swatch = area_color(&name);
                        let is_selected = move || selected_name.get().as_deref() == Some(name_for_style.as_str());
                        let is_selected_bg = is_selected.clone();
                        let is_selected_weight = is_selected.clone();
                        view! {
                            <div
                                data-sidebar-idx={list_idx.to_string()}
                                style="display: flex; align-items: center; gap: 10px; padding: 7px 10px; border-radius: 4px; cursor: pointer; transition: background 0.15s, box-shadow 0.15s;"
                                style:box-shadow=move || if sidebar_index.get() == list_idx { "inset 2px 0 0 #f5c542" } else { "none" }
                                style:background=move || if is_selected_bg() { "rgba(245,197,66,0.10)" } else { "transparent" }
                                on:click=move |_| {
                                    sidebar_index.set(list_idx);
                                    commands.dispatch(MapCommand::SelectArea(name_for_click.clone()));
                                }
                            >
                                <div style={format!("width: 14px; height: 14px; border-radius: 3px; border: 1px solid rgba(255,255,255,0.1); flex-shrink: 0; background: {swatch};")} />
                                <div style="flex: 1; min-width: 0;">
                                    <div
                                        style="font-size: 0.88rem; font-family: 'Inter', system-ui, sans-serif; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;"
                                        style:color=move || if is_selected() { "#f5c542" } else { "#e2e0d8" }
                                        style:font-weight=move || if is_selected_weight() { "700" } else { "400" }
                                    >
                                        {name}
                                    </div>
                                    <div style="font-size: 0.72rem; color: #9a9590; font-family: 'JetBrains Mono', monospace;">
                                        {format!("pop. {}", format_count(area.population))}
                                    </div>
                                </div>
                            </div>
                        }
                    }
                />
            </div>
        </div>
    }
}

#[component]
fn InstructionsPanel() -> impl IntoView {
    let expanded = RwSignal::new(true);
    let rows: [(&'static str, &'static str); 8] = [
        ("click", "Select an area"),
        ("/", "Search areas"),
        ("j k", "Move through the list"),
        ("enter", "Select highlighted area"),
        ("+ -", "Zoom"),
        ("r", "Reset view"),
        ("m", "Hide church markers"),
        ("esc", "Close popup"),
    ];

    view! {
        <div style="padding: 12px 24px 16px;">
            <button
                style="background: none; border: none; padding: 0; cursor: pointer; display: flex; width: 100%; justify-content: space-between; align-items: baseline; font-family: 'Inter', system-ui, sans-serif; font-size: 0.78rem; font-weight: 600; text-transform: uppercase; letter-spacing: 0.14em; color: #5a5860;"
                on:click=move |_| expanded.update(|v| *v = !*v)
            >
                <span>"How to use"</span>
                <span style="font-family: 'JetBrains Mono', monospace;">{move || if expanded.get() { "\u{2212}" } else { "+" }}</span>
            </button>
            <Show when=move || expanded.get()>
                <div style="margin-top: 8px; font-size: 0.75rem; color: #9a9590; font-family: 'Inter', system-ui, sans-serif; line-height: 1.5;">
                    <p style="margin: 0 0 8px;">
                        "Hover an area to see its name, click it to zoom in and read about it. Use the popup to show the churches in that area."
                    </p>
                    {rows
                        .into_iter()
                        .map(|(key, action)| view! {
                            <div style="display: flex; justify-content: space-between; gap: 8px; padding: 2px 0;">
                                <span>{action}</span>
                                <span style="font-family: 'JetBrains Mono', monospace; font-size: 0.65rem; color: #e2e0d8; background: #1a1d2a; padding: 1px 5px; border-radius: 3px; border: 1px solid #282c3e;">{key}</span>
                            </div>
                        })
                        .collect_view()}
                </div>
            </Show>
        </div>
    }
}

#[component]
fn StatsBar() -> impl IntoView {
    let dataset: RwSignal<Dataset> = expect_context();
    let markers: RwSignal<MarkerOverlay> = expect_context();

    let stats = Memo::new(move |_| dataset.with(Dataset::stats));
    let marker_count = Memo::new(move |_| markers.with(MarkerOverlay::len));

    view! {
        <div style="padding: 10px 16px; border-top: 1px solid #282c3e; display: flex; align-items: center; justify-content: space-between; gap: 8px; font-family: 'JetBrains Mono', monospace; font-size: 0.68rem; color: #6a6870;">
            <span title="Areas">{move || format!("{} areas", stats.get().area_count)}</span>
            <span title="Total population">{move || format!("{} people", format_count(stats.get().total_population))}</span>
            <span title="Total households">{move || format!("{} hh", format_count(stats.get().total_households))}</span>
            <span title="Church markers shown / total">
                {move || format!("\u{271D} {}/{}", marker_count.get(), stats.get().point_count)}
            </span>
        </div>
    }
}
