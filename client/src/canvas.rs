use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, CanvasWindingRule, HtmlCanvasElement, MouseEvent, PointerEvent,
    WheelEvent,
};

use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;

use curacao_shared::colors::{ACCENT, hex_with_alpha};
use curacao_shared::geo::{Shape, project};
use curacao_shared::{Dataset, DisplayState, FeatureStyle, MarkerOverlay, SelectionController};

use crate::app::{Hovered, MapCommand, MapCommands, OpenMarker, canvas_dimensions};
use crate::config::{CLICK_SLOP_PX, MARKER_RADIUS_PX, TILE_ATTRIBUTION, TILE_ATTRIBUTION_URL};
use crate::render_loop::FrameScheduler;
use crate::spatial::SpatialGrid;
use crate::tiles::{self, TileCache, TileKey};
use crate::viewport::Viewport;

const SEA_COLOR: &str = "#aad3df";
const MARKER_FILL: &str = "#7c3aed";
const LABEL_INK: &str = "#1b1b1b";
const LABEL_FONT: &str = "600 12px Inter, system-ui, sans-serif";
const LABEL_FONT_EMPHASIZED: &str = "700 14px Inter, system-ui, sans-serif";
/// Extra touch tolerance around marker circles.
const MARKER_HIT_SLOP_PX: f64 = 3.0;

struct ResizeBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

#[component]
pub fn MapCanvas() -> impl IntoView {
    let dataset: RwSignal<Dataset> = expect_context();
    let controller: RwSignal<SelectionController> = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let markers: RwSignal<MarkerOverlay> = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();
    let commands: MapCommands = expect_context();
    let Hovered(hovered) = expect_context();
    let OpenMarker(open_marker) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Track drag state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    // Track pinch state
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    let spatial_grid: Rc<RefCell<SpatialGrid>> = Rc::new(RefCell::new(SpatialGrid::build(&[])));
    let tile_cache = TileCache::shared();
    // Bumped per finished tile so the redraw effect picks it up.
    let tile_revision: RwSignal<u64> = RwSignal::new(0);
    let on_tile_ready: Rc<dyn Fn()> = Rc::new(move || tile_revision.update(|r| *r += 1));

    let scheduler = FrameScheduler::new({
        let tile_cache = tile_cache.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let Some((ctx, w, h)) = prepare_canvas(&canvas) else {
                return;
            };
            let vp = viewport.get_untracked();
            let keys = tiles::visible_tiles(&vp, w, h);
            tiles::request_tiles(&tile_cache, &keys, on_tile_ready.clone());

            let cache = tile_cache.borrow();
            dataset.with_untracked(|ds| {
                controller.with_untracked(|sel| {
                    markers.with_untracked(|overlay| {
                        render_frame(FrameInput {
                            ctx: &ctx,
                            w,
                            h,
                            vp: &vp,
                            dataset: ds,
                            controller: sel,
                            markers: overlay,
                            open_marker: open_marker.get_untracked(),
                            tile_cache: &cache,
                            tile_keys: &keys,
                        });
                    });
                });
            });
        }
    });

    // Rebuild the hit grid whenever the dataset changes
    Effect::new({
        let grid = spatial_grid.clone();
        move || {
            dataset.with(|ds| {
                *grid.borrow_mut() = SpatialGrid::build(&ds.features);
            });
        }
    });

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            dataset.track();
            controller.track();
            viewport.track();
            markers.track();
            open_marker.track();
            tile_revision.track();
            scheduler.request();
        }
    });

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            use wasm_bindgen::prelude::*;

            let Some(window) = web_sys::window() else {
                return;
            };
            RESIZE_BINDING.with(|slot| {
                if let Some(old) = slot.borrow_mut().take() {
                    let _ = old.window.remove_event_listener_with_callback(
                        "resize",
                        old._handler.as_ref().unchecked_ref(),
                    );
                }
            });

            let scheduler = scheduler.clone();
            let handler = Closure::<dyn Fn()>::new(move || scheduler.request());
            if window
                .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
                .is_ok()
            {
                RESIZE_BINDING.with(|slot| {
                    *slot.borrow_mut() = Some(ResizeBinding {
                        window: window.clone(),
                        _handler: handler,
                    });
                });
            }
        }
    });

    // Moves the pointer highlight from the previous area to `next`.
    let set_hover = move |next: Option<String>| {
        let prev = hovered.get_untracked();
        if prev == next {
            return;
        }
        controller.update(|c| {
            if let Some(name) = prev.as_deref() {
                c.pointer_leave(name);
            }
            if let Some(name) = next.as_deref() {
                c.pointer_enter(name);
            }
        });
        hovered.set(next);
    };

    let local_point = move |client_x: f64, client_y: f64, fallback: (f64, f64)| {
        canvas_ref
            .get_untracked()
            .map(|el| {
                let rect = el.get_bounding_client_rect();
                (client_x - rect.left(), client_y - rect.top())
            })
            .unwrap_or(fallback)
    };

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewport.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            set_hover(None);
            drag_start_x.set(e.client_x() as f64);
            drag_start_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let grid = spatial_grid.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                viewport.update(|vp| vp.pan(dx, dy));
                return;
            }

            let (sx, sy) = local_point(
                e.client_x() as f64,
                e.client_y() as f64,
                (e.offset_x() as f64, e.offset_y() as f64),
            );
            let vp = viewport.get_untracked();
            let over_marker = dataset.with_untracked(|ds| {
                markers.with_untracked(|m| marker_at(ds, m, &vp, sx, sy).is_some())
            });
            let (wx, wy) = vp.screen_to_world(sx, sy);
            let hit = if over_marker {
                None
            } else {
                dataset.with_untracked(|ds| {
                    grid.borrow()
                        .find_at(&ds.features, wx, wy)
                        .and_then(|i| ds.features.get(i))
                        .map(|f| f.name.clone())
                })
            };
            let clickable = over_marker || hit.is_some();
            set_hover(hit);
            if hovered.get_untracked().is_some() {
                mouse_pos.set((e.client_x() as f64, e.client_y() as f64));
            }
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                let cursor = if clickable { "pointer" } else { "grab" };
                el.style().set_property("cursor", cursor).ok();
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let grid = spatial_grid.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - drag_start_x.get()).abs();
            let dy = (e.client_y() as f64 - drag_start_y.get()).abs();
            if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
                return;
            }

            let (sx, sy) = local_point(
                e.client_x() as f64,
                e.client_y() as f64,
                (e.offset_x() as f64, e.offset_y() as f64),
            );
            let vp = viewport.get_untracked();
            let marker = dataset
                .with_untracked(|ds| markers.with_untracked(|m| marker_at(ds, m, &vp, sx, sy)));
            if let Some(index) = marker {
                commands.dispatch(MapCommand::FocusMarker(index));
                return;
            }

            let (wx, wy) = vp.screen_to_world(sx, sy);
            let hit = dataset.with_untracked(|ds| {
                grid.borrow()
                    .find_at(&ds.features, wx, wy)
                    .and_then(|i| ds.features.get(i))
                    .map(|f| f.name.clone())
            });
            if let Some(name) = hit {
                commands.dispatch(MapCommand::SelectArea(name));
            }
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        set_hover(None);
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                pinch_dist.set((dx * dx + dy * dy).sqrt());
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                let new_dist = (dx * dx + dy * dy).sqrt();
                let old_dist = pinch_dist.get();

                if old_dist > 0.0 {
                    let (mid_x, mid_y) = local_point(
                        (t0.client_x() + t1.client_x()) as f64 / 2.0,
                        (t0.client_y() + t1.client_y()) as f64 / 2.0,
                        (0.0, 0.0),
                    );
                    let delta = -(new_dist - old_dist) * 2.0;
                    viewport.update(|vp| vp.zoom_at(delta, mid_x, mid_y));
                }

                pinch_dist.set(new_dist);
            }
        }
    };

    view! {
        <div style="position: relative; width: 100%; height: 100%; overflow: hidden;">
            <div
                style="position: absolute; inset: 0;"
                on:wheel=on_wheel
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointerleave=on_pointer_leave
                on:click=on_click
                on:touchstart=on_touch_start
                on:touchmove=on_touch_move
            >
                <canvas
                    node_ref=canvas_ref
                    style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
                />
            </div>
            <ZoomControls />
            <div style="position: absolute; right: 0; bottom: 0; z-index: 5; padding: 2px 6px; background: rgba(255,255,255,0.8); font-size: 0.68rem; font-family: 'Inter', system-ui, sans-serif; color: #333;">
                <a href=TILE_ATTRIBUTION_URL target="_blank" rel="noopener" style="color: #0078a8; text-decoration: none;">
                    {TILE_ATTRIBUTION}
                </a>
            </div>
        </div>
    }
}

#[component]
fn ZoomControls() -> impl IntoView {
    let viewport: RwSignal<Viewport> = expect_context();
    let commands: MapCommands = expect_context();

    let zoom_by = move |delta: f64| {
        let (cw, ch) = canvas_dimensions();
        viewport.update(|vp| vp.zoom_at(delta, cw / 2.0, ch / 2.0));
    };
    let button_style = "width: 30px; height: 30px; background: #13161f; border: 1px solid #282c3e; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 1rem; cursor: pointer; display: flex; align-items: center; justify-content: center;";

    view! {
        <div style="position: absolute; top: 12px; left: 12px; z-index: 5; display: flex; flex-direction: column; gap: 2px; border-radius: 6px; overflow: hidden; box-shadow: 0 2px 8px rgba(0,0,0,0.35);">
            <button title="Zoom in" style=button_style on:click=move |_| zoom_by(-240.0)>"+"</button>
            <button title="Zoom out" style=button_style on:click=move |_| zoom_by(240.0)>"\u{2212}"</button>
            <button title="Reset view (r)" style=button_style on:click=move |_| commands.dispatch(MapCommand::ResetView)>"\u{2302}"</button>
        </div>
    }
}

/// Size the backing store to the element's CSS box at device pixel ratio and
/// return a context drawing in CSS pixels.
fn prepare_canvas(canvas: &HtmlCanvasElement) -> Option<(CanvasRenderingContext2d, f64, f64)> {
    let rect = canvas.get_bounding_client_rect();
    let (w, h) = (rect.width(), rect.height());
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let dpr = web_sys::window()
        .map(|window| window.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0);
    let (pw, ph) = ((w * dpr).round() as u32, (h * dpr).round() as u32);
    if canvas.width() != pw || canvas.height() != ph {
        canvas.set_width(pw);
        canvas.set_height(ph);
    }

    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()?;
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok()?;
    Some((ctx, w, h))
}

/// Topmost shown marker within reach of a canvas point.
fn marker_at(
    dataset: &Dataset,
    overlay: &MarkerOverlay,
    vp: &Viewport,
    sx: f64,
    sy: f64,
) -> Option<usize> {
    let reach = MARKER_RADIUS_PX + MARKER_HIT_SLOP_PX;
    overlay
        .markers(&dataset.points)
        .filter_map(|(i, poi)| {
            let (wx, wy) = project(poi.position());
            let (mx, my) = vp.world_to_screen(wx, wy);
            let d2 = (mx - sx).powi(2) + (my - sy).powi(2);
            (d2 <= reach * reach).then_some((i, d2))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

struct FrameInput<'a> {
    ctx: &'a CanvasRenderingContext2d,
    w: f64,
    h: f64,
    vp: &'a Viewport,
    dataset: &'a Dataset,
    controller: &'a SelectionController,
    markers: &'a MarkerOverlay,
    open_marker: Option<usize>,
    tile_cache: &'a TileCache,
    tile_keys: &'a [TileKey],
}

fn render_frame(input: FrameInput<'_>) {
    let FrameInput {
        ctx,
        w,
        h,
        vp,
        dataset,
        controller,
        markers,
        open_marker,
        tile_cache,
        tile_keys,
    } = input;

    ctx.set_fill_style_str(SEA_COLOR);
    ctx.fill_rect(0.0, 0.0, w, h);
    tiles::draw_tiles(ctx, tile_cache, vp, tile_keys);

    // Hovered and selected outlines go on top of their neighbours.
    for pass in [
        DisplayState::Default,
        DisplayState::Hovered,
        DisplayState::Selected,
    ] {
        for (name, style, _) in controller.iter() {
            if controller.display_state(name) != Some(pass) {
                continue;
            }
            let Some(feature) = dataset.feature(name) else {
                continue;
            };
            let (min_x, min_y, max_x, max_y) = feature.bounds.projected();
            let (sx0, sy0) = vp.world_to_screen(min_x, min_y);
            let (sx1, sy1) = vp.world_to_screen(max_x, max_y);
            if sx1 < 0.0 || sy1 < 0.0 || sx0 > w || sy0 > h {
                continue;
            }
            draw_area(ctx, vp, &feature.shape, style);
        }
    }

    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_line_join("round");
    for (name, _, label) in controller.iter() {
        if !label.visible {
            continue;
        }
        let Some(feature) = dataset.feature(name) else {
            continue;
        };
        let (wx, wy) = project(feature.centroid);
        let (sx, sy) = vp.world_to_screen(wx, wy);
        if sx < -200.0 || sy < -50.0 || sx > w + 200.0 || sy > h + 50.0 {
            continue;
        }
        if label.emphasized {
            draw_outlined_label(ctx, name, sx, sy);
        } else {
            draw_plain_label(ctx, name, sx, sy);
        }
    }

    for (index, poi) in markers.markers(&dataset.points) {
        let (wx, wy) = project(poi.position());
        let (sx, sy) = vp.world_to_screen(wx, wy);
        let r = MARKER_RADIUS_PX;
        if sx < -r || sy < -r || sx > w + r || sy > h + r {
            continue;
        }
        draw_marker(ctx, sx, sy, open_marker == Some(index));
    }
}

fn draw_area(ctx: &CanvasRenderingContext2d, vp: &Viewport, shape: &Shape, style: FeatureStyle) {
    ctx.begin_path();
    for polygon in &shape.polygons {
        for ring in polygon {
            let mut points = ring.iter().map(|&p| {
                let (wx, wy) = project(p);
                vp.world_to_screen(wx, wy)
            });
            let Some((x0, y0)) = points.next() else {
                continue;
            };
            ctx.move_to(x0, y0);
            for (x, y) in points {
                ctx.line_to(x, y);
            }
            ctx.close_path();
        }
    }
    ctx.set_fill_style_str(&hex_with_alpha(style.fill, style.fill_opacity));
    ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
    ctx.set_line_width(style.weight);
    ctx.set_stroke_style_str(style.stroke);
    ctx.stroke();
}

fn draw_plain_label(ctx: &CanvasRenderingContext2d, text: &str, x: f64, y: f64) {
    ctx.set_font(LABEL_FONT);
    let width = ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);
    ctx.set_fill_style_str("rgba(255,255,255,0.85)");
    ctx.fill_rect(x - width / 2.0 - 5.0, y - 9.0, width + 10.0, 18.0);
    ctx.set_fill_style_str(LABEL_INK);
    ctx.fill_text(text, x, y).ok();
}

fn draw_outlined_label(ctx: &CanvasRenderingContext2d, text: &str, x: f64, y: f64) {
    ctx.set_font(LABEL_FONT_EMPHASIZED);
    ctx.set_line_width(4.0);
    ctx.set_stroke_style_str("#ffffff");
    ctx.stroke_text(text, x, y).ok();
    ctx.set_fill_style_str(LABEL_INK);
    ctx.fill_text(text, x, y).ok();
}

fn draw_marker(ctx: &CanvasRenderingContext2d, x: f64, y: f64, open: bool) {
    ctx.begin_path();
    if ctx.arc(x, y, MARKER_RADIUS_PX, 0.0, TAU).is_err() {
        return;
    }
    ctx.set_fill_style_str(if open { ACCENT } else { MARKER_FILL });
    ctx.fill();
    ctx.set_line_width(2.0);
    ctx.set_stroke_style_str("#ffffff");
    ctx.stroke();

    // Small cross glyph
    ctx.begin_path();
    ctx.set_line_width(1.5);
    ctx.move_to(x, y - 4.0);
    ctx.line_to(x, y + 4.0);
    ctx.move_to(x - 3.0, y - 1.5);
    ctx.line_to(x + 3.0, y - 1.5);
    ctx.stroke();
}

#[cfg(test)]
mod tests {
    use super::*;
    use curacao_shared::PointOfInterest;

    fn church(name: &str, lon: f64, lat: f64) -> PointOfInterest {
        PointOfInterest {
            name: name.to_string(),
            area_name: "Willemstad".to_string(),
            photo_url: None,
            description: None,
            lon,
            lat,
        }
    }

    #[test]
    fn marker_hit_picks_nearest_shown_point() {
        let mut dataset = Dataset::default();
        dataset.points = vec![
            church("Fortkerk", -68.934, 12.105),
            church("Basilica", -68.9345, 12.1052),
        ];
        let mut overlay = MarkerOverlay::default();
        overlay.show_for_area(&dataset.points, "willemstad");

        let mut vp = Viewport::default();
        let (wx, wy) = project(dataset.points[1].position());
        vp.center_on(wx, wy, 18.0, 800.0, 600.0);

        assert_eq!(marker_at(&dataset, &overlay, &vp, 401.0, 300.0), Some(1));
        assert_eq!(marker_at(&dataset, &overlay, &vp, 40.0, 30.0), None);

        overlay.clear();
        assert_eq!(marker_at(&dataset, &overlay, &vp, 400.0, 300.0), None);
    }
}
