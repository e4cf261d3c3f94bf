#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use curacao_shared::geo::WORLD_SIZE;

use crate::config::{TILE_CACHE_LIMIT, TILE_MAX_ZOOM, TILE_MIN_ZOOM, TILE_URL_TEMPLATE};
use crate::viewport::Viewport;

const ONLOAD_HANDLE_KEY: &str = "__curacaoTileOnload";
const ONERROR_HANDLE_KEY: &str = "__curacaoTileOnerror";
/// How many coarser levels to search for a stand-in while a tile loads.
const MAX_FALLBACK_LEVELS: u8 = 4;
const TILE_PX: f64 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// World-unit size of one tile edge at this zoom.
    pub fn world_size(&self) -> f64 {
        WORLD_SIZE / f64::from(1u32 << self.z)
    }

    pub fn world_origin(&self) -> (f64, f64) {
        let size = self.world_size();
        (self.x as f64 * size, self.y as f64 * size)
    }

    pub fn url(&self) -> String {
        TILE_URL_TEMPLATE
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }

    /// Ancestor `levels` up plus the source square `(sx, sy, size)` in its pixels
    /// that covers this tile.
    pub fn ancestor(&self, levels: u8) -> Option<(TileKey, f64, f64, f64)> {
        if levels == 0 || levels > self.z {
            return None;
        }
        let parent = TileKey {
            z: self.z - levels,
            x: self.x >> levels,
            y: self.y >> levels,
        };
        let span = 1u32 << levels;
        let size = TILE_PX / f64::from(span);
        let sx = f64::from(self.x % span) * size;
        let sy = f64::from(self.y % span) * size;
        Some((parent, sx, sy, size))
    }
}

/// Tile zoom level matching the viewport's scale.
pub fn tile_zoom(vp: &Viewport) -> u8 {
    let z = vp.zoom().round();
    z.clamp(f64::from(TILE_MIN_ZOOM), f64::from(TILE_MAX_ZOOM)) as u8
}

/// Tiles covering a `w`x`h` canvas, nearest to the view center first.
pub fn visible_tiles(vp: &Viewport, w: f64, h: f64) -> Vec<TileKey> {
    let z = tile_zoom(vp);
    let n = 1u32 << z;
    let size = WORLD_SIZE / f64::from(n);

    let (min_x, min_y) = vp.screen_to_world(0.0, 0.0);
    let (max_x, max_y) = vp.screen_to_world(w, h);
    let to_index = |v: f64| (v / size).floor().clamp(0.0, f64::from(n - 1)) as u32;
    let (x0, x1) = (to_index(min_x), to_index(max_x));
    let (y0, y1) = (to_index(min_y), to_index(max_y));
    if max_x < 0.0 || max_y < 0.0 || min_x >= WORLD_SIZE || min_y >= WORLD_SIZE {
        return Vec::new();
    }

    let (cx, cy) = vp.screen_to_world(w / 2.0, h / 2.0);
    let mut keys: Vec<TileKey> = (y0..=y1)
        .flat_map(|y| (x0..=x1).map(move |x| TileKey { z, x, y }))
        .collect();
    keys.sort_by(|a, b| {
        distance_sq(a, cx, cy)
            .total_cmp(&distance_sq(b, cx, cy))
            .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
    });
    keys
}

fn distance_sq(key: &TileKey, cx: f64, cy: f64) -> f64 {
    let (ox, oy) = key.world_origin();
    let half = key.world_size() * 0.5;
    let dx = ox + half - cx;
    let dy = oy + half - cy;
    dx * dx + dy * dy
}

enum TileSlot {
    Loading,
    Ready(HtmlImageElement),
    Failed,
}

/// Session-lifetime image cache for base-map tiles.
#[derive(Default)]
pub struct TileCache {
    slots: HashMap<TileKey, TileSlot>,
    failures: u32,
}

pub type SharedTileCache = Rc<RefCell<TileCache>>;

impl TileCache {
    pub fn shared() -> SharedTileCache {
        Rc::new(RefCell::new(Self::default()))
    }

    fn ready(&self, key: &TileKey) -> Option<&HtmlImageElement> {
        match self.slots.get(key) {
            Some(TileSlot::Ready(img)) => Some(img),
            _ => None,
        }
    }

    /// Keep only the active zoom level once the cache grows past its limit.
    fn evict(&mut self, keep_zoom: u8) {
        if self.slots.len() <= TILE_CACHE_LIMIT {
            return;
        }
        self.slots
            .retain(|key, slot| key.z == keep_zoom || matches!(slot, TileSlot::Loading));
    }
}

/// Start loading every visible tile not already cached. `on_ready` fires per
/// finished tile so the caller can schedule a repaint.
pub fn request_tiles(cache: &SharedTileCache, keys: &[TileKey], on_ready: Rc<dyn Fn()>) {
    let Some(zoom) = keys.first().map(|k| k.z) else {
        return;
    };
    cache.borrow_mut().evict(zoom);
    for &key in keys {
        if cache.borrow().slots.contains_key(&key) {
            continue;
        }
        cache.borrow_mut().slots.insert(key, TileSlot::Loading);
        load_tile(cache.clone(), key, on_ready.clone());
    }
}

fn load_tile(cache: SharedTileCache, key: TileKey, on_ready: Rc<dyn Fn()>) {
    let img = match HtmlImageElement::new() {
        Ok(img) => img,
        Err(_) => {
            cache.borrow_mut().slots.insert(key, TileSlot::Failed);
            return;
        }
    };

    let img_for_load = img.clone();
    let cache_for_load = cache.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_load);
        cache_for_load
            .borrow_mut()
            .slots
            .insert(key, TileSlot::Ready(img_for_load.clone()));
        on_ready();
    });

    let img_for_error = img.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_error);
        let mut cache = cache.borrow_mut();
        cache.slots.insert(key, TileSlot::Failed);
        cache.failures += 1;
        if cache.failures.is_power_of_two() {
            web_sys::console::warn_1(
                &format!("base map: {} tile(s) failed to load", cache.failures).into(),
            );
        }
    });

    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    img.set_onload(Some(onload_js.unchecked_ref()));
    img.set_onerror(Some(onerror_js.unchecked_ref()));
    let _ = Reflect::set(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY), &onload_js);
    let _ = Reflect::set(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY), &onerror_js);
    img.set_src(&key.url());
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

/// Paint visible tiles, substituting a scaled-up ancestor for tiles still loading.
pub fn draw_tiles(
    ctx: &CanvasRenderingContext2d,
    cache: &TileCache,
    vp: &Viewport,
    keys: &[TileKey],
) {
    for key in keys {
        let (ox, oy) = key.world_origin();
        let size = key.world_size();
        let (sx, sy) = vp.world_to_screen(ox, oy);
        let (ex, ey) = vp.world_to_screen(ox + size, oy + size);
        // Snap outward so neighbouring tiles overlap by up to a pixel.
        let (dx, dy) = (sx.floor(), sy.floor());
        let (dw, dh) = (ex.ceil() - dx, ey.ceil() - dy);

        if let Some(img) = cache.ready(key) {
            ctx.draw_image_with_html_image_element_and_dw_and_dh(img, dx, dy, dw, dh)
                .ok();
            continue;
        }
        for levels in 1..=MAX_FALLBACK_LEVELS {
            let Some((parent, src_x, src_y, src_size)) = key.ancestor(levels) else {
                break;
            };
            if let Some(img) = cache.ready(&parent) {
                ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    img, src_x, src_y, src_size, src_size, dx, dy, dw, dh,
                )
                .ok();
                break;
            }
        }
    }
}
