/// Fixed fill palette for area polygons.
pub const AREA_PALETTE: [&str; 30] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe", "#008080", "#e6beff", "#9a6324", "#fffac8", "#800000", "#aaffc3",
    "#808000", "#ffd8b1", "#000075", "#808080", "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728",
    "#9467bd", "#8c564b", "#e377c2", "#17becf", "#bcbd22", "#7f7f7f",
];

/// Stroke color of the selected area and its label outline.
pub const ACCENT: &str = "#f5c542";

/// Deterministic palette color for an area name.
///
/// Folds the UTF-16 code units with `acc = code + (acc << 5) - acc` in wrapping
/// 32-bit signed arithmetic, then indexes the palette with `|acc| % 30`.
pub fn area_color(name: &str) -> &'static str {
    AREA_PALETTE[palette_index(name)]
}

pub fn palette_index(name: &str) -> usize {
    let hash = name.encode_utf16().fold(0i32, |acc, unit| {
        (unit as i32)
            .wrapping_add(acc.wrapping_shl(5))
            .wrapping_sub(acc)
    });
    hash.unsigned_abs() as usize % AREA_PALETTE.len()
}

/// Parse `#rrggbb` into its components. Anything else yields `None`.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Hex color with an alpha channel applied, as a CSS string.
/// Unparseable input falls back to opaque-ish gray.
pub fn hex_with_alpha(hex: &str, alpha: f64) -> String {
    let (r, g, b) = hex_to_rgb(hex).unwrap_or((128, 128, 128));
    rgba_css(r, g, b, alpha)
}

#[cfg(test)]
mod tests {
    use super::{AREA_PALETTE, area_color, hex_to_rgb, hex_with_alpha, palette_index};

    #[test]
    fn area_color_is_deterministic() {
        for name in ["Willemstad", "Bandabou", "Sint Michiel", ""] {
            assert_eq!(area_color(name), area_color(name));
        }
    }

    #[test]
    fn area_color_is_always_from_palette() {
        let names = [
            "",
            "a",
            "Willemstad",
            "Banda Abou",
            "Sta. Catharina",
            "Curaçao",
            "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
            "\u{1F3DD} island",
        ];
        for name in names {
            assert!(AREA_PALETTE.contains(&area_color(name)), "{name}");
        }
    }

    #[test]
    fn empty_name_maps_to_first_entry() {
        assert_eq!(palette_index(""), 0);
        assert_eq!(area_color(""), AREA_PALETTE[0]);
    }

    #[test]
    fn single_char_hash_is_its_code_unit() {
        // 'a' = 97, 97 % 30 = 7
        assert_eq!(palette_index("a"), 7);
        // "ab" = 98 + 97 * 31 = 3105, 3105 % 30 = 15
        assert_eq!(palette_index("ab"), 15);
    }

    #[test]
    fn long_names_wrap_without_panicking() {
        let long = "Willemstad".repeat(500);
        assert!(palette_index(&long) < AREA_PALETTE.len());
    }

    #[test]
    fn palette_entries_are_valid_hex() {
        for hex in AREA_PALETTE {
            assert!(hex_to_rgb(hex).is_some(), "{hex}");
        }
    }

    #[test]
    fn hex_with_alpha_formats_rgba() {
        assert_eq!(hex_with_alpha("#ff0080", 0.5), "rgba(255,0,128,0.5)");
        assert_eq!(hex_with_alpha("nope", 1.0), "rgba(128,128,128,1)");
    }
}
