/// Categories offered when logging an activity. Any other label is still accepted.
pub const KNOWN_CATEGORIES: [&str; 7] = [
    "Work",
    "Exercise",
    "Sleep",
    "Social",
    "Entertainment",
    "Study",
    "Other",
];

/// Color of untracked time.
pub const GAP_COLOR: &str = "#f0f0f0";

/// Color of categories missing from the palette.
pub const FALLBACK_COLOR: &str = "#4A90E2";

pub fn category_color(category: &str) -> &'static str {
    match category {
        "Work" => "#FF6B6B",
        "Exercise" => "#4ECDC4",
        "Sleep" => "#45B7D1",
        "Social" => "#96CEB4",
        "Entertainment" => "#FFEEAD",
        "Study" => "#D4A5A5",
        "Other" => "#9FA8DA",
        _ => FALLBACK_COLOR,
    }
}

/// Parses `#RRGGBB` into its components.
pub fn hex_to_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::{category_color, hex_to_rgb, FALLBACK_COLOR, KNOWN_CATEGORIES};

    #[test]
    fn known_categories_have_their_own_colors() {
        for category in KNOWN_CATEGORIES {
            assert_ne!(category_color(category), FALLBACK_COLOR, "{category}");
        }
        assert_eq!(category_color("Work"), "#FF6B6B");
    }

    #[test]
    fn unknown_categories_fall_back() {
        assert_eq!(category_color("Test"), FALLBACK_COLOR);
        assert_eq!(category_color("work"), FALLBACK_COLOR);
        assert_eq!(category_color(""), FALLBACK_COLOR);
    }

    #[test]
    fn hex_colors_are_parsed() {
        assert_eq!(hex_to_rgb("#FF6B6B"), Some((0xFF, 0x6B, 0x6B)));
        assert_eq!(hex_to_rgb("#f0f0f0"), Some((0xF0, 0xF0, 0xF0)));
        assert_eq!(hex_to_rgb("FF6B6B"), None);
        assert_eq!(hex_to_rgb("#FFF"), None);
        assert_eq!(hex_to_rgb("#GG0000"), None);
    }
}
