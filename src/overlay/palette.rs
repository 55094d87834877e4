use serde::{Serialize, Serializer};
use std::fmt;

/// RGB display colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub const NEUTRAL: Color = Color::rgb(0x9E, 0x9E, 0x9E);

const COLORS: [(&str, Color); 7] = [
    ("happy", Color::rgb(0x4C, 0xAF, 0x50)),
    ("sad", Color::rgb(0x21, 0x96, 0xF3)),
    ("angry", Color::rgb(0xF4, 0x43, 0x36)),
    ("fear", Color::rgb(0x9C, 0x27, 0xB0)),
    ("surprise", Color::rgb(0xFF, 0xC1, 0x07)),
    ("disgust", Color::rgb(0x79, 0x55, 0x48)),
    ("neutral", NEUTRAL),
];

/// Fixed emotion → colour mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionPalette;

impl EmotionPalette {
    /// Colour for `emotion`; unknown labels get the neutral colour
    pub fn color_for(&self, emotion: &str) -> Color {
        COLORS
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(emotion))
            .map(|(_, color)| *color)
            .unwrap_or(NEUTRAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_colors() {
        let palette = EmotionPalette;
        assert_eq!(palette.color_for("happy").to_string(), "#4CAF50");
        assert_eq!(palette.color_for("angry").to_string(), "#F44336");
        assert_eq!(palette.color_for("Surprise").to_string(), "#FFC107");
    }

    #[test]
    fn test_unknown_falls_back_to_neutral() {
        let palette = EmotionPalette;
        assert_eq!(palette.color_for("contempt"), NEUTRAL);
        assert_eq!(palette.color_for(""), NEUTRAL);
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&Color::rgb(0x21, 0x96, 0xF3)).unwrap();
        assert_eq!(json, "\"#2196F3\"");
    }
}
