use crossterm::style::Color;

/// Color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color
    pub bg: Color,
    /// Default text color
    pub fg: Color,
    /// Box and separator color
    pub border: Color,
    /// Highlighted choice background
    pub selected_bg: Color,
    /// Wrong pick, errors
    pub error: Color,
    /// Correct pick, gained time
    pub success: Color,
    /// Secondary text
    pub info: Color,
    /// Key binding text color
    pub key: Color,
    /// Rare and ultra rare targets
    pub rare: Color,
    /// Time bar during the late-round boost
    pub fever: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb { r: 20, g: 22, b: 30 },
            fg: Color::Rgb { r: 230, g: 230, b: 240 },
            border: Color::Rgb { r: 70, g: 75, b: 90 },
            selected_bg: Color::Rgb { r: 70, g: 90, b: 140 },
            error: Color::Rgb { r: 255, g: 90, b: 90 },
            success: Color::Rgb { r: 90, g: 255, b: 130 },
            info: Color::Rgb { r: 160, g: 165, b: 185 },
            key: Color::Rgb { r: 255, g: 210, b: 100 },
            rare: Color::Rgb { r: 255, g: 120, b: 200 },
            fever: Color::Rgb { r: 255, g: 150, b: 60 },
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color::Rgb { r: 248, g: 248, b: 252 },
            fg: Color::Rgb { r: 30, g: 30, b: 40 },
            border: Color::Rgb { r: 180, g: 180, b: 195 },
            selected_bg: Color::Rgb { r: 180, g: 200, b: 255 },
            error: Color::Rgb { r: 220, g: 50, b: 50 },
            success: Color::Rgb { r: 40, g: 160, b: 60 },
            info: Color::Rgb { r: 90, g: 90, b: 110 },
            key: Color::Rgb { r: 200, g: 120, b: 20 },
            rare: Color::Rgb { r: 190, g: 40, b: 130 },
            fever: Color::Rgb { r: 220, g: 100, b: 0 },
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

/// `#RRGGBB` to a terminal color; anything else is not a swatch
pub fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(
            parse_hex("#D7003A"),
            Some(Color::Rgb { r: 0xD7, g: 0x00, b: 0x3A })
        );
        assert_eq!(parse_hex("#d7003a"), parse_hex("#D7003A"));
    }

    #[test]
    fn test_non_swatches() {
        assert_eq!(parse_hex("🍓"), None);
        assert_eq!(parse_hex("D7003A"), None);
        assert_eq!(parse_hex("#D700"), None);
        assert_eq!(parse_hex("#GGGGGG"), None);
        assert_eq!(parse_hex("Oshima"), None);
    }
}
