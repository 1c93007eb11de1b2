//! Palette colours.
//!
//! Recipes and presets describe colours as CSS-style strings. Two forms are
//! understood:
//! - Hex: `#RGB` or `#RRGGBB`
//! - Functional: `hsl(h, s%, l%)`

use thiserror::Error;

/// 8-bit RGB triple, the same shape the presenter writes as truecolor escapes.
pub type Rgb = (u8, u8, u8);

pub const WHITE: Rgb = (255, 255, 255);

/// Error type for colour parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("empty color string")]
    Empty,
    #[error("invalid color length {0}, expected 3 or 6")]
    InvalidLength(usize),
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    #[error("malformed hsl() color '{0}'")]
    InvalidHsl(String),
    #[error("unsupported color format '{0}'")]
    Unsupported(String),
}

/// Parse a palette colour string.
///
/// ```
/// use lumisky::color::parse_color;
///
/// assert_eq!(parse_color("#F00").unwrap(), (255, 0, 0));
/// assert_eq!(parse_color("#22c55e").unwrap(), (0x22, 0xc5, 0x5e));
/// assert_eq!(parse_color("hsl(0, 100%, 50%)").unwrap(), (255, 0, 0));
/// ```
pub fn parse_color(s: &str) -> Result<Rgb, ColorError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ColorError::Empty);
    }

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = s.to_ascii_lowercase();
    if let Some(args) = lower.strip_prefix("hsl(").and_then(|rest| rest.strip_suffix(')')) {
        return parse_hsl_args(args).ok_or_else(|| ColorError::InvalidHsl(s.to_string()));
    }

    Err(ColorError::Unsupported(s.to_string()))
}

fn parse_hex(hex: &str) -> Result<Rgb, ColorError> {
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| ColorError::InvalidLength(hex.len()))
    };

    match hex.len() {
        3 => Ok((channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17)),
        6 => Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        len => Err(ColorError::InvalidLength(len)),
    }
}

fn parse_hsl_args(args: &str) -> Option<Rgb> {
    let mut parts = args.split(',').map(str::trim);
    let h: f64 = parts.next()?.trim_end_matches("deg").parse().ok()?;
    let s: f64 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    let l: f64 = parts.next()?.strip_suffix('%')?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hsl_to_rgb(h, s / 100.0, l / 100.0))
}

/// Convert hue in degrees, saturation and lightness in `[0, 1]` to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h.rem_euclid(360.0) / 60.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 1.0 {
        (c, x, 0.0)
    } else if h < 2.0 {
        (x, c, 0.0)
    } else if h < 3.0 {
        (0.0, c, x)
    } else if h < 4.0 {
        (0.0, x, c)
    } else if h < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

/// A vivid colour at a random hue (`hsl(rand·360, 100%, 60%)`).
pub fn random_vivid(rng: &mut fastrand::Rng) -> Rgb {
    hsl_to_rgb(rng.f64() * 360.0, 1.0, 0.6)
}

/// Any 24-bit colour.
pub fn random_rgb(rng: &mut fastrand::Rng) -> Rgb {
    (rng.u8(..), rng.u8(..), rng.u8(..))
}

/// Format as `#rrggbb`.
pub fn to_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(parse_color("#FFF"), Ok(WHITE));
        assert_eq!(parse_color("#fbbf24"), Ok((0xfb, 0xbf, 0x24)));
        assert_eq!(parse_color("  #06B6D4 "), Ok((0x06, 0xb6, 0xd4)));
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(parse_color(""), Err(ColorError::Empty));
        assert_eq!(parse_color("#12345"), Err(ColorError::InvalidLength(5)));
        assert_eq!(parse_color("#GG0000"), Err(ColorError::InvalidHex('G')));
        assert!(matches!(parse_color("red"), Err(ColorError::Unsupported(_))));
    }

    #[test]
    fn parses_hsl() {
        assert_eq!(parse_color("hsl(120, 100%, 50%)"), Ok((0, 255, 0)));
        assert_eq!(parse_color("HSL(240deg, 100%, 50%)"), Ok((0, 0, 255)));
        assert_eq!(parse_color("hsl(0, 0%, 100%)"), Ok(WHITE));
        assert!(matches!(parse_color("hsl(10, 20, 30)"), Err(ColorError::InvalidHsl(_))));
        assert!(matches!(parse_color("hsl(10, 20%, 30%, 1)"), Err(ColorError::InvalidHsl(_))));
    }

    #[test]
    fn hue_wraps() {
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), hsl_to_rgb(0.0, 1.0, 0.5));
        assert_eq!(hsl_to_rgb(-120.0, 1.0, 0.5), (0, 0, 255));
    }

    #[test]
    fn formats_lowercase_hex() {
        assert_eq!(to_hex((0x0a, 0xff, 0x00)), "#0aff00");
    }

    #[test]
    fn vivid_colors_are_saturated() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..32 {
            let (r, g, b) = random_vivid(&mut rng);
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            // l = 0.6, s = 1.0 spans 51..=255
            assert_eq!(max, 255);
            assert!((50..=52).contains(&min), "min channel {min}");
        }
    }
}
