//! CSS color values as stored in `fill` / `stroke`.
//!
//! Scene objects keep their paint as the CSS string the UI handed us; this
//! module turns those strings into RGBA so the flash animation and port
//! hover feedback can interpolate between them.
//!
//! Built on `winnow` 0.7. Accepts `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`,
//! `rgb(r, g, b)`, `rgba(r, g, b, a)`, `transparent`, and a handful of
//! named colors.

use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, opt, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// RGBA color. Channels are 0..=255, alpha is 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| f64::from(v * 17));
        let long = |i: usize| {
            let hi = hex_val(bytes[i])?;
            let lo = hex_val(bytes[i + 1])?;
            Some(f64::from(hi << 4 | lo))
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)? / 255.0)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)? / 255.0)),
            _ => None,
        }
    }

    /// Parse any supported CSS color string.
    pub fn parse(input: &str) -> Option<Self> {
        let mut rest = input.trim();
        let color = parse_color.parse_next(&mut rest).ok()?;
        rest.trim().is_empty().then_some(color)
    }

    /// Emit as `#RRGGBB` when opaque, `rgba(...)` otherwise.
    pub fn to_css(&self) -> String {
        let r = self.r.round().clamp(0.0, 255.0) as u8;
        let g = self.g.round().clamp(0.0, 255.0) as u8;
        let b = self.b.round().clamp(0.0, 255.0) as u8;
        if self.a >= 1.0 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
            format!("rgba({r},{g},{b},{a})")
        }
    }

    /// Linear interpolation between two colors, channel-wise.
    pub fn lerp(&self, to: &Color, t: f64) -> Color {
        Color {
            r: self.r + (to.r - self.r) * t,
            g: self.g + (to.g - self.g) * t,
            b: self.b + (to.b - self.b) * t,
            a: self.a + (to.a - self.a) * t,
        }
    }
}

fn parse_color(input: &mut &str) -> ModalResult<Color> {
    alt((parse_hex_color, parse_rgb_function, parse_named_color)).parse_next(input)
}

fn parse_hex_color(input: &mut &str) -> ModalResult<Color> {
    let _ = '#'.parse_next(input)?;
    let digits: &str = take_while(3..=8, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
    Color::from_hex(digits).ok_or_else(|| ErrMode::Backtrack(ContextError::new()))
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    let start = *input;
    let _ = opt('-').parse_next(input)?;
    let _ = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    if input.starts_with('.') {
        *input = &input[1..];
        let _ = take_while(0.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    }
    let matched = &start[..start.len() - input.len()];
    matched
        .parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

/// A channel value, optionally followed by `%`.
fn parse_channel(input: &mut &str) -> ModalResult<f64> {
    let value = delimited(space0, parse_number, space0).parse_next(input)?;
    let percent = opt('%').parse_next(input)?;
    let _ = space0.parse_next(input)?;
    Ok(match percent {
        Some(_) => value * 2.55,
        None => value,
    })
}

fn parse_rgb_function(input: &mut &str) -> ModalResult<Color> {
    let _ = alt(("rgba", "rgb")).parse_next(input)?;
    let _ = space0.parse_next(input)?;
    let _ = '('.parse_next(input)?;
    let r = parse_channel.parse_next(input)?;
    let g = preceded(',', parse_channel).parse_next(input)?;
    let b = preceded(',', parse_channel).parse_next(input)?;
    let a = opt(preceded(',', delimited(space0, parse_number, space0))).parse_next(input)?;
    let _ = ')'.parse_next(input)?;
    Ok(Color::rgba(r, g, b, a.unwrap_or(1.0)))
}

fn parse_named_color(input: &mut &str) -> ModalResult<Color> {
    let name: &str = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    let color = match name.to_ascii_lowercase().as_str() {
        "transparent" => Color::TRANSPARENT,
        "black" => Color::rgba(0.0, 0.0, 0.0, 1.0),
        "white" => Color::rgba(255.0, 255.0, 255.0, 1.0),
        "red" => Color::rgba(255.0, 0.0, 0.0, 1.0),
        "green" => Color::rgba(0.0, 128.0, 0.0, 1.0),
        "blue" => Color::rgba(0.0, 0.0, 255.0, 1.0),
        "yellow" => Color::rgba(255.0, 255.0, 0.0, 1.0),
        "orange" => Color::rgba(255.0, 165.0, 0.0, 1.0),
        "gray" | "grey" => Color::rgba(128.0, 128.0, 128.0, 1.0),
        _ => return Err(ErrMode::Backtrack(ContextError::new())),
    };
    Ok(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse("#fff"), Some(Color::rgba(255.0, 255.0, 255.0, 1.0)));
        assert_eq!(Color::parse("#FF0000"), Some(Color::rgba(255.0, 0.0, 0.0, 1.0)));
        let c = Color::parse("#00000080").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn parses_rgb_functions() {
        assert_eq!(
            Color::parse("rgb(10, 20, 30)"),
            Some(Color::rgba(10.0, 20.0, 30.0, 1.0))
        );
        assert_eq!(
            Color::parse("rgba(10,20,30,0.5)"),
            Some(Color::rgba(10.0, 20.0, 30.0, 0.5))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Color::parse("#12"), None);
        assert_eq!(Color::parse("rgb(1,2)"), None);
        assert_eq!(Color::parse("chartreuse-ish"), None);
    }

    #[test]
    fn lerp_midpoint_and_css() {
        let black = Color::parse("black").unwrap();
        let white = Color::parse("white").unwrap();
        let mid = black.lerp(&white, 0.5);
        assert_eq!(mid.to_css(), "#808080");
        assert_eq!(Color::TRANSPARENT.to_css(), "rgba(0,0,0,0)");
    }
}
