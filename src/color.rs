use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 24-bit `#RRGGBB` color as stored on a project record
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub(crate) const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Perceived brightness in `[0, 1]`
    pub(crate) fn luminance(self) -> f64 {
        // Plain arithmetic: a fused multiply-add rounds differently near 0.5
        #[allow(clippy::suboptimal_flops)]
        let weighted =
            0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b);
        weighted / 255.0
    }

    /// Returns the text color (black or white) that stays readable on top of
    /// `self`
    pub(crate) fn contrast(self) -> Rgb {
        if self.luminance() > 0.5 {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Rgb, ParseColorError> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_owned()));
        }
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| ParseColorError(s.to_owned()))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> ratatui::style::Color {
        ratatui::style::Color::Rgb(c.r, c.g, c.b)
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid color {0:?}; expected #RRGGBB")]
pub(crate) struct ParseColorError(String);
