//! Hex encoding for RGBA colors.
//!
//! Colors are serialized as 8-digit `AARRGGBB` strings. Parsing also accepts
//! `RGB` (each nibble doubled) and `RRGGBB`, both fully opaque; anything else
//! decodes to opaque black.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A color with normalized `[0, 1]` channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn from_rgba8(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self::new(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
            f64::from(alpha) / 255.0,
        )
    }

    /// Channels quantized to 8 bits, in `[r, g, b, a]` order.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            quantize(self.red),
            quantize(self.green),
            quantize(self.blue),
            quantize(self.alpha),
        ]
    }

    /// Uppercase `AARRGGBB`.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        format!("{a:02X}{r:02X}{g:02X}{b:02X}")
    }

    /// Parse `RGB`, `RRGGBB` or `AARRGGBB`. Non-alphanumeric characters
    /// (such as a leading `#`) are ignored.
    pub fn from_hex(hex: &str) -> Self {
        let digits: String = hex.chars().filter(char::is_ascii_alphanumeric).collect();
        let Ok(value) = u32::from_str_radix(&digits, 16) else {
            return Self::BLACK;
        };

        let channel = |shift: u32| ((value >> shift) & 0xFF) as u8;
        let nibble = |shift: u32| ((value >> shift) & 0xF) as u8 * 17;

        match digits.len() {
            3 => Self::from_rgba8(nibble(8), nibble(4), nibble(0), 255),
            6 => Self::from_rgba8(channel(16), channel(8), channel(0), 255),
            8 => Self::from_rgba8(channel(16), channel(8), channel(0), channel(24)),
            _ => Self::BLACK,
        }
    }
}

fn quantize(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgba {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_hex(s))
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Ok(Self::from_hex(&hex))
    }
}
