//! Display colors for layers and micro-scene parts. Colors are authored as
//! `#RRGGBB` strings and kept as normalized sRGB triples; emphasis effects
//! shift lightness in HSL space so a brightened layer keeps its hue.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::smoothing::Lerp;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {input:?}: expected #RRGGBB")]
pub struct ColorParseError {
    pub input: String,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn with_alpha(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }

    pub fn to_u8(self) -> [u8; 3] {
        let quantize = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    /// Shift HSL lightness by `delta`, clamping to the valid range.
    pub fn offset_lightness(self, delta: f32) -> Self {
        let (h, s, l) = self.to_hsl();
        Self::from_hsl(h, s, (l + delta).clamp(0.0, 1.0))
    }

    fn to_hsl(self) -> (f32, f32, f32) {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let lightness = (max + min) * 0.5;
        if (max - min).abs() <= f32::EPSILON {
            return (0.0, 0.0, lightness);
        }
        let delta = max - min;
        let saturation = if lightness <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };
        let hue = if max == self.r {
            (self.g - self.b) / delta + if self.g < self.b { 6.0 } else { 0.0 }
        } else if max == self.g {
            (self.b - self.r) / delta + 2.0
        } else {
            (self.r - self.g) / delta + 4.0
        };
        (hue / 6.0, saturation, lightness)
    }

    fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        if saturation <= 0.0 {
            return Self::new(lightness, lightness, lightness);
        }
        let q = if lightness <= 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;
        Self::new(
            hue_to_channel(p, q, hue + 1.0 / 3.0),
            hue_to_channel(p, q, hue),
            hue_to_channel(p, q, hue - 1.0 / 3.0),
        )
    }
}

fn hue_to_channel(p: f32, q: f32, hue: f32) -> f32 {
    let t = hue.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

impl Lerp for Rgb {
    fn lerp(self, target: Self, amount: f32) -> Self {
        Self::new(
            self.r + (target.r - self.r) * amount,
            self.g + (target.g - self.g) * amount,
            self.b + (target.b - self.b) * amount,
        )
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError {
            input: input.to_string(),
        };
        let hex = input.strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| err())
        };
        Ok(Self::from_u8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_u8();
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_hex() {
        let copper: Rgb = "#B87333".parse().expect("valid color");
        assert_eq!(copper.to_u8(), [0xB8, 0x73, 0x33]);
        assert_eq!(copper.to_string(), "#B87333");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!("B87333".parse::<Rgb>().is_err());
        assert!("#B8733".parse::<Rgb>().is_err());
        assert!("#GG7333".parse::<Rgb>().is_err());
        assert!("#+F+F+F".parse::<Rgb>().is_err());
        assert!("#-1-1-1".parse::<Rgb>().is_err());
    }

    #[test]
    fn lightness_offset_keeps_grey_neutral() {
        let grey = Rgb::new(0.5, 0.5, 0.5).offset_lightness(0.1);
        assert!((grey.r - 0.6).abs() < 1e-5);
        assert_eq!(grey.r, grey.g);
        assert_eq!(grey.g, grey.b);
    }

    #[test]
    fn lightness_offset_brightens_saturated_color() {
        let blue: Rgb = "#3B82F6".parse().expect("valid color");
        let brighter = blue.offset_lightness(0.1);
        let sum = |c: Rgb| c.r + c.g + c.b;
        assert!(sum(brighter) > sum(blue));
        assert!(brighter.b >= brighter.r, "hue should stay blue");
    }
}
