//! Display colour of a profile and its AutoCAD Color Index equivalent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CamError, Result};

/// RGBA display colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Opaque black, the default profile colour.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque colour from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(text: &str) -> Result<Self> {
        let hex = text.trim().trim_start_matches('#');
        let invalid = || CamError::Config(format!("invalid colour '{}'", text));
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: alpha,
        })
    }

    /// `#rrggbb`, with an alpha suffix when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Nearest AutoCAD Color Index entry by squared RGB distance.
    pub fn aci(&self) -> u8 {
        let distance = |rgb: &[u8; 3]| {
            let dr = i32::from(rgb[0]) - i32::from(self.r);
            let dg = i32::from(rgb[1]) - i32::from(self.g);
            let db = i32::from(rgb[2]) - i32::from(self.b);
            dr * dr + dg * dg + db * db
        };
        // min_by_key keeps the first of equally close entries
        ACI_PALETTE
            .iter()
            .enumerate()
            .min_by_key(|(_, rgb)| distance(rgb))
            .map_or(0, |(i, _)| i as u8)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = CamError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = CamError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        c.to_hex()
    }
}

/// RGB values of the 256 AutoCAD Color Index entries.
pub const ACI_PALETTE: [[u8; 3]; 256] = [
    [0, 0, 0], [255, 0, 0], [255, 255, 0], [0, 255, 0],
    [0, 255, 255], [0, 0, 255], [255, 0, 255], [255, 255, 255],
    [128, 128, 128], [192, 192, 192], [255, 0, 0], [255, 127, 127],
    [204, 0, 0], [204, 102, 102], [153, 0, 0], [153, 76, 76],
    [127, 0, 0], [127, 63, 63], [76, 0, 0], [76, 38, 38],
    [255, 63, 0], [255, 159, 127], [204, 51, 0], [204, 127, 102],
    [153, 38, 0], [153, 95, 76], [127, 31, 0], [127, 79, 63],
    [76, 19, 0], [76, 47, 38], [255, 127, 0], [255, 191, 127],
    [204, 102, 0], [204, 153, 102], [153, 76, 0], [153, 114, 76],
    [127, 63, 0], [127, 95, 63], [76, 38, 0], [76, 57, 38],
    [255, 191, 0], [255, 223, 127], [204, 153, 0], [204, 178, 102],
    [153, 114, 0], [153, 133, 76], [127, 95, 0], [127, 111, 63],
    [76, 57, 0], [76, 66, 38], [255, 255, 0], [255, 255, 127],
    [204, 204, 0], [204, 204, 102], [152, 152, 0], [152, 152, 76],
    [127, 127, 0], [127, 127, 63], [76, 76, 0], [76, 76, 38],
    [191, 255, 0], [223, 255, 127], [153, 204, 0], [178, 204, 102],
    [114, 152, 0], [133, 152, 76], [95, 127, 0], [111, 127, 63],
    [57, 76, 0], [66, 76, 38], [127, 255, 0], [191, 255, 127],
    [102, 204, 0], [153, 204, 102], [76, 152, 0], [114, 152, 76],
    [63, 127, 0], [95, 127, 63], [38, 76, 0], [57, 76, 38],
    [63, 255, 0], [159, 255, 127], [51, 204, 0], [127, 204, 102],
    [38, 152, 0], [95, 152, 76], [31, 127, 0], [79, 127, 63],
    [19, 76, 0], [47, 76, 38], [0, 255, 0], [127, 255, 127],
    [0, 204, 0], [102, 204, 102], [0, 152, 0], [76, 152, 76],
    [0, 127, 0], [63, 127, 63], [0, 76, 0], [38, 76, 38],
    [0, 255, 63], [127, 255, 159], [0, 204, 51], [102, 204, 127],
    [0, 152, 38], [76, 152, 95], [0, 127, 31], [63, 127, 79],
    [0, 76, 19], [38, 76, 47], [0, 255, 127], [127, 255, 191],
    [0, 204, 102], [102, 204, 153], [0, 152, 76], [76, 152, 114],
    [0, 127, 63], [63, 127, 95], [0, 76, 38], [38, 76, 57],
    [0, 255, 191], [127, 255, 223], [0, 204, 153], [102, 204, 178],
    [0, 152, 114], [76, 152, 133], [0, 127, 95], [63, 127, 111],
    [0, 76, 57], [38, 76, 66], [0, 255, 255], [127, 255, 255],
    [0, 204, 204], [102, 204, 204], [0, 152, 152], [76, 152, 152],
    [0, 127, 127], [63, 127, 127], [0, 76, 76], [38, 76, 76],
    [0, 191, 255], [127, 223, 255], [0, 153, 204], [102, 178, 204],
    [0, 114, 152], [76, 133, 152], [0, 95, 127], [63, 111, 127],
    [0, 57, 76], [38, 66, 76], [0, 127, 255], [127, 191, 255],
    [0, 102, 204], [102, 153, 204], [0, 76, 152], [76, 114, 152],
    [0, 63, 127], [63, 95, 127], [0, 38, 76], [38, 57, 76],
    [0, 63, 255], [127, 159, 255], [0, 51, 204], [102, 127, 204],
    [0, 38, 152], [76, 95, 152], [0, 31, 127], [63, 79, 127],
    [0, 19, 76], [38, 47, 76], [0, 0, 255], [127, 127, 255],
    [0, 0, 204], [102, 102, 204], [0, 0, 152], [76, 76, 152],
    [0, 0, 127], [63, 63, 127], [0, 0, 76], [38, 38, 76],
    [63, 0, 255], [159, 127, 255], [51, 0, 204], [127, 102, 204],
    [38, 0, 152], [95, 76, 152], [31, 0, 127], [79, 63, 127],
    [19, 0, 76], [47, 38, 76], [127, 0, 255], [191, 127, 255],
    [102, 0, 204], [153, 102, 204], [76, 0, 152], [114, 76, 152],
    [63, 0, 127], [95, 63, 127], [38, 0, 76], [57, 38, 76],
    [191, 0, 255], [223, 127, 255], [153, 0, 204], [178, 102, 204],
    [114, 0, 152], [133, 76, 152], [95, 0, 127], [111, 63, 127],
    [57, 0, 76], [66, 38, 76], [255, 0, 255], [255, 127, 255],
    [204, 0, 204], [204, 102, 204], [152, 0, 152], [152, 76, 152],
    [127, 0, 127], [127, 63, 127], [76, 0, 76], [76, 38, 76],
    [255, 0, 191], [255, 127, 223], [204, 0, 153], [204, 102, 178],
    [152, 0, 114], [152, 76, 133], [127, 0, 95], [127, 63, 111],
    [76, 0, 57], [76, 38, 66], [255, 0, 127], [255, 127, 191],
    [204, 0, 102], [204, 102, 153], [152, 0, 76], [152, 76, 114],
    [127, 0, 63], [127, 63, 95], [76, 0, 38], [76, 38, 57],
    [255, 0, 63], [255, 127, 159], [204, 0, 51], [204, 102, 127],
    [152, 0, 38], [152, 76, 95], [127, 0, 31], [127, 63, 79],
    [76, 0, 19], [76, 38, 47], [51, 51, 51], [91, 91, 91],
    [132, 132, 132], [173, 173, 173], [214, 214, 214], [255, 255, 255],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let c = Color::from_hex("#ff8000").unwrap();
        assert_eq!(c, Color::rgb(255, 128, 0));
        assert_eq!(c.to_hex(), "#ff8000");
        let t: Color = "#10203040".parse().unwrap();
        assert_eq!(t.a, 0x40);
        assert_eq!(t.to_string(), "#10203040");
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_aci_exact_entries() {
        assert_eq!(Color::BLACK.aci(), 0);
        assert_eq!(Color::rgb(255, 0, 0).aci(), 1);
        assert_eq!(Color::rgb(0, 0, 255).aci(), 5);
        assert_eq!(Color::rgb(255, 255, 255).aci(), 7);
    }

    #[test]
    fn test_aci_nearest() {
        // not index 0: every entry must be compared
        assert_eq!(Color::rgb(250, 5, 3).aci(), 1);
        assert_eq!(Color::rgb(0, 250, 10).aci(), 3);
    }

    #[test]
    fn test_serde_as_hex() {
        let json = serde_json::to_string(&Color::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(1, 2, 3));
    }
}
