use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bevy::color::Color;

/// 8-bit RGB triple, used for both target pixels and the brush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    #[cfg(test)]
    pub const RED: Rgb = Rgb([255, 0, 0]);
    #[cfg(test)]
    pub const BLUE: Rgb = Rgb([0, 0, 255]);

    #[cfg(test)]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    pub fn channel(&self, axis: usize) -> u8 {
        self.0[axis]
    }

    /// Squared Euclidean distance in RGB space. Exact, so equal distances compare equal.
    pub fn distance_sq(&self, other: &Rgb) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| {
                let d = *a as i32 - *b as i32;
                (d * d) as u32
            })
            .sum()
    }

    /// Adds `delta` to one channel, clamping to 0..=255.
    pub fn adjusted(mut self, channel: usize, delta: i32) -> Self {
        self.0[channel] = (self.0[channel] as i32 + delta).clamp(0, 255) as u8;
        self
    }

    pub fn to_color(self) -> Color {
        Color::srgb_u8(self.0[0], self.0[1], self.0[2])
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses "r,g,b" with each channel in 0..=255.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected r,g,b but got '{s}'"));
        }
        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(parts) {
            *slot = part
                .parse::<u8>()
                .map_err(|e| format!("bad channel '{part}': {e}"))?;
        }
        Ok(Rgb(rgb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_squared_euclidean() {
        assert_eq!(Rgb::RED.distance_sq(&Rgb::RED), 0);
        assert_eq!(Rgb::RED.distance_sq(&Rgb::BLUE), 2 * 255 * 255);
        assert_eq!(Rgb::new(1, 2, 3).distance_sq(&Rgb::new(4, 6, 3)), 25);
    }

    #[test]
    fn adjusted_clamps() {
        assert_eq!(Rgb::new(250, 5, 0).adjusted(0, 16), Rgb::new(255, 5, 0));
        assert_eq!(Rgb::new(250, 5, 0).adjusted(1, -16), Rgb::new(250, 0, 0));
    }

    #[test]
    fn parses_triples() {
        assert_eq!("10, 20,30".parse::<Rgb>(), Ok(Rgb::new(10, 20, 30)));
        assert!("10,20".parse::<Rgb>().is_err());
        assert!("10,20,300".parse::<Rgb>().is_err());
    }
}
