use std::path::PathBuf;

use clap::Parser;
use once_cell::sync::Lazy;

use crate::color::Rgb;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Paint a picture back out of particles: every dot you draw flies to the pixel whose color matches it best.
pub struct Args {
    /// Target image. A built-in gradient is used when omitted.
    pub image: Option<PathBuf>,

    /// Initial brush color, as r,g,b
    #[arg(long, default_value = "0,0,0")]
    pub color: Rgb,
    /// Initial brush radius (1-60)
    #[arg(long, default_value = "6")]
    pub radius: f32,
    /// How many nearest colors to try before scanning every free pixel (clamped to 10-50).
    #[arg(long, default_value = "200")]
    pub max_candidates: usize,
    /// Fraction of the remaining distance a particle covers each tick.
    #[arg(long, default_value = "0.05")]
    pub ease: f32,
    /// Distance at which a particle snaps onto its target.
    #[arg(long, default_value = "0.5")]
    pub snap: f32,
    /// Images larger than this (in either dimension) are scaled down.
    #[arg(long, default_value = "2048")]
    pub max_dim: u32,
    /// Radius of each drawn particle.
    #[arg(long, default_value = "2.0")]
    pub dot_size: f32,
    /// Seed for brush sampling. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub static ARGS: Lazy<Args> = Lazy::new(Args::parse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["pixel-morph"]).unwrap();
        assert!(args.image.is_none());
        assert_eq!(args.color, Rgb::new(0, 0, 0));
        assert_eq!(args.radius, 6.0);
        assert_eq!(args.max_candidates, 200);
        assert_eq!(args.max_dim, 2048);
        assert!(args.seed.is_none());
    }

    #[test]
    fn parses_color_and_image() {
        let args = Args::try_parse_from(["pixel-morph", "cat.png", "--color", "255,128,0", "--seed", "5"]).unwrap();
        assert_eq!(args.image, Some(PathBuf::from("cat.png")));
        assert_eq!(args.color, Rgb::new(255, 128, 0));
        assert_eq!(args.seed, Some(5));
        assert!(Args::try_parse_from(["pixel-morph", "--color", "red"]).is_err());
    }
}
