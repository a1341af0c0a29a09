use std::f32::consts::TAU;

use bevy::math::Vec2;
use rand::Rng;

use crate::color::Rgb;

pub const MIN_RADIUS: f32 = 1.0;
pub const MAX_RADIUS: f32 = 60.0;

/// One frame's worth of painting: where the pointer is and what it paints with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushStroke {
    pub position: Vec2,
    pub color: Rgb,
    pub radius: f32,
}

pub fn clamp_radius(radius: f32) -> f32 {
    radius.clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Bigger brushes lay down more dots per frame.
pub fn samples_per_frame(radius: f32) -> usize {
    (radius.max(0.0) as usize).max(1)
}

/// `count` points spread uniformly over the area of the disk around `center`.
pub fn sample_disk<R: Rng + ?Sized>(rng: &mut R, center: Vec2, radius: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|_| {
            // sqrt keeps the density even; a plain uniform radius would bunch points at the center.
            let r = radius * rng.random::<f32>().sqrt();
            let theta = TAU * rng.random::<f32>();
            center + Vec2::from_angle(theta) * r
        })
        .collect()
}
