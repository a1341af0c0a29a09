use std::fmt::{Debug, Formatter};

use bevy::math::Vec2;
use bevy::prelude::Resource;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::allocator::Allocator;
use crate::brush::{clamp_radius, sample_disk, samples_per_frame, BrushStroke};
use crate::color::Rgb;
use crate::particle::{Motion, Particle, ParticleArena, ParticleHandle};
use crate::target::TargetImage;

pub struct SessionSettings {
    pub max_candidates: usize,
    pub motion: Motion,
    pub color: Rgb,
    pub radius: f32,
    pub dot_size: f32,
    pub seed: u64,
}

pub struct Brush {
    pub color: Rgb,
    pub radius: f32,
}

pub struct DebugParams {
    pub paused: bool,
    pub show_hud: bool,
    pub show_stats: bool,
    pub current_frame: u32,
    pub log_frame: u32,
}

/// Everything one drawing session owns: the target pixels, the particles and the brush.
#[derive(Resource)]
pub struct Session {
    pub allocator: Allocator,
    pub particles: ParticleArena,
    pub brush: Brush,
    pub motion: Motion,
    pub dot_size: f32,
    pub debug: DebugParams,
    pub seed: u64,
    stroke: Option<BrushStroke>,
    rng: StdRng,
}

impl Session {
    pub fn new(target: TargetImage, settings: SessionSettings) -> Session {
        Session {
            allocator: Allocator::new(target, settings.max_candidates),
            particles: ParticleArena::default(),
            brush: Brush {
                color: settings.color,
                radius: clamp_radius(settings.radius),
            },
            motion: settings.motion,
            dot_size: settings.dot_size,
            debug: DebugParams {
                paused: false,
                show_hud: true,
                show_stats: false,
                current_frame: 0,
                log_frame: u32::MAX,
            },
            seed: settings.seed,
            stroke: None,
            rng: StdRng::seed_from_u64(settings.seed),
        }
    }

    pub fn target(&self) -> &TargetImage {
        self.allocator.target()
    }

    /// Sets the stroke for the next tick at `position` with the current brush.
    /// A tick paints at most one stroke; a newer pointer position replaces a pending one.
    pub fn queue_stroke(&mut self, position: Vec2) {
        self.stroke = Some(BrushStroke {
            position,
            color: self.brush.color,
            radius: self.brush.radius,
        });
    }

    /// Runs one fixed tick: the pending stroke is turned into particles, then everything moves.
    pub fn step_frame(&mut self) -> usize {
        let spawned = match self.stroke.take() {
            Some(stroke) => self.apply_stroke(&stroke).len(),
            None => 0,
        };
        self.advance();
        self.debug.current_frame = self.debug.current_frame.wrapping_add(1);
        spawned
    }

    pub fn apply_stroke(&mut self, stroke: &BrushStroke) -> Vec<ParticleHandle> {
        let count = samples_per_frame(stroke.radius);
        let samples = sample_disk(&mut self.rng, stroke.position, stroke.radius, count);
        let mut handles = Vec::with_capacity(count);
        for position in samples {
            // No target pixels at all: nothing to spawn.
            let Some(target) = self.allocator.assign(&stroke.color) else {
                break;
            };
            handles.push(self.particles.spawn(Particle {
                position,
                target,
                color: stroke.color,
            }));
        }
        handles
    }

    pub fn advance(&mut self) {
        if self.debug.paused {
            return;
        }
        let target = self.allocator.target();
        self.particles.advance(&self.motion, |i| target.position(i));
    }

    pub fn num_settled(&self) -> usize {
        let target = self.allocator.target();
        self.particles.num_settled(|i| target.position(i))
    }

    pub fn should_log(&self) -> bool {
        self.debug.log_frame == self.debug.current_frame
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Session:")?;
        writeln!(f, "    brush: color={} radius={}", self.brush.color, self.brush.radius)?;
        writeln!(f, "    motion: ease={} snap={}", self.motion.ease, self.motion.snap)?;
        writeln!(f, "    seed: {}", self.seed)?;
        writeln!(f, "    particles: {} ({} settled)", self.particles.len(), self.num_settled())?;
        write!(f, "{:?}", self.allocator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SessionSettings {
        SessionSettings {
            max_candidates: 200,
            motion: Motion::default(),
            color: Rgb::RED,
            radius: 6.0,
            dot_size: 2.0,
            seed: 3,
        }
    }

    fn checkerboard(n: u32) -> TargetImage {
        let colors = (0..n * n)
            .map(|i| if (i % n + i / n) % 2 == 0 { Rgb::RED } else { Rgb::BLUE })
            .collect();
        TargetImage { width: n, height: n, colors }
    }

    #[test]
    fn stroke_spawns_one_particle_per_sample() {
        let mut session = Session::new(checkerboard(16), settings());
        let handles = session.apply_stroke(&BrushStroke {
            position: Vec2::new(8.0, 8.0),
            color: Rgb::RED,
            radius: 6.0,
        });
        assert_eq!(handles.len(), 6);
        assert_eq!(session.particles.len(), 6);
        for handle in handles {
            let particle = session.particles.get(handle).unwrap();
            assert!(particle.position.distance(Vec2::new(8.0, 8.0)) <= 6.0 + 1e-4);
            assert_eq!(session.target().colors[particle.target], Rgb::RED);
            assert_eq!(particle.color, Rgb::RED);
        }
        assert_eq!(session.allocator.num_unclaimed(), 256 - 6);
    }

    #[test]
    fn queued_stroke_is_consumed_once() {
        let mut session = Session::new(checkerboard(8), settings());
        session.queue_stroke(Vec2::new(1.0, 1.0));
        assert_eq!(session.step_frame(), 6);
        assert_eq!(session.step_frame(), 0);
        assert_eq!(session.particles.len(), 6);
    }

    #[test]
    fn one_tick_paints_at_most_one_brush_worth() {
        let mut session = Session::new(checkerboard(16), settings());
        // Paused, so particles stay where they were sampled.
        session.debug.paused = true;
        session.queue_stroke(Vec2::new(1.0, 1.0));
        session.queue_stroke(Vec2::new(3.0, 3.0));
        session.brush.color = Rgb::BLUE;
        session.set_radius(10.0);
        session.queue_stroke(Vec2::new(5.0, 5.0));

        assert_eq!(session.step_frame(), samples_per_frame(10.0));
        assert!(session.particles.iter().all(|p| p.color == Rgb::BLUE));
        assert!(session.particles.iter().all(|p| p.position.distance(Vec2::new(5.0, 5.0)) <= 10.0 + 1e-4));

        for _ in 0..20 {
            session.queue_stroke(Vec2::new(8.0, 8.0));
            session.queue_stroke(Vec2::new(8.0, 8.0));
            assert!(session.step_frame() <= samples_per_frame(session.brush.radius));
        }
    }

    #[test]
    fn empty_target_spawns_nothing() {
        let empty = TargetImage { width: 0, height: 0, colors: Vec::new() };
        let mut session = Session::new(empty, settings());
        session.queue_stroke(Vec2::ZERO);
        assert_eq!(session.step_frame(), 0);
        assert!(session.particles.is_empty());
    }

    #[test]
    fn paused_sessions_do_not_move() {
        let mut session = Session::new(checkerboard(4), settings());
        session.queue_stroke(Vec2::new(40.0, 40.0));
        session.debug.paused = true;
        session.step_frame();
        let before: Vec<Vec2> = session.particles.iter().map(|p| p.position).collect();
        session.step_frame();
        let after: Vec<Vec2> = session.particles.iter().map(|p| p.position).collect();
        assert_eq!(before, after);

        session.debug.paused = false;
        for _ in 0..400 {
            session.advance();
        }
        assert_eq!(session.num_settled(), session.particles.len());
    }

    #[test]
    fn particles_end_on_their_own_pixel() {
        let mut session = Session::new(checkerboard(4), settings());
        for _ in 0..3 {
            session.queue_stroke(Vec2::new(2.0, 2.0));
            session.step_frame();
        }
        for _ in 0..400 {
            session.advance();
        }
        let mut landed: Vec<Vec2> = session.particles.iter().map(|p| p.position).collect();
        landed.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        landed.dedup();
        // 18 samples over 16 pixels: every pixel taken, two reused.
        assert_eq!(session.allocator.num_unclaimed(), 0);
        assert_eq!(landed.len(), 16);
    }
}
