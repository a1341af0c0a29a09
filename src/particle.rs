use bevy::math::Vec2;
use rayon::prelude::*;

use crate::color::Rgb;

pub const DEFAULT_EASE: f32 = 0.05;
pub const DEFAULT_SNAP: f32 = 0.5;

/// A dot travelling from where it was painted to its target pixel.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub target: usize,
    pub color: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleHandle(pub usize);

/// Per-tick easing toward the target. Not time-normalized: one call is one step.
#[derive(Clone, Copy, Debug)]
pub struct Motion {
    /// Fraction of the remaining distance covered each step.
    pub ease: f32,
    /// At or below this distance the particle lands exactly on its target.
    pub snap: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Motion {
            ease: DEFAULT_EASE,
            snap: DEFAULT_SNAP,
        }
    }
}

impl Motion {
    pub fn step(&self, position: Vec2, target: Vec2) -> Vec2 {
        let direction = target - position;
        if direction.length() > self.snap {
            position + direction * self.ease
        } else {
            target
        }
    }
}

/// Every particle spawned this session. Handles are indices and are never reused.
#[derive(Default)]
pub struct ParticleArena {
    particles: Vec<Particle>,
}

impl ParticleArena {
    pub fn spawn(&mut self, particle: Particle) -> ParticleHandle {
        self.particles.push(particle);
        ParticleHandle(self.particles.len() - 1)
    }

    #[cfg(test)]
    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.particles.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Moves every particle one step toward `target_position(particle.target)`.
    pub fn advance<F>(&mut self, motion: &Motion, target_position: F)
    where
        F: Fn(usize) -> Vec2 + Sync,
    {
        self.particles.par_iter_mut().for_each(|particle| {
            particle.position = motion.step(particle.position, target_position(particle.target));
        });
    }

    /// Number of particles sitting exactly on their target.
    pub fn num_settled<F>(&self, target_position: F) -> usize
    where
        F: Fn(usize) -> Vec2 + Sync,
    {
        self.particles
            .par_iter()
            .filter(|p| p.position == target_position(p.target))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_particles_cover_five_percent() {
        let motion = Motion::default();
        let target = Vec2::new(10.0, -4.0);
        let start = Vec2::new(-20.0, 36.0);
        let d = start.distance(target);

        let next = motion.step(start, target);
        assert!((next.distance(target) - 0.95 * d).abs() < 1e-4);
        // Straight line, no overshoot.
        assert!((target - next).normalize().abs_diff_eq((target - start).normalize(), 1e-5));
    }

    #[test]
    fn close_particles_snap_exactly() {
        let motion = Motion::default();
        let target = Vec2::new(3.0, 7.0);
        assert_eq!(motion.step(Vec2::new(3.5, 7.0), target), target);
        assert_eq!(motion.step(Vec2::new(3.2, 7.2), target), target);
        assert_eq!(motion.step(target, target), target);
    }

    #[test]
    fn just_outside_snap_still_eases() {
        let motion = Motion::default();
        let target = Vec2::ZERO;
        let next = motion.step(Vec2::new(0.6, 0.0), target);
        assert!((next.x - 0.57).abs() < 1e-6);
    }

    #[test]
    fn arena_advances_and_settles() {
        let mut arena = ParticleArena::default();
        let targets = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 50.0)];
        let a = arena.spawn(Particle { position: Vec2::new(0.3, 0.0), target: 0, color: Rgb::RED });
        let b = arena.spawn(Particle { position: Vec2::new(0.0, 0.0), target: 1, color: Rgb::BLUE });
        assert_eq!((a, b), (ParticleHandle(0), ParticleHandle(1)));

        arena.advance(&Motion::default(), |i| targets[i]);
        assert_eq!(arena.get(a).unwrap().position, targets[0]);
        assert!((arena.get(b).unwrap().position - Vec2::new(5.0, 2.5)).length() < 1e-4);
        assert_eq!(arena.num_settled(|i| targets[i]), 1);

        for _ in 0..500 {
            arena.advance(&Motion::default(), |i| targets[i]);
        }
        assert_eq!(arena.num_settled(|i| targets[i]), 2);
        assert_eq!(arena.len(), 2);
    }
}
