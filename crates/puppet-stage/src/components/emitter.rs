use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::rng::Rng;

/// How the emitter releases particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionMode {
    /// Emit particles continuously at a fixed rate.
    #[default]
    Continuous,
    /// Emit particles in bursts.
    Burst,
}

/// Authored emitter settings, read from a `particles` asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmitterConfig {
    pub mode: EmissionMode,
    /// Particles per second (continuous mode).
    pub rate: f32,
    /// Particles per burst (burst mode).
    pub burst_count: u32,
    /// Milliseconds between bursts (0 = one-shot).
    pub burst_interval: f32,
    /// Min/max initial speed, in units per second.
    pub speed_min: f32,
    pub speed_max: f32,
    /// Particle lifetime in milliseconds.
    pub lifetime: f32,
    /// Hard cap on live particles.
    pub max_particles: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            mode: EmissionMode::Continuous,
            rate: 10.0,
            burst_count: 8,
            burst_interval: 0.0,
            speed_min: 20.0,
            speed_max: 80.0,
            lifetime: 1000.0,
            max_particles: 256,
        }
    }
}

/// A live particle, positioned in the emitter's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Remaining life in milliseconds.
    pub life: f32,
}

/// Running emitter attached to a puppet leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEmitter {
    pub config: EmitterConfig,
    pub active: bool,
    particles: Vec<Particle>,
    accumulator: f32,
    burst_timer: f32,
    burst_fired: bool,
}

impl ParticleEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            active: true,
            particles: Vec::new(),
            accumulator: 0.0,
            burst_timer: 0.0,
            burst_fired: false,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// How many particles to release for a step of `dt` milliseconds.
    fn emission_count(&mut self, dt: f32) -> usize {
        match self.config.mode {
            EmissionMode::Continuous => {
                self.accumulator += self.config.rate * dt / 1000.0;
                let count = self.accumulator as usize;
                self.accumulator -= count as f32;
                count
            }
            EmissionMode::Burst => {
                if self.config.burst_interval <= 0.0 {
                    if !self.burst_fired {
                        self.burst_fired = true;
                        self.config.burst_count as usize
                    } else {
                        0
                    }
                } else {
                    self.burst_timer += dt;
                    if self.burst_timer >= self.config.burst_interval {
                        self.burst_timer -= self.config.burst_interval;
                        self.config.burst_count as usize
                    } else {
                        0
                    }
                }
            }
        }
    }

    /// Age existing particles and release new ones. Returns the number spawned.
    pub fn tick(&mut self, dt: f32, rng: &mut Rng) -> usize {
        let step = dt / 1000.0;
        self.particles.retain_mut(|p| {
            p.life -= dt;
            p.position += p.velocity * step;
            p.life > 0.0
        });

        if !self.active {
            return 0;
        }

        let room = self.config.max_particles.saturating_sub(self.particles.len());
        let count = self.emission_count(dt).min(room);
        for _ in 0..count {
            let angle = rng.next_f32() * std::f32::consts::TAU;
            let speed = self.config.speed_min
                + (self.config.speed_max - self.config.speed_min) * rng.next_f32();
            self.particles.push(Particle {
                position: Vec2::ZERO,
                velocity: Vec2::from_angle(angle) * speed,
                life: self.config.lifetime,
            });
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_accumulator() {
        let mut e = ParticleEmitter::new(EmitterConfig {
            rate: 60.0,
            ..Default::default()
        });
        let mut rng = Rng::new(1);
        assert_eq!(e.tick(1000.0 / 60.0 + 0.01, &mut rng), 1);
        assert_eq!(e.particles().len(), 1);
    }

    #[test]
    fn burst_one_shot() {
        let mut e = ParticleEmitter::new(EmitterConfig {
            mode: EmissionMode::Burst,
            burst_count: 10,
            burst_interval: 0.0,
            ..Default::default()
        });
        let mut rng = Rng::new(1);
        assert_eq!(e.tick(16.0, &mut rng), 10);
        assert_eq!(e.tick(16.0, &mut rng), 0);
    }

    #[test]
    fn particles_expire() {
        let mut e = ParticleEmitter::new(EmitterConfig {
            mode: EmissionMode::Burst,
            burst_count: 3,
            lifetime: 100.0,
            ..Default::default()
        });
        let mut rng = Rng::new(1);
        e.tick(16.0, &mut rng);
        e.tick(120.0, &mut rng);
        assert!(e.particles().is_empty());
    }

    #[test]
    fn inactive_emitter_only_ages() {
        let mut e = ParticleEmitter::new(EmitterConfig::default());
        e.active = false;
        let mut rng = Rng::new(1);
        assert_eq!(e.tick(5000.0, &mut rng), 0);
    }

    #[test]
    fn config_reads_camel_case() {
        let cfg: EmitterConfig =
            serde_json::from_str(r#"{ "mode": "burst", "burstCount": 4, "speedMax": 5 }"#).unwrap();
        assert_eq!(cfg.mode, EmissionMode::Burst);
        assert_eq!(cfg.burst_count, 4);
        assert_eq!(cfg.speed_max, 5.0);
        assert_eq!(cfg.rate, 10.0);
    }
}
