// Particle work stack for a single event.
//
// Delta rays spawned during an inelastic collision are pushed here together
// with the history slot they were registered under. Particles are taken back
// last-in first-out: the newest delta ray is tracked to its end before any
// older one is started.

use crate::particle::Particle;

/// A particle waiting to be tracked, tagged with its history index
#[derive(Debug, Clone)]
pub struct BankedParticle {
    pub id: usize,
    pub particle: Particle,
}

/// LIFO stack of particles still to be transported in the current event
#[derive(Debug, Default)]
pub struct ParticleBank {
    stack: Vec<BankedParticle>,
}

impl ParticleBank {
    pub fn new() -> Self {
        ParticleBank { stack: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ParticleBank {
            stack: Vec::with_capacity(capacity),
        }
    }

    /// Add the primary of an event
    pub fn add_source_particle(&mut self, id: usize, particle: Particle) {
        self.stack.push(BankedParticle { id, particle });
    }

    /// Bank a delta ray spawned by an inelastic collision
    pub fn bank_secondary(&mut self, id: usize, particle: Particle) {
        self.stack.push(BankedParticle { id, particle });
    }

    /// Next particle to transport, the most recently banked one
    pub fn pop_particle(&mut self) -> Option<BankedParticle> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
