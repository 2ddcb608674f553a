use crate::config::ConsumerParams;
use crate::genome::{Genome, MutationParams};
use crate::space::{Position, Torus};
use crate::spatial::SpatialResolver;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an organism in the food chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrophicTag {
    Producer,
    Herbivore,
    Predator,
    Apex,
}

impl TrophicTag {
    pub const ALL: [TrophicTag; 4] = [
        TrophicTag::Producer,
        TrophicTag::Herbivore,
        TrophicTag::Predator,
        TrophicTag::Apex,
    ];

    /// Consumer tiers in phase order.
    pub const CONSUMERS: [TrophicTag; 3] =
        [TrophicTag::Herbivore, TrophicTag::Predator, TrophicTag::Apex];

    /// The single tier this tier feeds on. Producers feed on nothing.
    pub fn prey(self) -> Option<TrophicTag> {
        match self {
            TrophicTag::Producer => None,
            TrophicTag::Herbivore => Some(TrophicTag::Producer),
            TrophicTag::Predator => Some(TrophicTag::Herbivore),
            TrophicTag::Apex => Some(TrophicTag::Predator),
        }
    }

    pub fn is_consumer(self) -> bool {
        self != TrophicTag::Producer
    }

    pub fn name(self) -> &'static str {
        match self {
            TrophicTag::Producer => "producer",
            TrophicTag::Herbivore => "herbivore",
            TrophicTag::Predator => "predator",
            TrophicTag::Apex => "apex",
        }
    }
}

impl fmt::Display for TrophicTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Constant table of one consumer tier, resolved from [`ConsumerParams`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrophicProfile {
    pub tag: TrophicTag,
    pub base_energy: f64,
    pub reproduction_threshold: f64,
    pub reproduction_cost: f64,
    pub capture_radius: f64,
    pub food_energy: f64,
    pub metabolic_cost: f64,
    pub vision_scale: f64,
}

impl TrophicProfile {
    pub fn from_params(tag: TrophicTag, params: &ConsumerParams) -> Self {
        debug_assert!(tag.is_consumer(), "producers have no consumer profile");
        Self {
            tag,
            base_energy: params.base_energy,
            reproduction_threshold: params.reproduction_threshold,
            reproduction_cost: params.reproduction_cost,
            capture_radius: params.capture_radius,
            food_energy: params.food_energy,
            metabolic_cost: params.metabolic_cost,
            vision_scale: params.vision_scale,
        }
    }

    pub fn search_radius(&self, genome: &Genome) -> f64 {
        genome.vision() * self.vision_scale
    }
}

/// What a consumer did during its move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    /// Stepped toward the food item at this index.
    Pursued(usize),
    /// No food in sight; took a random step.
    Wandered,
    /// No food in sight and the speed roll failed.
    Rested,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub id: u64,
    pub tag: TrophicTag,
    pub position: Position,
    pub energy: f64,
    pub genome: Genome,
    pub generation: u32,
}

impl Organism {
    pub fn new(id: u64, tag: TrophicTag, position: Position, energy: f64, genome: Genome) -> Self {
        Self {
            id,
            tag,
            position,
            energy,
            genome,
            generation: 0,
        }
    }

    /// Parentless organism with the baseline genome.
    pub fn spawn(id: u64, tag: TrophicTag, position: Position, energy: f64) -> Self {
        Self::new(id, tag, position, energy, Genome::default())
    }

    /// Energy at or below zero is death, including exactly zero.
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    fn move_probability(&self) -> f64 {
        self.genome.speed().clamp(0.0, 1.0)
    }

    /// Producer drift: with probability `speed`, displace both axes by up to
    /// `magnitude`. Costs nothing.
    pub fn drift<R: Rng + ?Sized>(&mut self, torus: &Torus, magnitude: f64, rng: &mut R) {
        if !rng.random_bool(self.move_probability()) {
            return;
        }
        let dx = rng.random_range(-magnitude..=magnitude);
        let dy = rng.random_range(-magnitude..=magnitude);
        self.position = torus.wrap([self.position[0] + dx, self.position[1] + dy]);
    }

    /// Consumer movement: step toward the nearest visible food, or wander.
    /// The tier's metabolic cost is paid afterwards either way.
    pub fn hunt_or_wander<S, R>(
        &mut self,
        profile: &TrophicProfile,
        food: &[Organism],
        resolver: &S,
        torus: &Torus,
        step_size: f64,
        rng: &mut R,
    ) -> Movement
    where
        S: SpatialResolver + ?Sized,
        R: Rng + ?Sized,
    {
        let radius = profile.search_radius(&self.genome);
        let movement = match resolver.nearest_within(food, self.position, radius) {
            Some(target) => {
                let [dx, dy] = torus.delta(self.position, food[target].position);
                self.position = torus.wrap([
                    self.position[0] + step_sign(dx) * step_size,
                    self.position[1] + step_sign(dy) * step_size,
                ]);
                Movement::Pursued(target)
            }
            None if rng.random_bool(self.move_probability()) => {
                let dx = f64::from(rng.random_range(-1i32..=1)) * step_size;
                let dy = f64::from(rng.random_range(-1i32..=1)) * step_size;
                self.position = torus.wrap([self.position[0] + dx, self.position[1] + dy]);
                self.energy -= self.genome.metabolism();
                Movement::Wandered
            }
            None => Movement::Rested,
        };
        self.energy -= profile.metabolic_cost;
        movement
    }

    /// Consume every live food item within the capture radius. Captured items
    /// are killed in place and removed at commit. Returns the capture count.
    pub fn feed<S>(&mut self, profile: &TrophicProfile, food: &mut [Organism], resolver: &S) -> usize
    where
        S: SpatialResolver + ?Sized,
    {
        let captured = resolver.capture_all_within(food, self.position, profile.capture_radius);
        for &idx in &captured {
            food[idx].energy = 0.0;
        }
        let gain_per_capture = self.genome.efficiency() * profile.food_energy;
        self.energy += gain_per_capture * captured.len() as f64;
        captured.len()
    }

    /// Spawn one offspring at the current position when energy has reached
    /// the tier's threshold, paying the reproduction cost.
    pub fn reproduce<R: Rng + ?Sized>(
        &mut self,
        profile: &TrophicProfile,
        mutation: &MutationParams,
        next_id: &mut u64,
        rng: &mut R,
    ) -> Option<Organism> {
        if self.energy < profile.reproduction_threshold {
            return None;
        }
        self.energy -= profile.reproduction_cost;
        let id = *next_id;
        *next_id = next_id.saturating_add(1);
        Some(Organism {
            id,
            tag: self.tag,
            position: self.position,
            energy: profile.base_energy,
            genome: self.genome.mutate(rng, mutation),
            generation: self.generation.saturating_add(1),
        })
    }
}

fn step_sign(delta: f64) -> f64 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}
