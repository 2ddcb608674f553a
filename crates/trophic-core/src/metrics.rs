use crate::genome::{Gene, Genome};
use crate::organism::{Organism, TrophicTag};
use serde::{Deserialize, Serialize};

/// One number per trophic tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub producers: usize,
    pub herbivores: usize,
    pub predators: usize,
    pub apex: usize,
}

impl PopulationCounts {
    pub fn get(&self, tag: TrophicTag) -> usize {
        match tag {
            TrophicTag::Producer => self.producers,
            TrophicTag::Herbivore => self.herbivores,
            TrophicTag::Predator => self.predators,
            TrophicTag::Apex => self.apex,
        }
    }

    pub fn get_mut(&mut self, tag: TrophicTag) -> &mut usize {
        match tag {
            TrophicTag::Producer => &mut self.producers,
            TrophicTag::Herbivore => &mut self.herbivores,
            TrophicTag::Predator => &mut self.predators,
            TrophicTag::Apex => &mut self.apex,
        }
    }

    pub fn total(&self) -> usize {
        self.producers + self.herbivores + self.predators + self.apex
    }

    pub fn accumulate(&mut self, other: &PopulationCounts) {
        for tag in TrophicTag::ALL {
            *self.get_mut(tag) += other.get(tag);
        }
    }
}

/// State of the food chain above the producers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOutcome {
    /// Herbivores and at least one carnivore tier are alive.
    Ongoing,
    /// Predators and apex predators are extinct; herbivores remain.
    HerbivoresOnly,
    /// Herbivores are extinct; some carnivores remain, starving.
    CarnivoresOnly,
    /// No consumer of any tier is left.
    Collapsed,
}

impl ChainOutcome {
    pub fn from_counts(counts: &PopulationCounts) -> Self {
        let herbivores = counts.herbivores > 0;
        let carnivores = counts.predators + counts.apex > 0;
        match (herbivores, carnivores) {
            (true, true) => ChainOutcome::Ongoing,
            (true, false) => ChainOutcome::HerbivoresOnly,
            (false, true) => ChainOutcome::CarnivoresOnly,
            (false, false) => ChainOutcome::Collapsed,
        }
    }

    /// Either the herbivores or the whole carnivore chain is gone.
    pub fn is_terminal(self) -> bool {
        self != ChainOutcome::Ongoing
    }
}

/// Read-only view of one organism for renderers and loggers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrganismSnapshot {
    pub id: u64,
    pub tag: TrophicTag,
    pub x: f64,
    pub y: f64,
    pub energy: f64,
}

impl From<&Organism> for OrganismSnapshot {
    fn from(org: &Organism) -> Self {
        Self {
            id: org.id,
            tag: org.tag,
            x: org.position[0],
            y: org.position[1],
            energy: org.energy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: u32,
    pub height: u32,
    pub producers: Vec<OrganismSnapshot>,
    pub herbivores: Vec<OrganismSnapshot>,
    pub predators: Vec<OrganismSnapshot>,
    pub apex: Vec<OrganismSnapshot>,
}

impl WorldSnapshot {
    pub fn population(&self, tag: TrophicTag) -> &[OrganismSnapshot] {
        match tag {
            TrophicTag::Producer => &self.producers,
            TrophicTag::Herbivore => &self.herbivores,
            TrophicTag::Predator => &self.predators,
            TrophicTag::Apex => &self.apex,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub tag: TrophicTag,
    pub count: usize,
    pub mean_energy: f64,
    /// Per-gene population mean; all zeros for an empty population.
    pub mean_genome: Genome,
    pub max_generation: u32,
}

impl PopulationStats {
    pub fn from_population(tag: TrophicTag, organisms: &[Organism]) -> Self {
        let mut mean_genome = Genome::new(0.0, 0.0, 0.0, 0.0);
        for gene in Gene::ALL {
            mean_genome.set(gene, mean(organisms.iter().map(|o| o.genome.get(gene))));
        }
        Self {
            tag,
            count: organisms.len(),
            mean_energy: mean(organisms.iter().map(|o| o.energy)),
            mean_genome,
            max_generation: organisms.iter().map(|o| o.generation).max().unwrap_or(0),
        }
    }
}

/// Per-tick sample recorded by [`crate::world::World::try_run`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepMetrics {
    pub tick: u64,
    pub counts: PopulationCounts,
    /// Mean energy over every consumer, all tiers pooled.
    pub consumer_energy_mean: f64,
    pub herbivore_energy_mean: f64,
    pub predator_energy_mean: f64,
    pub apex_energy_mean: f64,
    pub births: usize,
    pub deaths: usize,
}

/// What happened during one call to [`crate::world::World::tick`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    /// Offspring added at commit, by tier.
    pub births: PopulationCounts,
    /// Consumers that ended their turn with `energy <= 0`, by tier.
    pub starved: PopulationCounts,
    /// Organisms eaten, by the tier that was eaten.
    pub eaten: PopulationCounts,
    /// Producers spawned by regeneration.
    pub regenerated: usize,
    pub elapsed_us: u64,
}

impl TickReport {
    pub fn total_births(&self) -> usize {
        self.births.total() + self.regenerated
    }

    pub fn total_deaths(&self) -> usize {
        self.starved.total() + self.eaten.total()
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticks_requested: u64,
    pub ticks_run: u64,
    pub sample_every: u64,
    pub stopped_early: bool,
    pub outcome: ChainOutcome,
    pub final_counts: PopulationCounts,
    pub samples: Vec<StepMetrics>,
    #[serde(default)]
    pub total_births: PopulationCounts,
    #[serde(default)]
    pub total_starved: PopulationCounts,
    #[serde(default)]
    pub total_eaten: PopulationCounts,
}

/// Arithmetic mean; zero for an empty input.
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n > 0 {
        sum / n as f64
    } else {
        0.0
    }
}
