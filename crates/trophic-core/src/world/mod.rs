use crate::config::{ConfigError, EcosystemConfig};
use crate::genome::MutationParams;
use crate::metrics::{
    mean, ChainOutcome, OrganismSnapshot, PopulationCounts, PopulationStats, RunSummary,
    StepMetrics, TickReport, WorldSnapshot,
};
use crate::organism::{Organism, TrophicProfile, TrophicTag};
use crate::rng::{create_rng, derive_rng};
use crate::space::Torus;
use rand_chacha::ChaCha12Rng;
use std::time::Instant;
use std::{error::Error, fmt};

/// Simulation context. Owns the four populations, the random source and all
/// counters; nothing outside the world can mutate a population.
pub struct World {
    producers: Vec<Organism>,
    herbivores: Vec<Organism>,
    predators: Vec<Organism>,
    apex: Vec<Organism>,
    config: EcosystemConfig,
    torus: Torus,
    /// Herbivore, predator, apex.
    profiles: [TrophicProfile; 3],
    mutation: MutationParams,
    rng: ChaCha12Rng,
    tick_index: u64,
    next_id: u64,
    total_births: PopulationCounts,
    total_starved: PopulationCounts,
    total_eaten: PopulationCounts,
    last_births: usize,
    last_deaths: usize,

    // Offspring produced during the consumer phases, appended at commit.
    offspring_buffer: Vec<Organism>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldInitError {
    Config(ConfigError),
    WrongTag {
        expected: TrophicTag,
        actual: TrophicTag,
    },
    NonPositiveEnergy {
        tag: TrophicTag,
        id: u64,
    },
    OutOfBounds {
        tag: TrophicTag,
        id: u64,
    },
    TooManyOrganisms {
        tag: TrophicTag,
        max: usize,
        actual: usize,
    },
}

impl fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldInitError::Config(e) => write!(f, "{}", e),
            WorldInitError::WrongTag { expected, actual } => {
                write!(f, "{actual} organism placed in the {expected} population")
            }
            WorldInitError::NonPositiveEnergy { tag, id } => {
                write!(f, "{tag} {id} must start with finite, positive energy")
            }
            WorldInitError::OutOfBounds { tag, id } => {
                write!(f, "{tag} {id} lies outside the world")
            }
            WorldInitError::TooManyOrganisms { tag, max, actual } => {
                write!(f, "{tag} population ({actual}) exceeds supported maximum ({max})")
            }
        }
    }
}

impl From<ConfigError> for WorldInitError {
    fn from(err: ConfigError) -> Self {
        WorldInitError::Config(err)
    }
}

impl Error for WorldInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldInitError::Config(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    TooManyTicks { max: u64, actual: u64 },
    TooManySamples { max: u64, actual: u64 },
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::TooManyTicks { max, actual } => {
                write!(f, "ticks ({actual}) exceed supported maximum ({max})")
            }
            ExperimentError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl Error for ExperimentError {}

/// Parameters of one driven run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunPlan {
    /// Tick budget.
    pub ticks: u64,
    /// Record a [`StepMetrics`] sample every this many ticks (and after the last).
    pub sample_every: u64,
    /// Stop as soon as herbivores or the whole carnivore chain are extinct.
    pub stop_on_collapse: bool,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            ticks: 10_000,
            sample_every: 100,
            stop_on_collapse: true,
        }
    }
}

const SEEDING_STREAM: u64 = 1;

impl World {
    pub const MAX_RUN_TICKS: u64 = 10_000_000;
    pub const MAX_RUN_SAMPLES: u64 = 100_000;

    /// Validate `config` and seed every population at uniform random
    /// positions with the baseline genome.
    pub fn new(config: EcosystemConfig) -> Result<Self, WorldInitError> {
        config.validate()?;
        let torus = Torus::new(config.width, config.height);
        let mut init_rng = derive_rng(config.seed, SEEDING_STREAM);
        let mut next_id = 0u64;
        let mut seed_population = |tag: TrophicTag| -> Vec<Organism> {
            (0..config.initial_count(tag))
                .map(|_| {
                    let id = next_id;
                    next_id += 1;
                    let position = torus.random_position(&mut init_rng);
                    Organism::spawn(id, tag, position, config.base_energy(tag))
                })
                .collect()
        };
        let producers = seed_population(TrophicTag::Producer);
        let herbivores = seed_population(TrophicTag::Herbivore);
        let predators = seed_population(TrophicTag::Predator);
        let apex = seed_population(TrophicTag::Apex);
        Self::from_populations(config, producers, herbivores, predators, apex)
    }

    /// Build a world from hand-placed populations, e.g. for scenarios.
    pub fn from_populations(
        config: EcosystemConfig,
        producers: Vec<Organism>,
        herbivores: Vec<Organism>,
        predators: Vec<Organism>,
        apex: Vec<Organism>,
    ) -> Result<Self, WorldInitError> {
        config.validate()?;
        let torus = Torus::new(config.width, config.height);
        for (tag, population) in [
            (TrophicTag::Producer, &producers),
            (TrophicTag::Herbivore, &herbivores),
            (TrophicTag::Predator, &predators),
            (TrophicTag::Apex, &apex),
        ] {
            Self::validate_population(&torus, tag, population)?;
        }

        let next_id = [&producers, &herbivores, &predators, &apex]
            .into_iter()
            .flatten()
            .map(|o| o.id.saturating_add(1))
            .max()
            .unwrap_or(0);
        let profiles = [
            TrophicProfile::from_params(TrophicTag::Herbivore, &config.herbivores),
            TrophicProfile::from_params(TrophicTag::Predator, &config.predators),
            TrophicProfile::from_params(TrophicTag::Apex, &config.apex),
        ];
        let mutation = config.mutation_params();
        let rng = create_rng(config.seed);

        Ok(Self {
            producers,
            herbivores,
            predators,
            apex,
            config,
            torus,
            profiles,
            mutation,
            rng,
            tick_index: 0,
            next_id,
            total_births: PopulationCounts::default(),
            total_starved: PopulationCounts::default(),
            total_eaten: PopulationCounts::default(),
            last_births: 0,
            last_deaths: 0,
            offspring_buffer: Vec::new(),
        })
    }

    fn validate_population(
        torus: &Torus,
        tag: TrophicTag,
        population: &[Organism],
    ) -> Result<(), WorldInitError> {
        if population.len() > EcosystemConfig::MAX_POPULATION {
            return Err(WorldInitError::TooManyOrganisms {
                tag,
                max: EcosystemConfig::MAX_POPULATION,
                actual: population.len(),
            });
        }
        for org in population {
            if org.tag != tag {
                return Err(WorldInitError::WrongTag {
                    expected: tag,
                    actual: org.tag,
                });
            }
            if !(org.energy.is_finite() && org.energy > 0.0) {
                return Err(WorldInitError::NonPositiveEnergy { tag, id: org.id });
            }
            if !torus.contains(org.position) {
                return Err(WorldInitError::OutOfBounds { tag, id: org.id });
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    pub fn torus(&self) -> &Torus {
        &self.torus
    }

    /// Number of completed ticks.
    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Constant table of a consumer tier; `None` for producers.
    pub fn profile(&self, tag: TrophicTag) -> Option<&TrophicProfile> {
        match tag {
            TrophicTag::Producer => None,
            TrophicTag::Herbivore => Some(&self.profiles[0]),
            TrophicTag::Predator => Some(&self.profiles[1]),
            TrophicTag::Apex => Some(&self.profiles[2]),
        }
    }

    /// Live members of one population in insertion order.
    pub fn population(&self, tag: TrophicTag) -> &[Organism] {
        match tag {
            TrophicTag::Producer => &self.producers,
            TrophicTag::Herbivore => &self.herbivores,
            TrophicTag::Predator => &self.predators,
            TrophicTag::Apex => &self.apex,
        }
    }

    fn population_mut(&mut self, tag: TrophicTag) -> &mut Vec<Organism> {
        match tag {
            TrophicTag::Producer => &mut self.producers,
            TrophicTag::Herbivore => &mut self.herbivores,
            TrophicTag::Predator => &mut self.predators,
            TrophicTag::Apex => &mut self.apex,
        }
    }

    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            producers: self.producers.len(),
            herbivores: self.herbivores.len(),
            predators: self.predators.len(),
            apex: self.apex.len(),
        }
    }

    pub fn outcome(&self) -> ChainOutcome {
        ChainOutcome::from_counts(&self.counts())
    }

    pub fn population_stats(&self, tag: TrophicTag) -> PopulationStats {
        PopulationStats::from_population(tag, self.population(tag))
    }

    /// Current population summary. Births and deaths are those of the most
    /// recent tick, zero before the first one.
    pub fn step_metrics(&self) -> StepMetrics {
        let consumers = TrophicTag::CONSUMERS
            .into_iter()
            .flat_map(|tag| self.population(tag));
        let tier_mean = |tag: TrophicTag| mean(self.population(tag).iter().map(|o| o.energy));
        StepMetrics {
            tick: self.tick_index,
            counts: self.counts(),
            consumer_energy_mean: mean(consumers.map(|o| o.energy)),
            herbivore_energy_mean: tier_mean(TrophicTag::Herbivore),
            predator_energy_mean: tier_mean(TrophicTag::Predator),
            apex_energy_mean: tier_mean(TrophicTag::Apex),
            births: self.last_births,
            deaths: self.last_deaths,
        }
    }

    /// Read-only copy of every organism's tag, position and energy.
    pub fn snapshot(&self) -> WorldSnapshot {
        let view = |tag: TrophicTag| -> Vec<OrganismSnapshot> {
            self.population(tag)
                .iter()
                .map(OrganismSnapshot::from)
                .collect()
        };
        WorldSnapshot {
            tick: self.tick_index,
            width: self.config.width,
            height: self.config.height,
            producers: view(TrophicTag::Producer),
            herbivores: view(TrophicTag::Herbivore),
            predators: view(TrophicTag::Predator),
            apex: view(TrophicTag::Apex),
        }
    }

    /// Advance the world by one tick: drift, herbivore, predator and apex
    /// phases, commit, then producer regeneration.
    pub fn tick(&mut self) -> TickReport {
        let start = Instant::now();
        let before = self.counts();
        self.tick_index = self.tick_index.saturating_add(1);
        let mut report = TickReport {
            tick: self.tick_index,
            ..TickReport::default()
        };

        self.step_drift_phase();
        for tag in TrophicTag::CONSUMERS {
            self.step_consumer_phase(tag, &mut report);
        }
        self.step_commit_phase(&mut report);
        self.step_regeneration_phase(&mut report);

        self.total_births.accumulate(&report.births);
        *self.total_births.get_mut(TrophicTag::Producer) += report.regenerated;
        self.total_starved.accumulate(&report.starved);
        self.total_eaten.accumulate(&report.eaten);
        self.last_births = report.total_births();
        self.last_deaths = report.total_deaths();

        let after = self.counts();
        for tag in TrophicTag::CONSUMERS {
            if before.get(tag) > 0 && after.get(tag) == 0 {
                tracing::info!(tick = self.tick_index, tier = %tag, "tier went extinct");
            }
        }
        tracing::debug!(
            tick = self.tick_index,
            producers = after.producers,
            herbivores = after.herbivores,
            predators = after.predators,
            apex = after.apex,
            births = report.total_births(),
            deaths = report.total_deaths(),
            "tick complete"
        );

        report.elapsed_us = start.elapsed().as_micros() as u64;
        report
    }

    pub fn run(&mut self, plan: &RunPlan) -> RunSummary {
        self.try_run(plan).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Tick up to `plan.ticks` times, sampling metrics along the way.
    pub fn try_run(&mut self, plan: &RunPlan) -> Result<RunSummary, ExperimentError> {
        if plan.sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if plan.ticks > Self::MAX_RUN_TICKS {
            return Err(ExperimentError::TooManyTicks {
                max: Self::MAX_RUN_TICKS,
                actual: plan.ticks,
            });
        }
        let estimated_samples = if plan.ticks == 0 {
            0
        } else {
            ((plan.ticks - 1) / plan.sample_every) + 1
        };
        if estimated_samples > Self::MAX_RUN_SAMPLES {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_RUN_SAMPLES,
                actual: estimated_samples,
            });
        }

        let births_before = self.total_births;
        let starved_before = self.total_starved;
        let eaten_before = self.total_eaten;
        let mut samples = Vec::with_capacity(estimated_samples as usize);
        let mut ticks_run = 0u64;
        let mut stopped_early = false;

        for step in 1..=plan.ticks {
            if plan.stop_on_collapse && self.outcome().is_terminal() {
                stopped_early = true;
                break;
            }
            self.tick();
            ticks_run = step;
            let collapsed = plan.stop_on_collapse && self.outcome().is_terminal();
            if step % plan.sample_every == 0 || step == plan.ticks || collapsed {
                samples.push(self.step_metrics());
            }
        }
        if stopped_early {
            tracing::info!(
                tick = self.tick_index,
                outcome = ?self.outcome(),
                "food chain collapsed, stopping run"
            );
        }

        Ok(RunSummary {
            schema_version: 1,
            ticks_requested: plan.ticks,
            ticks_run,
            sample_every: plan.sample_every,
            stopped_early,
            outcome: self.outcome(),
            final_counts: self.counts(),
            samples,
            total_births: diff_counts(&self.total_births, &births_before),
            total_starved: diff_counts(&self.total_starved, &starved_before),
            total_eaten: diff_counts(&self.total_eaten, &eaten_before),
        })
    }
}

fn diff_counts(now: &PopulationCounts, before: &PopulationCounts) -> PopulationCounts {
    let mut out = PopulationCounts::default();
    for tag in TrophicTag::ALL {
        *out.get_mut(tag) = now.get(tag) - before.get(tag);
    }
    out
}

mod phases;
