use crate::constants::{MAX_POPULATION, MAX_WORLD_DIMENSION};
use crate::genome::{Gene, GeneBounds, MutationParams};
use crate::organism::TrophicTag;
use serde::{Deserialize, Deserializer, Serialize};

/// Strategy used by the spatial resolver for food searches.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpatialIndexMode {
    /// Scan every candidate; cheapest at low hundreds of organisms.
    #[default]
    Linear,
    /// R*-tree over candidate positions, rebuilt once per phase.
    RTree,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProducerParams {
    /// Producers seeded at world creation.
    pub initial_count: usize,
    /// Energy of every producer; producers never spend it.
    pub base_energy: f64,
    /// Maximum per-axis drift displacement per tick.
    pub drift_magnitude: f64,
    /// Regeneration only happens while the population is below this size.
    pub regeneration_floor: usize,
    /// Per-tick probability of spawning one producer while below the floor.
    pub regeneration_probability: f64,
}

impl Default for ProducerParams {
    fn default() -> Self {
        Self {
            initial_count: 150,
            base_energy: 10.0,
            drift_magnitude: 0.5,
            regeneration_floor: 120,
            regeneration_probability: 0.3,
        }
    }
}

/// Per-tier constants for herbivores, predators and apex predators.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsumerParams {
    /// Organisms seeded at world creation.
    pub initial_count: usize,
    /// Energy of seeded organisms and of newborn offspring.
    pub base_energy: f64,
    /// Minimum energy required to reproduce.
    pub reproduction_threshold: f64,
    /// Energy deducted from the parent on reproduction.
    pub reproduction_cost: f64,
    /// Food closer than this is consumed.
    pub capture_radius: f64,
    /// Energy per captured food item before the efficiency gene.
    pub food_energy: f64,
    /// Energy paid every tick whether or not the organism moved.
    pub metabolic_cost: f64,
    /// Multiplier applied to the vision gene to obtain the search radius.
    pub vision_scale: f64,
}

impl Default for ConsumerParams {
    fn default() -> Self {
        Self::herbivore()
    }
}

impl ConsumerParams {
    pub fn herbivore() -> Self {
        Self {
            initial_count: 15,
            base_energy: 20.0,
            reproduction_threshold: 50.0,
            reproduction_cost: 25.0,
            capture_radius: 1.5,
            food_energy: 30.0,
            metabolic_cost: 0.2,
            vision_scale: 1.0,
        }
    }

    pub fn predator() -> Self {
        Self {
            initial_count: 5,
            base_energy: 30.0,
            reproduction_threshold: 120.0,
            reproduction_cost: 30.0,
            capture_radius: 2.0,
            food_energy: 40.0,
            metabolic_cost: 0.2,
            vision_scale: 1.2,
        }
    }

    pub fn apex() -> Self {
        Self {
            initial_count: 2,
            base_energy: 50.0,
            reproduction_threshold: 200.0,
            reproduction_cost: 40.0,
            capture_radius: 2.5,
            food_energy: 60.0,
            metabolic_cost: 0.1,
            vision_scale: 1.5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Deterministic seed for reproducible simulation runs.
    pub seed: u64,
    /// Width of the toroidal world in world units.
    pub width: u32,
    /// Height of the toroidal world in world units.
    pub height: u32,
    pub producers: ProducerParams,
    #[serde(deserialize_with = "herbivore_params")]
    pub herbivores: ConsumerParams,
    #[serde(deserialize_with = "predator_params")]
    pub predators: ConsumerParams,
    #[serde(deserialize_with = "apex_params")]
    pub apex: ConsumerParams,
    /// Per-axis displacement of one hunting or wander step.
    pub step_size: f64,
    /// Half-width of the multiplicative mutation factor.
    pub mutation_strength: f64,
    /// Per-gene probability of mutation at birth.
    pub mutation_rate: f64,
    pub gene_bounds: GeneBounds,
    pub spatial_index: SpatialIndexMode,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 50,
            height: 50,
            producers: ProducerParams::default(),
            herbivores: ConsumerParams::herbivore(),
            predators: ConsumerParams::predator(),
            apex: ConsumerParams::apex(),
            step_size: 1.0,
            mutation_strength: 0.1,
            mutation_rate: 1.0,
            gene_bounds: GeneBounds::default(),
            spatial_index: SpatialIndexMode::Linear,
        }
    }
}

/// Partial consumer block from a config file. Missing fields fall back to
/// the defaults of the tier the block belongs to.
#[derive(Deserialize)]
struct ConsumerOverrides {
    initial_count: Option<usize>,
    base_energy: Option<f64>,
    reproduction_threshold: Option<f64>,
    reproduction_cost: Option<f64>,
    capture_radius: Option<f64>,
    food_energy: Option<f64>,
    metabolic_cost: Option<f64>,
    vision_scale: Option<f64>,
}

impl ConsumerOverrides {
    fn apply(self, base: ConsumerParams) -> ConsumerParams {
        ConsumerParams {
            initial_count: self.initial_count.unwrap_or(base.initial_count),
            base_energy: self.base_energy.unwrap_or(base.base_energy),
            reproduction_threshold: self
                .reproduction_threshold
                .unwrap_or(base.reproduction_threshold),
            reproduction_cost: self.reproduction_cost.unwrap_or(base.reproduction_cost),
            capture_radius: self.capture_radius.unwrap_or(base.capture_radius),
            food_energy: self.food_energy.unwrap_or(base.food_energy),
            metabolic_cost: self.metabolic_cost.unwrap_or(base.metabolic_cost),
            vision_scale: self.vision_scale.unwrap_or(base.vision_scale),
        }
    }
}

fn herbivore_params<'de, D: Deserializer<'de>>(d: D) -> Result<ConsumerParams, D::Error> {
    ConsumerOverrides::deserialize(d).map(|o| o.apply(ConsumerParams::herbivore()))
}

fn predator_params<'de, D: Deserializer<'de>>(d: D) -> Result<ConsumerParams, D::Error> {
    ConsumerOverrides::deserialize(d).map(|o| o.apply(ConsumerParams::predator()))
}

fn apex_params<'de, D: Deserializer<'de>>(d: D) -> Result<ConsumerParams, D::Error> {
    ConsumerOverrides::deserialize(d).map(|o| o.apply(ConsumerParams::apex()))
}

macro_rules! define_config_error {
    (
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ConfigError {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for ConfigError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }
    };
}

define_config_error! {
    InvalidWorldWidth => "width must be greater than 0";
    InvalidWorldHeight => "height must be greater than 0";
    WorldTooLarge { max: u32, actual: u32 } => "world dimension ({}) exceeds supported maximum ({})", actual, max;
    TooManyOrganisms { tag: TrophicTag, max: usize, actual: usize } => "{} initial_count ({}) exceeds supported maximum ({})", tag, actual, max;
    InvalidBaseEnergy { tag: TrophicTag } => "{} base_energy must be finite and positive", tag;
    InvalidDriftMagnitude => "producers drift_magnitude must be finite and non-negative";
    InvalidRegenerationProbability => "producers regeneration_probability must be finite and within [0,1]";
    InvalidReproductionThreshold { tag: TrophicTag } => "{} reproduction_threshold must be finite and positive", tag;
    InvalidReproductionCost { tag: TrophicTag } => "{} reproduction_cost must be finite and positive", tag;
    ReproductionCostExceedsThreshold { tag: TrophicTag } => "{} reproduction_cost must not exceed reproduction_threshold", tag;
    InvalidCaptureRadius { tag: TrophicTag } => "{} capture_radius must be finite and non-negative", tag;
    InvalidFoodEnergy { tag: TrophicTag } => "{} food_energy must be finite and non-negative", tag;
    InvalidMetabolicCost { tag: TrophicTag } => "{} metabolic_cost must be finite and non-negative", tag;
    InvalidVisionScale { tag: TrophicTag } => "{} vision_scale must be finite and non-negative", tag;
    InvalidStepSize => "step_size must be finite and positive";
    InvalidMutationStrength => "mutation_strength must be finite and within [0,1]";
    InvalidMutationRate => "mutation_rate must be finite and within [0,1]";
    InvalidGeneBounds { gene: Gene } => "gene_bounds.{} must be finite, non-negative, ordered, and reach at least the gene floor", gene;
}

impl std::error::Error for ConfigError {}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn is_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn is_probability(v: f64) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

impl EcosystemConfig {
    pub const MAX_WORLD_DIMENSION: u32 = MAX_WORLD_DIMENSION;
    pub const MAX_POPULATION: usize = MAX_POPULATION;

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_world()?;
        self.validate_producers()?;
        for tag in TrophicTag::CONSUMERS {
            self.validate_consumer(tag)?;
        }
        self.validate_movement()?;
        self.validate_mutation()?;
        Ok(())
    }

    /// Parameter block of a consumer tier; `None` for producers.
    pub fn consumer_params(&self, tag: TrophicTag) -> Option<&ConsumerParams> {
        match tag {
            TrophicTag::Producer => None,
            TrophicTag::Herbivore => Some(&self.herbivores),
            TrophicTag::Predator => Some(&self.predators),
            TrophicTag::Apex => Some(&self.apex),
        }
    }

    pub fn initial_count(&self, tag: TrophicTag) -> usize {
        match self.consumer_params(tag) {
            Some(params) => params.initial_count,
            None => self.producers.initial_count,
        }
    }

    pub fn base_energy(&self, tag: TrophicTag) -> f64 {
        match self.consumer_params(tag) {
            Some(params) => params.base_energy,
            None => self.producers.base_energy,
        }
    }

    pub fn mutation_params(&self) -> MutationParams {
        MutationParams {
            strength: self.mutation_strength,
            rate: self.mutation_rate,
            bounds: self.gene_bounds,
        }
    }

    fn validate_world(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::InvalidWorldWidth);
        }
        if self.height == 0 {
            return Err(ConfigError::InvalidWorldHeight);
        }
        let largest = self.width.max(self.height);
        if largest > Self::MAX_WORLD_DIMENSION {
            return Err(ConfigError::WorldTooLarge {
                max: Self::MAX_WORLD_DIMENSION,
                actual: largest,
            });
        }
        for tag in TrophicTag::ALL {
            let actual = self.initial_count(tag);
            if actual > Self::MAX_POPULATION {
                return Err(ConfigError::TooManyOrganisms {
                    tag,
                    max: Self::MAX_POPULATION,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn validate_producers(&self) -> Result<(), ConfigError> {
        let p = &self.producers;
        if !is_positive(p.base_energy) {
            return Err(ConfigError::InvalidBaseEnergy {
                tag: TrophicTag::Producer,
            });
        }
        if !is_non_negative(p.drift_magnitude) {
            return Err(ConfigError::InvalidDriftMagnitude);
        }
        if !is_probability(p.regeneration_probability) {
            return Err(ConfigError::InvalidRegenerationProbability);
        }
        Ok(())
    }

    fn validate_consumer(&self, tag: TrophicTag) -> Result<(), ConfigError> {
        let Some(p) = self.consumer_params(tag) else {
            return Ok(());
        };
        if !is_positive(p.base_energy) {
            return Err(ConfigError::InvalidBaseEnergy { tag });
        }
        if !is_positive(p.reproduction_threshold) {
            return Err(ConfigError::InvalidReproductionThreshold { tag });
        }
        if !is_positive(p.reproduction_cost) {
            return Err(ConfigError::InvalidReproductionCost { tag });
        }
        if p.reproduction_cost > p.reproduction_threshold {
            return Err(ConfigError::ReproductionCostExceedsThreshold { tag });
        }
        if !is_non_negative(p.capture_radius) {
            return Err(ConfigError::InvalidCaptureRadius { tag });
        }
        if !is_non_negative(p.food_energy) {
            return Err(ConfigError::InvalidFoodEnergy { tag });
        }
        if !is_non_negative(p.metabolic_cost) {
            return Err(ConfigError::InvalidMetabolicCost { tag });
        }
        if !is_non_negative(p.vision_scale) {
            return Err(ConfigError::InvalidVisionScale { tag });
        }
        Ok(())
    }

    fn validate_movement(&self) -> Result<(), ConfigError> {
        if !is_positive(self.step_size) {
            return Err(ConfigError::InvalidStepSize);
        }
        Ok(())
    }

    fn validate_mutation(&self) -> Result<(), ConfigError> {
        if !is_probability(self.mutation_strength) {
            return Err(ConfigError::InvalidMutationStrength);
        }
        if !is_probability(self.mutation_rate) {
            return Err(ConfigError::InvalidMutationRate);
        }
        if let Some(gene) = self.gene_bounds.first_invalid() {
            return Err(ConfigError::InvalidGeneBounds { gene });
        }
        Ok(())
    }
}
