pub mod config;
pub mod constants;
pub mod genome;
pub mod metrics;
pub mod organism;
pub mod rng;
pub mod space;
pub mod spatial;
pub mod world;

pub use config::{ConfigError, ConsumerParams, EcosystemConfig, ProducerParams, SpatialIndexMode};
pub use constants::{MAX_POPULATION, MAX_WORLD_DIMENSION};
pub use genome::{Gene, GeneBounds, GeneRange, Genome, MutationParams};
pub use metrics::{
    ChainOutcome, OrganismSnapshot, PopulationCounts, PopulationStats, RunSummary, StepMetrics,
    TickReport, WorldSnapshot,
};
pub use organism::{Organism, TrophicProfile, TrophicTag};
pub use space::{Position, Torus};
pub use world::{ExperimentError, RunPlan, World, WorldInitError};
