/// Largest valid world dimension (world units) on either axis.
pub const MAX_WORLD_DIMENSION: u32 = 4096;

/// Smallest value any gene may take after mutation. A zero speed or zero
/// metabolism gene would freeze movement and make wandering free.
pub const GENE_EPSILON: f64 = 0.01;

/// Upper bound on the number of organisms seeded into a single population.
pub const MAX_POPULATION: usize = 100_000;

/// Prime multiplier used to derive independent RNG streams from a base seed.
pub const RNG_DERIVATION_PRIME: u64 = 7919;
