use crate::constants::GENE_EPSILON;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heritable traits carried by every organism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gene {
    /// Movement probability per tick.
    Speed,
    /// Energy paid for each wander step.
    Metabolism,
    /// Multiplier applied to energy gained from food.
    Efficiency,
    /// Food search radius before the per-tag vision scale.
    Vision,
}

impl Gene {
    pub const ALL: [Gene; 4] = [Gene::Speed, Gene::Metabolism, Gene::Efficiency, Gene::Vision];

    pub fn name(self) -> &'static str {
        match self {
            Gene::Speed => "speed",
            Gene::Metabolism => "metabolism",
            Gene::Efficiency => "efficiency",
            Gene::Vision => "vision",
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Gene vector. Values are kept inside their configured [`GeneRange`] by
/// every operation that produces a new genome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    speed: f64,
    metabolism: f64,
    efficiency: f64,
    vision: f64,
}

impl Default for Genome {
    fn default() -> Self {
        Self {
            speed: Self::BASELINE_SPEED,
            metabolism: Self::BASELINE_METABOLISM,
            efficiency: Self::BASELINE_EFFICIENCY,
            vision: Self::BASELINE_VISION,
        }
    }
}

/// Baseline genome for organisms without a parent.
pub fn default_genome() -> Genome {
    Genome::default()
}

impl Genome {
    pub const BASELINE_SPEED: f64 = 0.5;
    pub const BASELINE_METABOLISM: f64 = 0.5;
    pub const BASELINE_EFFICIENCY: f64 = 1.0;
    pub const BASELINE_VISION: f64 = 10.0;

    pub fn new(speed: f64, metabolism: f64, efficiency: f64, vision: f64) -> Self {
        Self {
            speed,
            metabolism,
            efficiency,
            vision,
        }
    }

    pub fn get(&self, gene: Gene) -> f64 {
        match gene {
            Gene::Speed => self.speed,
            Gene::Metabolism => self.metabolism,
            Gene::Efficiency => self.efficiency,
            Gene::Vision => self.vision,
        }
    }

    pub fn set(&mut self, gene: Gene, value: f64) {
        let slot = match gene {
            Gene::Speed => &mut self.speed,
            Gene::Metabolism => &mut self.metabolism,
            Gene::Efficiency => &mut self.efficiency,
            Gene::Vision => &mut self.vision,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Gene, f64)> + '_ {
        Gene::ALL.into_iter().map(move |gene| (gene, self.get(gene)))
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn metabolism(&self) -> f64 {
        self.metabolism
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub fn vision(&self) -> f64 {
        self.vision
    }

    /// Copy of this genome with every gene clamped into `bounds`.
    pub fn clamped(&self, bounds: &GeneBounds) -> Self {
        let mut out = *self;
        for gene in Gene::ALL {
            out.set(gene, bounds.range(gene).clamp(self.get(gene)));
        }
        out
    }

    /// Produce a child genome. Each gene is, with probability `params.rate`,
    /// scaled by a factor drawn uniformly from `[1 - strength, 1 + strength]`;
    /// the result is clamped into its range and floored at [`GENE_EPSILON`].
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, params: &MutationParams) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&params.strength),
            "mutation strength should be within [0,1]"
        );
        let mut child = *self;
        for gene in Gene::ALL {
            let range = params.bounds.range(gene);
            let parent = range.clamp(self.get(gene));
            let value = if rng.random::<f64>() < params.rate {
                let factor =
                    rng.random_range((1.0 - params.strength)..=(1.0 + params.strength));
                let product = parent * factor;
                if product.is_finite() {
                    product
                } else {
                    parent
                }
            } else {
                parent
            };
            child.set(gene, range.clamp(value));
        }
        child
    }
}

/// Inclusive value range for one gene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneRange {
    pub min: f64,
    pub max: f64,
}

impl GeneRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamp into the range and floor at [`GENE_EPSILON`]. NaN maps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        let value = if value.is_nan() { self.min } else { value };
        value.clamp(self.min, self.max).max(GENE_EPSILON)
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min >= 0.0
            && self.min <= self.max
            && self.max >= GENE_EPSILON
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneBounds {
    pub speed: GeneRange,
    pub metabolism: GeneRange,
    pub efficiency: GeneRange,
    pub vision: GeneRange,
}

impl Default for GeneBounds {
    fn default() -> Self {
        Self {
            speed: GeneRange::new(0.1, 1.5),
            metabolism: GeneRange::new(0.1, 2.0),
            efficiency: GeneRange::new(0.1, 3.0),
            vision: GeneRange::new(1.0, 15.0),
        }
    }
}

impl GeneBounds {
    pub fn range(&self, gene: Gene) -> GeneRange {
        match gene {
            Gene::Speed => self.speed,
            Gene::Metabolism => self.metabolism,
            Gene::Efficiency => self.efficiency,
            Gene::Vision => self.vision,
        }
    }

    /// Returns the first gene whose range is unusable: non-finite, negative,
    /// inverted, or entirely below [`GENE_EPSILON`].
    pub fn first_invalid(&self) -> Option<Gene> {
        Gene::ALL
            .into_iter()
            .find(|&gene| !self.range(gene).is_valid())
    }

    pub fn contains(&self, genome: &Genome) -> bool {
        genome.iter().all(|(gene, v)| self.range(gene).contains(v))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MutationParams {
    /// Half-width of the multiplicative factor interval.
    pub strength: f64,
    /// Per-gene probability that the gene is perturbed at all.
    pub rate: f64,
    pub bounds: GeneBounds,
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            strength: 0.1,
            rate: 1.0,
            bounds: GeneBounds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn default_genome_has_baseline_values() {
        let g = default_genome();
        assert_eq!(g.speed(), 0.5);
        assert_eq!(g.metabolism(), 0.5);
        assert_eq!(g.efficiency(), 1.0);
        assert_eq!(g.vision(), 10.0);
        assert!(GeneBounds::default().contains(&g));
    }

    #[test]
    fn mutation_is_deterministic_for_fixed_seed() {
        let parent = default_genome();
        let params = MutationParams::default();
        let mut rng_a = ChaCha12Rng::seed_from_u64(123);
        let mut rng_b = ChaCha12Rng::seed_from_u64(123);
        assert_eq!(
            parent.mutate(&mut rng_a, &params),
            parent.mutate(&mut rng_b, &params)
        );
    }

    #[test]
    fn zero_strength_copies_parent() {
        let parent = Genome::new(0.7, 1.2, 2.0, 5.5);
        let params = MutationParams {
            strength: 0.0,
            ..MutationParams::default()
        };
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        assert_eq!(parent.mutate(&mut rng, &params), parent);
    }

    #[test]
    fn zero_rate_copies_parent() {
        let parent = default_genome();
        let params = MutationParams {
            strength: 1.0,
            rate: 0.0,
            ..MutationParams::default()
        };
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        assert_eq!(parent.mutate(&mut rng, &params), parent);
    }

    #[test]
    fn out_of_range_parent_is_pulled_back_into_bounds() {
        let parent = Genome::new(50.0, -3.0, f64::INFINITY, f64::NAN);
        let params = MutationParams {
            strength: 0.0,
            ..MutationParams::default()
        };
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let child = parent.mutate(&mut rng, &params);
        assert_eq!(child.speed(), 1.5);
        assert_eq!(child.metabolism(), 0.1);
        assert_eq!(child.efficiency(), 3.0);
        assert_eq!(child.vision(), 1.0);
    }

    #[test]
    fn epsilon_floor_applies_below_range_minimum() {
        let range = GeneRange::new(0.0, 1.0);
        assert_eq!(range.clamp(0.0), GENE_EPSILON);
        assert_eq!(range.clamp(-4.0), GENE_EPSILON);
        assert_eq!(range.clamp(0.5), 0.5);
    }

    #[test]
    fn first_invalid_reports_offending_gene() {
        let bounds = GeneBounds {
            vision: GeneRange::new(10.0, 2.0),
            ..GeneBounds::default()
        };
        assert_eq!(bounds.first_invalid(), Some(Gene::Vision));

        let bounds = GeneBounds {
            speed: GeneRange::new(f64::NAN, 1.0),
            ..GeneBounds::default()
        };
        assert_eq!(bounds.first_invalid(), Some(Gene::Speed));

        let bounds = GeneBounds {
            metabolism: GeneRange::new(0.0, 0.001),
            ..GeneBounds::default()
        };
        assert_eq!(bounds.first_invalid(), Some(Gene::Metabolism));

        assert_eq!(GeneBounds::default().first_invalid(), None);
    }

    #[test]
    fn genes_serialize_by_name() {
        let json = serde_json::to_string(&default_genome()).expect("genome should serialize");
        assert!(json.contains("\"speed\":0.5"));
        assert_eq!(
            serde_json::to_string(&Gene::Efficiency).expect("gene should serialize"),
            "\"efficiency\""
        );
    }

    proptest! {
        #[test]
        fn proptest_mutated_genes_stay_in_bounds(
            seed in any::<u64>(),
            strength in 0.0f64..=1.0,
            generations in 1usize..200,
        ) {
            let params = MutationParams { strength, ..MutationParams::default() };
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let mut genome = default_genome();
            for _ in 0..generations {
                genome = genome.mutate(&mut rng, &params);
                prop_assert!(genome.iter().all(|(_, v)| v.is_finite() && v >= GENE_EPSILON));
                prop_assert!(params.bounds.contains(&genome));
            }
        }
    }
}
