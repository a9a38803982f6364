//! DNA container, legal gene ranges and the genetic operators.
//!
//! DNA is a map from [`Gene`] to `f32`. Every species configures a legal
//! `[min, max]` range per gene and both operators clamp their output back
//! into those ranges.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Named heritable trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gene {
    /// Base movement speed per tick.
    Speed,
    /// Perception radius.
    Vision,
    /// Body radius.
    Size,
    /// Divides the per-tick energy cost.
    EnergyEfficiency,
    /// Willingness to hold ground near threats.
    Bravery,
    /// Multiplies the per-tick energy cost.
    Metabolism,
    /// Grazer pull toward the herd.
    Cohesion,
    /// Grazer push away from crowding.
    Dispersion,
    /// Extra reach when attacking.
    AttackRange,
    /// Damage dealt per bite.
    AttackPower,
    /// Scavenger preference for carcasses.
    CarcassAffinity,
    /// Protector stun reach.
    StunRadius,
    /// Protector ticks between stuns.
    StunCooldown,
    /// Parasite energy drained per tick.
    DrainRate,
    /// Parasite maximum attachment duration in ticks.
    AttachTime,
    /// Speed multiplier while in water.
    SwimFactor,
    /// Sea hunter preference for water.
    WaterBias,
}

impl Gene {
    /// Every gene, in a stable order.
    pub const ALL: [Gene; 17] = [
        Gene::Speed,
        Gene::Vision,
        Gene::Size,
        Gene::EnergyEfficiency,
        Gene::Bravery,
        Gene::Metabolism,
        Gene::Cohesion,
        Gene::Dispersion,
        Gene::AttackRange,
        Gene::AttackPower,
        Gene::CarcassAffinity,
        Gene::StunRadius,
        Gene::StunCooldown,
        Gene::DrainRate,
        Gene::AttachTime,
        Gene::SwimFactor,
        Gene::WaterBias,
    ];

    /// Snake-case name, matching the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Gene::Speed => "speed",
            Gene::Vision => "vision",
            Gene::Size => "size",
            Gene::EnergyEfficiency => "energy_efficiency",
            Gene::Bravery => "bravery",
            Gene::Metabolism => "metabolism",
            Gene::Cohesion => "cohesion",
            Gene::Dispersion => "dispersion",
            Gene::AttackRange => "attack_range",
            Gene::AttackPower => "attack_power",
            Gene::CarcassAffinity => "carcass_affinity",
            Gene::StunRadius => "stun_radius",
            Gene::StunCooldown => "stun_cooldown",
            Gene::DrainRate => "drain_rate",
            Gene::AttachTime => "attach_time",
            Gene::SwimFactor => "swim_factor",
            Gene::WaterBias => "water_bias",
        }
    }

    /// Value read for a gene the DNA does not carry.
    pub fn default_value(self) -> f32 {
        match self {
            Gene::Speed => 1.5,
            Gene::Vision => 80.0,
            Gene::Size => 4.0,
            Gene::EnergyEfficiency
            | Gene::Metabolism
            | Gene::CarcassAffinity
            | Gene::SwimFactor => 1.0,
            Gene::Bravery | Gene::Cohesion | Gene::Dispersion | Gene::WaterBias => 0.5,
            Gene::AttackRange => 6.0,
            Gene::AttackPower => 32.0,
            Gene::StunRadius => 30.0,
            Gene::StunCooldown => 120.0,
            Gene::DrainRate => 0.8,
            Gene::AttachTime => 120.0,
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive legal range for one gene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl GeneRange {
    /// Creates a range from its bounds.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Distance between the bounds.
    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    /// Clamps a value into the range. NaN collapses to the lower bound.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Whether the value lies inside the range.
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether `min <= max` and both bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Draws a uniform value inside the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min >= self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

/// Legal ranges for every gene a species carries.
pub type DnaRanges = BTreeMap<Gene, GeneRange>;

/// Heritable gene values of one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dna {
    genes: BTreeMap<Gene, f32>,
}

impl Dna {
    /// Wraps a gene map as-is, without clamping.
    pub fn from_genes(genes: BTreeMap<Gene, f32>) -> Self {
        Self { genes }
    }

    /// Draws every gene uniformly from its range.
    pub fn random<R: Rng + ?Sized>(ranges: &DnaRanges, rng: &mut R) -> Self {
        let genes = ranges
            .iter()
            .map(|(&gene, range)| (gene, range.sample(rng)))
            .collect();
        Self { genes }
    }

    /// Gene value, or the gene's default when absent.
    #[inline]
    pub fn get(&self, gene: Gene) -> f32 {
        self.genes
            .get(&gene)
            .copied()
            .unwrap_or_else(|| gene.default_value())
    }

    /// Gene value if this DNA carries it.
    pub fn try_get(&self, gene: Gene) -> Option<f32> {
        self.genes.get(&gene).copied()
    }

    /// Sets a gene without clamping.
    pub fn set(&mut self, gene: Gene, value: f32) {
        self.genes.insert(gene, value);
    }

    /// Iterates over carried genes in stable order.
    pub fn genes(&self) -> impl Iterator<Item = (Gene, f32)> + '_ {
        self.genes.iter().map(|(&gene, &value)| (gene, value))
    }

    /// Number of carried genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether no gene is carried.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Clamps every ranged gene into its range.
    pub fn clamp_to(&mut self, ranges: &DnaRanges) {
        for (gene, value) in &mut self.genes {
            if let Some(range) = ranges.get(gene) {
                *value = range.clamp(*value);
            }
        }
    }

    /// Whether every ranged gene lies inside its range.
    pub fn is_within(&self, ranges: &DnaRanges) -> bool {
        self.genes
            .iter()
            .all(|(gene, value)| ranges.get(gene).is_none_or(|r| r.contains(*value)))
    }
}

/// Gaussian mutation.
///
/// Each gene is perturbed independently with probability `rate`. The noise is
/// drawn from `N(0, sigma * width)` where `width` is the gene's range width,
/// so one `sigma` behaves the same for genes of very different magnitude.
/// The result is clamped to `ranges`.
///
/// # Arguments
///
/// * `dna` - Parent DNA (left untouched)
/// * `ranges` - Legal ranges for the species
/// * `sigma` - Noise scale as a fraction of each gene's range width
/// * `rate` - Per-gene mutation probability
/// * `rng` - Random source; the only source of nondeterminism
pub fn mutate<R: Rng + ?Sized>(
    dna: &Dna,
    ranges: &DnaRanges,
    sigma: f32,
    rate: f32,
    rng: &mut R,
) -> Dna {
    let mut child = dna.clone();
    for (gene, value) in &mut child.genes {
        if rng.random::<f32>() >= rate {
            continue;
        }
        let width = ranges.get(gene).map_or(1.0, GeneRange::width).max(1e-3);
        if let Ok(normal) = Normal::new(0.0_f32, sigma * width) {
            *value += normal.sample(rng);
        }
    }
    child.clamp_to(ranges);
    child
}

/// Blended crossover.
///
/// Each gene becomes `w * a + (1 - w) * b` with `w ~ U[0, 1)` drawn
/// independently per gene. Genes missing from `b` are inherited from `a`.
pub fn crossover<R: Rng + ?Sized>(a: &Dna, b: &Dna, ranges: &DnaRanges, rng: &mut R) -> Dna {
    let genes = a
        .genes
        .iter()
        .map(|(&gene, &va)| {
            let vb = b.genes.get(&gene).copied().unwrap_or(va);
            let w: f32 = rng.random();
            (gene, w * va + (1.0 - w) * vb)
        })
        .collect();
    let mut child = Dna { genes };
    child.clamp_to(ranges);
    child
}
