use serde::{Deserialize, Serialize};

use super::disaster::EventType;
use super::dna::{DnaRanges, Gene, GeneRange};
use super::error::ConfigError;
use super::species::Species;

/// Non-negative weights of the linear fitness function.
///
/// Every weight must be `>= 0` so fitness never decreases when an
/// accumulator grows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Per kill.
    pub kills: f32,
    /// Per stun landed.
    pub stuns: f32,
    /// Per attachment made.
    pub attachments: f32,
    /// Per unit of energy drained from hosts.
    pub drained_energy: f32,
    /// Per tick survived.
    pub survival_ticks: f32,
    /// Per unit of energy gained from food or kills.
    pub energy_gained: f32,
    /// Per unit of energy held at scoring time.
    pub final_energy: f32,
}

impl FitnessWeights {
    fn values(&self) -> [(&'static str, f32); 7] {
        [
            ("kills", self.kills),
            ("stuns", self.stuns),
            ("attachments", self.attachments),
            ("drained_energy", self.drained_energy),
            ("survival_ticks", self.survival_ticks),
            ("energy_gained", self.energy_gained),
            ("final_energy", self.final_energy),
        ]
    }
}

/// Per-species population, energy, DNA and fitness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    /// Population at world init and target size of every new generation.
    pub initial_count: usize,
    /// Energy of newly created agents.
    pub initial_energy: f32,
    /// Energy cap.
    pub max_energy: f32,
    /// Baseline energy cost per tick before size, speed and efficiency scaling.
    pub base_energy_cost: f32,
    /// Legal gene ranges; also defines which genes the species carries.
    pub dna_ranges: DnaRanges,
    /// Fitness weights.
    pub fitness: FitnessWeights,
}

/// Per-species table, one entry for every [`Species`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesTable {
    /// Grazer settings.
    pub grazer: SpeciesParams,
    /// Hunter settings.
    pub hunter: SpeciesParams,
    /// Scavenger settings.
    pub scavenger: SpeciesParams,
    /// Protector settings.
    pub protector: SpeciesParams,
    /// Parasite settings.
    pub parasite: SpeciesParams,
    /// Apex settings.
    pub apex: SpeciesParams,
    /// Sea hunter settings.
    pub sea_hunter: SpeciesParams,
}

impl SpeciesTable {
    /// Settings for one species.
    pub fn get(&self, species: Species) -> &SpeciesParams {
        match species {
            Species::Grazer => &self.grazer,
            Species::Hunter => &self.hunter,
            Species::Scavenger => &self.scavenger,
            Species::Protector => &self.protector,
            Species::Parasite => &self.parasite,
            Species::Apex => &self.apex,
            Species::SeaHunter => &self.sea_hunter,
        }
    }

    /// Mutable settings for one species.
    pub fn get_mut(&mut self, species: Species) -> &mut SpeciesParams {
        match species {
            Species::Grazer => &mut self.grazer,
            Species::Hunter => &mut self.hunter,
            Species::Scavenger => &mut self.scavenger,
            Species::Protector => &mut self.protector,
            Species::Parasite => &mut self.parasite,
            Species::Apex => &mut self.apex,
            Species::SeaHunter => &mut self.sea_hunter,
        }
    }
}

/// Settings of one disaster type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventParams {
    /// Area of effect.
    pub radius: f32,
    /// Multiplier on the base damage.
    pub severity: f32,
    /// Damage at the event center before severity.
    pub base_damage: f32,
    /// Chance per tick of firing at a random location.
    pub probability: f32,
}

/// Per-event-type table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTable {
    /// Earthquake settings.
    pub earthquake: EventParams,
    /// Tsunami settings.
    pub tsunami: EventParams,
    /// Meteor settings.
    pub meteor: EventParams,
}

impl EventTable {
    /// Settings for one event type.
    pub fn get(&self, event: EventType) -> &EventParams {
        match event {
            EventType::Earthquake => &self.earthquake,
            EventType::Tsunami => &self.tsunami,
            EventType::Meteor => &self.meteor,
        }
    }

    /// Mutable settings for one event type.
    pub fn get_mut(&mut self, event: EventType) -> &mut EventParams {
        match event {
            EventType::Earthquake => &mut self.earthquake,
            EventType::Tsunami => &mut self.tsunami,
            EventType::Meteor => &mut self.meteor,
        }
    }
}

/// Simulation parameters that control world, species and evolution behavior.
///
/// Read at world init and reset, never mutated by the engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Seed for every random stream in the world.
    pub seed: u64,
    /// Simulation area width.
    pub world_width: f32,
    /// Simulation area height.
    pub world_height: f32,
    /// Ticks per episode before generational turnover.
    pub episode_length: u64,
    /// Mutation noise as a fraction of each gene's range width.
    pub mutation_sigma: f32,
    /// Per-gene mutation probability.
    pub mutation_rate: f32,
    /// Tournament sample size.
    pub tournament_size: usize,
    /// Archive capacity per species (top K).
    pub archive_size: usize,
    /// Agents spawned when a species goes extinct mid-episode.
    pub recovery_spawn_count: usize,
    /// Sigma multiplier applied to recovered DNA.
    pub recovery_sigma_boost: f32,
    /// Number of distinct cosmetic clans.
    pub clan_count: u8,
    /// Per-species settings.
    pub species: SpeciesTable,
    /// Target number of plant food items.
    pub food_count: usize,
    /// Energy of a plant food item.
    pub food_energy: f32,
    /// Energy of a carcass.
    pub carcass_energy: f32,
    /// Chance per tick of spawning one plant when below target.
    pub food_respawn_rate: f32,
    /// Chance a dead agent leaves a carcass.
    pub carcass_drop_chance: f32,
    /// Energy a scavenger extracts from a plant.
    pub scavenger_plant_energy: f32,
    /// Target number of unconverted rocks.
    pub rock_count: usize,
    /// Rock radius.
    pub rock_radius: f32,
    /// Chance per tick of spawning one rock when below target.
    pub rock_respawn_rate: f32,
    /// Radius of a shelter built from a rock.
    pub shelter_radius: f32,
    /// Fraction of disaster damage removed inside a shelter.
    pub shelter_mitigation: f32,
    /// Chance per tick a grazer next to a rock builds a shelter.
    pub shelter_build_chance: f32,
    /// Energy a protector spends building a shelter.
    pub shelter_build_cost: f32,
    /// Whether obstacles exist at world init.
    pub obstacles_enabled: bool,
    /// Number of obstacles when enabled.
    pub obstacle_count: usize,
    /// Obstacle radius.
    pub obstacle_radius: f32,
    /// Number of vertical water bands.
    pub water_zone_count: usize,
    /// Width of each water band.
    pub water_zone_width: f32,
    /// Disaster settings.
    pub events: EventTable,
    /// Highest fraction of a species a single disaster may kill.
    pub max_event_casualty_fraction: f32,
    /// Linear falloff strength: damage at the rim is `1 - falloff` of the center.
    pub disaster_falloff: f32,
    /// Energy left to agents spared by the casualty cap.
    pub survivor_energy_floor: f32,
    /// Fraction of max energy below which grazers prioritize food.
    pub hunger_threshold: f32,
    /// Minimum energy a predator gains from a kill.
    pub kill_energy_floor: f32,
    /// Energy a sea hunter gains per bite.
    pub bite_energy: f32,
    /// Ticks a stunned agent cannot move.
    pub stun_duration: u32,
    /// Speed multiplier while slowed after a stun.
    pub stun_slow_factor: f32,
    /// Host speed multiplier while a parasite is attached.
    pub parasite_slow_factor: f32,
    /// Fraction of a parasite's drain actually removed from the host.
    pub host_drain_ratio: f32,
    /// Parasite cooldown after detaching.
    pub attach_cooldown_ticks: u32,
    /// Chance per tick a wandering agent changes heading.
    pub wander_turn_chance: f32,
    /// Number of entries kept in the event log.
    pub event_log_size: usize,
}

fn ranges(entries: &[(Gene, f32, f32)]) -> DnaRanges {
    entries
        .iter()
        .map(|&(gene, min, max)| (gene, GeneRange::new(min, max)))
        .collect()
}

fn species_params(
    initial_count: usize,
    initial_energy: f32,
    max_energy: f32,
    dna_ranges: DnaRanges,
    fitness: FitnessWeights,
) -> SpeciesParams {
    SpeciesParams {
        initial_count,
        initial_energy,
        max_energy,
        base_energy_cost: 0.3,
        dna_ranges,
        fitness,
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        use Gene::{
            AttachTime, AttackPower, AttackRange, Bravery, CarcassAffinity, Cohesion, Dispersion,
            DrainRate, EnergyEfficiency, Metabolism, Size, Speed, StunCooldown, StunRadius,
            SwimFactor, Vision, WaterBias,
        };

        Self {
            grazer: species_params(
                40,
                110.0,
                170.0,
                ranges(&[
                    (Speed, 0.6, 3.6),
                    (Vision, 70.0, 220.0),
                    (Size, 5.0, 11.0),
                    (EnergyEfficiency, 0.6, 2.2),
                    (Cohesion, 0.0, 1.0),
                    (Dispersion, 0.0, 1.0),
                    (Bravery, 0.1, 0.9),
                    (Metabolism, 0.5, 1.5),
                    (SwimFactor, 0.2, 0.6),
                ]),
                FitnessWeights {
                    survival_ticks: 0.6,
                    energy_gained: 0.4,
                    final_energy: 0.1,
                    ..FitnessWeights::default()
                },
            ),
            hunter: species_params(
                18,
                140.0,
                200.0,
                ranges(&[
                    (Speed, 1.2, 4.3),
                    (Vision, 90.0, 250.0),
                    (Size, 6.0, 11.0),
                    (EnergyEfficiency, 0.5, 1.8),
                    (AttackRange, 5.0, 13.0),
                    (AttackPower, 30.0, 55.0),
                    (Bravery, 0.3, 1.0),
                    (Metabolism, 0.6, 1.6),
                    (SwimFactor, 0.2, 0.6),
                ]),
                FitnessWeights {
                    kills: 50.0,
                    survival_ticks: 0.2,
                    energy_gained: 1.0,
                    final_energy: 0.1,
                    ..FitnessWeights::default()
                },
            ),
            scavenger: species_params(
                12,
                120.0,
                180.0,
                ranges(&[
                    (Speed, 0.8, 3.3),
                    (Vision, 90.0, 230.0),
                    (Size, 5.0, 10.0),
                    (EnergyEfficiency, 0.8, 2.5),
                    (CarcassAffinity, 0.5, 2.0),
                    (Bravery, 0.1, 0.7),
                    (Metabolism, 0.4, 1.4),
                    (SwimFactor, 0.2, 0.7),
                ]),
                FitnessWeights {
                    kills: 10.0,
                    survival_ticks: 0.3,
                    energy_gained: 1.0,
                    final_energy: 0.1,
                    ..FitnessWeights::default()
                },
            ),
            protector: species_params(
                10,
                130.0,
                190.0,
                ranges(&[
                    (Speed, 0.8, 3.3),
                    (Vision, 100.0, 240.0),
                    (Size, 6.0, 10.0),
                    (EnergyEfficiency, 0.7, 2.0),
                    (StunRadius, 26.0, 70.0),
                    (StunCooldown, 60.0, 240.0),
                    (Bravery, 0.5, 1.0),
                    (Metabolism, 0.5, 1.5),
                    (SwimFactor, 0.2, 0.6),
                ]),
                FitnessWeights {
                    stuns: 40.0,
                    survival_ticks: 0.4,
                    final_energy: 0.1,
                    ..FitnessWeights::default()
                },
            ),
            parasite: species_params(
                10,
                90.0,
                140.0,
                ranges(&[
                    (Speed, 1.0, 3.3),
                    (Vision, 90.0, 230.0),
                    (Size, 4.0, 8.0),
                    (EnergyEfficiency, 0.9, 2.5),
                    (DrainRate, 0.4, 2.0),
                    (AttachTime, 80.0, 200.0),
                    (Bravery, 0.0, 0.6),
                    (Metabolism, 0.3, 1.2),
                    (SwimFactor, 0.3, 0.8),
                ]),
                FitnessWeights {
                    attachments: 5.0,
                    drained_energy: 30.0,
                    survival_ticks: 0.3,
                    final_energy: 0.1,
                    ..FitnessWeights::default()
                },
            ),
            apex: species_params(
                6,
                180.0,
                240.0,
                ranges(&[
                    (Speed, 1.5, 4.8),
                    (Vision, 110.0, 280.0),
                    (Size, 7.0, 12.0),
                    (EnergyEfficiency, 0.5, 1.6),
                    (AttackRange, 6.0, 14.0),
                    (AttackPower, 45.0, 75.0),
                    (Bravery, 0.7, 1.0),
                    (Metabolism, 0.7, 1.7),
                    (SwimFactor, 0.2, 0.5),
                ]),
                FitnessWeights {
                    kills: 70.0,
                    survival_ticks: 0.3,
                    final_energy: 0.1,
                    ..FitnessWeights::default()
                },
            ),
            sea_hunter: species_params(
                14,
                160.0,
                220.0,
                ranges(&[
                    (Speed, 1.0, 3.6),
                    (Vision, 100.0, 260.0),
                    (Size, 6.0, 11.0),
                    (EnergyEfficiency, 0.7, 2.0),
                    (AttackPower, 28.0, 50.0),
                    (WaterBias, 0.6, 1.0),
                    (Bravery, 0.4, 0.9),
                    (Metabolism, 0.6, 1.5),
                    (SwimFactor, 0.8, 1.4),
                ]),
                FitnessWeights {
                    kills: 50.0,
                    survival_ticks: 0.4,
                    final_energy: 0.1,
                    ..FitnessWeights::default()
                },
            ),
        }
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self {
            earthquake: EventParams {
                radius: 320.0,
                severity: 0.8,
                base_damage: 15.0,
                probability: 0.0008,
            },
            tsunami: EventParams {
                radius: 300.0,
                severity: 1.0,
                base_damage: 15.0,
                probability: 0.0005,
            },
            meteor: EventParams {
                radius: 140.0,
                severity: 1.3,
                base_damage: 25.0,
                probability: 0.0006,
            },
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: 42,
            world_width: 3200.0,
            world_height: 2400.0,
            episode_length: 800,
            mutation_sigma: 0.15,
            mutation_rate: 0.8,
            tournament_size: 3,
            archive_size: 5,
            recovery_spawn_count: 6,
            recovery_sigma_boost: 2.0,
            clan_count: 3,
            species: SpeciesTable::default(),
            food_count: 350,
            food_energy: 35.0,
            carcass_energy: 55.0,
            food_respawn_rate: 0.03,
            carcass_drop_chance: 0.6,
            scavenger_plant_energy: 25.0,
            rock_count: 80,
            rock_radius: 6.0,
            rock_respawn_rate: 0.01,
            shelter_radius: 30.0,
            shelter_mitigation: 0.8,
            shelter_build_chance: 0.1,
            shelter_build_cost: 5.0,
            obstacles_enabled: false,
            obstacle_count: 4,
            obstacle_radius: 25.0,
            water_zone_count: 3,
            water_zone_width: 240.0,
            events: EventTable::default(),
            max_event_casualty_fraction: 0.3,
            disaster_falloff: 0.5,
            survivor_energy_floor: 1.0,
            hunger_threshold: 0.6,
            kill_energy_floor: 45.0,
            bite_energy: 30.0,
            stun_duration: 30,
            stun_slow_factor: 0.6,
            parasite_slow_factor: 0.6,
            host_drain_ratio: 0.6,
            attach_cooldown_ticks: 100,
            wander_turn_chance: 0.15,
            event_log_size: 50,
        }
    }
}

fn unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

fn non_negative(name: impl Into<String>, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            name: name.into(),
            value,
        })
    }
}

fn at_least_one(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { name })
    } else {
        Ok(())
    }
}

impl Params {
    /// Parses parameters from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Settings for one species.
    #[inline]
    pub fn species(&self, species: Species) -> &SpeciesParams {
        self.species.get(species)
    }

    /// Gene ranges for one species.
    #[inline]
    pub fn dna_ranges(&self, species: Species) -> &DnaRanges {
        &self.species.get(species).dna_ranges
    }

    /// Checks every parameter, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_width.is_finite()
            && self.world_height.is_finite()
            && self.world_width > 0.0
            && self.world_height > 0.0)
        {
            return Err(ConfigError::InvalidWorldSize {
                width: self.world_width,
                height: self.world_height,
            });
        }
        if self.episode_length == 0 {
            return Err(ConfigError::Zero {
                name: "episode_length",
            });
        }
        at_least_one("tournament_size", self.tournament_size)?;
        at_least_one("archive_size", self.archive_size)?;
        at_least_one("clan_count", usize::from(self.clan_count))?;
        at_least_one("event_log_size", self.event_log_size)?;

        non_negative("mutation_sigma", self.mutation_sigma)?;
        non_negative("recovery_sigma_boost", self.recovery_sigma_boost)?;
        non_negative("food_energy", self.food_energy)?;
        non_negative("carcass_energy", self.carcass_energy)?;
        non_negative("scavenger_plant_energy", self.scavenger_plant_energy)?;
        non_negative("rock_radius", self.rock_radius)?;
        non_negative("shelter_radius", self.shelter_radius)?;
        non_negative("shelter_build_cost", self.shelter_build_cost)?;
        non_negative("obstacle_radius", self.obstacle_radius)?;
        non_negative("water_zone_width", self.water_zone_width)?;
        non_negative("survivor_energy_floor", self.survivor_energy_floor)?;
        non_negative("kill_energy_floor", self.kill_energy_floor)?;
        non_negative("bite_energy", self.bite_energy)?;

        unit("mutation_rate", self.mutation_rate)?;
        unit("food_respawn_rate", self.food_respawn_rate)?;
        unit("carcass_drop_chance", self.carcass_drop_chance)?;
        unit("rock_respawn_rate", self.rock_respawn_rate)?;
        unit("shelter_mitigation", self.shelter_mitigation)?;
        unit("shelter_build_chance", self.shelter_build_chance)?;
        unit("max_event_casualty_fraction", self.max_event_casualty_fraction)?;
        unit("disaster_falloff", self.disaster_falloff)?;
        unit("hunger_threshold", self.hunger_threshold)?;
        unit("stun_slow_factor", self.stun_slow_factor)?;
        unit("parasite_slow_factor", self.parasite_slow_factor)?;
        unit("host_drain_ratio", self.host_drain_ratio)?;
        unit("wander_turn_chance", self.wander_turn_chance)?;

        for event in EventType::ALL {
            let settings = self.events.get(event);
            unit("event probability", settings.probability)?;
            non_negative(format!("{event} radius"), settings.radius)?;
            non_negative(format!("{event} severity"), settings.severity)?;
            non_negative(format!("{event} base_damage"), settings.base_damage)?;
        }

        for species in Species::ALL {
            self.validate_species(species)?;
        }
        Ok(())
    }

    fn validate_species(&self, species: Species) -> Result<(), ConfigError> {
        let settings = self.species.get(species);
        if !(settings.max_energy.is_finite()
            && settings.initial_energy > 0.0
            && settings.initial_energy <= settings.max_energy)
        {
            return Err(ConfigError::InvalidEnergy {
                species,
                initial: settings.initial_energy,
                max: settings.max_energy,
            });
        }
        non_negative(
            format!("{species} base_energy_cost"),
            settings.base_energy_cost,
        )?;
        for (&gene, range) in &settings.dna_ranges {
            if !range.is_valid() {
                return Err(ConfigError::InvalidGeneRange {
                    species,
                    gene,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        for (name, weight) in settings.fitness.values() {
            non_negative(format!("{species} fitness weight {name}"), weight)?;
        }
        Ok(())
    }
}
