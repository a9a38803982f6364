//! Closed set of species and their feeding relationships.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Species tag carried by every agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Plant eater that herds and flees.
    Grazer,
    /// Land predator of grazers and scavengers.
    Hunter,
    /// Carcass eater and opportunistic hunter.
    Scavenger,
    /// Escorts grazers and stuns hunters.
    Protector,
    /// Attaches to hosts and drains them.
    Parasite,
    /// Top predator that also hunts hunters.
    Apex,
    /// Predator bound to water zones.
    SeaHunter,
}

impl Species {
    /// Every species, in id order.
    pub const ALL: [Species; 7] = [
        Species::Grazer,
        Species::Hunter,
        Species::Scavenger,
        Species::Protector,
        Species::Parasite,
        Species::Apex,
        Species::SeaHunter,
    ];

    /// Snake-case name, matching the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Species::Grazer => "grazer",
            Species::Hunter => "hunter",
            Species::Scavenger => "scavenger",
            Species::Protector => "protector",
            Species::Parasite => "parasite",
            Species::Apex => "apex",
            Species::SeaHunter => "sea_hunter",
        }
    }

    /// Species this one kills or bites.
    pub fn prey(self) -> &'static [Species] {
        match self {
            Species::Hunter | Species::SeaHunter => &[Species::Grazer, Species::Scavenger],
            Species::Scavenger => &[Species::Grazer],
            Species::Apex => &[
                Species::Hunter,
                Species::Grazer,
                Species::Scavenger,
                Species::Protector,
            ],
            Species::Parasite => &[
                Species::Grazer,
                Species::Hunter,
                Species::Scavenger,
                Species::Protector,
            ],
            Species::Grazer | Species::Protector => &[],
        }
    }

    /// Species this one runs from.
    pub fn threats(self) -> &'static [Species] {
        match self {
            Species::Grazer => &[
                Species::Hunter,
                Species::Parasite,
                Species::Apex,
                Species::SeaHunter,
            ],
            Species::Scavenger => &[Species::Hunter, Species::Apex],
            _ => &[],
        }
    }

    /// Whether `self` hunts or drains `other`.
    pub fn preys_on(self, other: Species) -> bool {
        self.prey().contains(&other)
    }

    /// Whether a protector may stun this species.
    pub fn is_stunnable(self) -> bool {
        matches!(self, Species::Hunter | Species::Apex)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
