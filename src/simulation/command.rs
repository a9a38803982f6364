//! Commands issued by front ends, applied at tick boundaries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::disaster::EventType;
use super::params::Params;

/// A request from outside the simulation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Stop ticking.
    Pause,
    /// Continue ticking.
    Resume,
    /// End the current episode now and breed the next generation.
    ResetEpisode,
    /// Rebuild the world, optionally from new parameters.
    ResetAll(Option<Box<Params>>),
    /// Arm a disaster type.
    ArmEvent(EventType),
    /// Fire the armed disaster at a location.
    TriggerEvent {
        /// Center x.
        x: f32,
        /// Center y.
        y: f32,
    },
    /// Add or remove obstacles.
    ToggleObstacles,
}

/// FIFO of commands waiting for the next tick boundary.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    /// Queues a command.
    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Takes every queued command in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = Command> + '_ {
        self.pending.drain(..)
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
