//! Seeded random number streams.
//!
//! The world owns one sequential stream for the apply phase and spawning.
//! Each agent's decide step gets its own stream derived from the world seed,
//! the tick and the agent id, so parallel evaluation never depends on thread
//! scheduling.

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Random number generator used throughout the simulation.
pub type SimRng = ChaCha12Rng;

const TICK_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;
const AGENT_PRIME: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// Creates a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> SimRng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Derives an independent stream for one agent's decision on one tick.
pub fn derive_agent_rng(seed: u64, tick: u64, agent_id: u64) -> SimRng {
    let mixed = seed
        ^ tick.wrapping_add(1).wrapping_mul(TICK_PRIME)
        ^ agent_id.wrapping_add(1).wrapping_mul(AGENT_PRIME);
    ChaCha12Rng::seed_from_u64(mixed)
}
