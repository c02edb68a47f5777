//! tapgrain engine: tapped-delay-line granular synthesis.
//!
//! Crate layout:
//! - [`granular`] : `Granular`, the engine: history ring + grain pool + RNG
//! - [`grain`]    : one grain and its cooldown/play/respawn state machine
//! - [`pool`]     : fixed-capacity grain pool with staggered lazy growth
//! - [`mixer`]    : pan-weighted stereo accumulation
//! - [`params`]   : host control values and the per-block parameter resolver
//! - [`ports`]    : plugin descriptor and port table
//! - [`plugin`]   : construct/bind/process/destroy adapter for hosts
//! - [`config`]   : construction-time sizes and seeding
//! - [`error`]    : `EngineError`
//!
//! All storage is reserved at construction. The block path does not allocate,
//! lock or fail; degenerate control values are clamped, never rejected.

pub mod config;
pub mod error;
pub mod grain;
pub mod granular;
pub mod mixer;
pub mod params;
pub mod plugin;
pub mod pool;
pub mod ports;

// Re-export some commonly used items to make downstream imports ergonomic.
pub use config::GranularConfig;
pub use error::{EngineError, Result};
pub use grain::Grain;
pub use granular::Granular;
pub use params::{Controls, GrainParams};
pub use plugin::{GranularPlugin, Plugin, PortLocation, Ports};
pub use ports::{descriptor, Port, PortKind, PluginDescriptor, GRANULAR, PORTS, PORT_COUNT};
