//! Engine error type.
//!
//! Only construction and port binding can fail; the processing path is
//! infallible and clamps whatever it is fed.

use thiserror::Error;

/// Errors reported while building an engine or binding its ports.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Reserving the history ring or the grain pool failed.
    #[error("failed to allocate {what} ({len} elements)")]
    Allocation {
        /// Which buffer could not be reserved.
        what: &'static str,
        /// Requested element count.
        len: usize,
    },

    /// The host reported a sample rate of zero.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// A configuration value is out of its meaningful domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Port index beyond the declared port table.
    #[error("unknown port index {0}")]
    UnknownPort(usize),

    /// A location of the wrong kind was bound to a port.
    #[error("port {index} ({name}) cannot be bound to {given}")]
    PortMismatch {
        /// Port index.
        index: usize,
        /// Declared port name.
        name: &'static str,
        /// Kind of location that was offered.
        given: &'static str,
    },
}

pub type Result<T> = core::result::Result<T, EngineError>;
