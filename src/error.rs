//! Crate-wide error type.
//!
//! Mirrors the taxonomy a host on-chip-debugger framework expects back from a
//! target driver: precondition violations are reported without any TAP
//! traffic, transport failures invalidate the register cache and push the
//! caller towards a re-[`examine`](crate::core::CoreInterface), and resource
//! exhaustion (out of hardware breakpoints) gets its own variant rather than
//! being folded into a generic failure.

use crate::probe::DebugProbeError;

/// The overarching error type returned by every operation in this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An error with the usage of the probe or its transport occurred.
    #[error("an error with the usage of the probe occurred")]
    Probe(#[from] DebugProbeError),

    /// The core was not halted, but the requested operation requires it to be.
    #[error("the core must be halted to perform this operation")]
    NotHalted,

    /// A memory access was requested at an address that is not aligned for
    /// the given access width.
    #[error("memory access at {address:#010x} is not aligned for a {width}-byte access")]
    UnalignedAccess {
        /// The address that was requested.
        address: u32,
        /// The width, in bytes, of the requested access (2 or 4).
        width: u8,
    },

    /// The requested resource (e.g. a hardware breakpoint slot) is not
    /// available.
    #[error("the requested resource is not available")]
    ResourceNotAvailable,

    /// The request could not be parsed or was otherwise malformed.
    #[error("invalid request: {0}")]
    Syntax(&'static str),

    /// An operation did not complete within its allotted time.
    #[error("operation timed out")]
    Timeout,

    /// The Xtensa debug module reported a protocol-level anomaly (a busy or
    /// error bit set in the Debug Status Register, or an instruction
    /// injection that the core refused to execute).
    #[error("xtensa debug module error: {0}")]
    Xdm(#[from] crate::architecture::xtensa::xdm::XdmError),

    /// Any other error, e.g. surfaced by the host framework's own glue code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// True if this error should cause the driver to treat its cached state
    /// (register cache, breakpoint mirror) as no longer trustworthy and
    /// require a re-examine before further operations are attempted.
    pub fn invalidates_state(&self) -> bool {
        matches!(self, Error::Probe(_) | Error::Xdm(_) | Error::Timeout)
    }
}
