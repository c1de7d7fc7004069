//! A JTAG debug-target driver for the Tensilica Xtensa LX "108Mini" core
//! (ESP32 / ESP108).
//!
//! The crate is layered bottom-up, each layer built only in terms of the one
//! below it:
//!
//! - [`probe`] — the transport contract ([`probe::JtagAccess`]) and the
//!   deferred-execution queueing model every scan is scheduled through.
//! - [`architecture::xtensa`] — the Xtensa-specific stack: TAP/Nexus/OCD
//!   primitives, instruction injection, the register file and cache, the
//!   chunked memory engine, the hardware-breakpoint manager, and the
//!   halt/run state machine.
//! - [`core`] and [`memory`] — the architecture-neutral `CoreInterface` and
//!   `MemoryInterface` contracts a host on-chip-debugger framework drives
//!   every target through, Xtensa or otherwise.
//!
//! A host framework only ever needs [`architecture::xtensa::XtensaCommunicationInterface`],
//! constructed over something implementing [`probe::JtagAccess`]; everything
//! else is reached through the [`CoreInterface`] and [`MemoryInterface`]
//! trait objects it implements.

pub mod architecture;
pub mod core;
mod error;
pub mod memory;
pub mod probe;

pub use crate::core::{
    Breakpoint, BreakpointType, CoreInformation, CoreInterface, CoreStatus, HaltReason,
    RegisterClass, RegisterDescriptor, RegisterId, RegisterValue,
};
pub use crate::error::Error;
pub use crate::memory::MemoryInterface;
