//! The Xtensa LX "108Mini" (ESP32/ESP108) debug-target driver.
//!
//! Layering, leaves first:
//!
//! - [`arch`] — ISA register numbering and opcode encoding (§4.3), pure data.
//! - [`xdm`] — TAP/Nexus/Power/OCD primitives (§4.1-§4.2).
//! - [`registers`] — the 85-entry register descriptor table (§3/§4.4).
//! - [`register_cache`] — the valid/dirty register cache (§4.4).
//! - [`memory`] — the chunked memory-access engine (§4.5).
//! - [`breakpoints`] — the fixed hardware-breakpoint slot table (§4.6).
//! - [`sequences`] — reset/power-on sequencing hooks.
//! - [`communication_interface`] — ties the above into `CoreInterface` and
//!   `MemoryInterface`, and owns the halt/run state machine (§4.7).

pub mod arch;
pub mod breakpoints;
pub mod communication_interface;
pub mod config;
pub mod memory;
pub mod register_cache;
pub mod registers;
pub mod sequences;
pub mod xdm;

pub use communication_interface::{XtensaCommunicationInterface, XtensaCoreState};
pub use config::XtensaChipConfig;
