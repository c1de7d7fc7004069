//! Abstract target-state and register types shared by the host framework
//! contract (§6) — the `CoreInterface`, `CoreStatus`, and register plumbing
//! every architecture-specific driver (here, just Xtensa) is expected to
//! implement against.

mod breakpoint;
mod registers;

pub use breakpoint::{Breakpoint, BreakpointType};
pub use registers::{RegisterClass, RegisterId, RegisterDescriptor, RegisterValue};

use crate::Error;
use std::time::Duration;

/// The status of a core, as last observed by a poll.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoreStatus {
    /// The core state has not been established yet; this is the state every
    /// target handle starts in.
    Unknown,
    /// The core is executing instructions.
    Running,
    /// The core is halted, for the given reason.
    Halted(HaltReason),
    /// The core is executing instructions, but the connection is in the
    /// middle of a debug session that was left in a "debug run" state.
    DebugRunning,
    /// The core is in the middle of a reset.
    Reset,
}

impl CoreStatus {
    /// True if the core is in any halted state.
    pub fn is_halted(&self) -> bool {
        matches!(self, CoreStatus::Halted(_))
    }
}

/// Why a core ended up halted, as distinguished by the Xtensa Debug Cause
/// register / the path through which halt was observed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Halted in response to an explicit host request.
    Request,
    /// Halted because of a hardware breakpoint.
    Breakpoint,
    /// Halted after a single-step completed.
    Step,
    /// Halted for a reason not otherwise distinguished (e.g. already halted
    /// when the driver attached).
    Unknown,
}

/// Information returned by a halt/step/reset-and-halt operation.
#[derive(Debug, Clone, Copy)]
pub struct CoreInformation {
    /// The program counter at the point of halt.
    pub pc: u32,
}

/// The abstract operations a host on-chip-debugger framework issues against
/// a target (§6, "Host-framework contract (consumed)").
///
/// This is intentionally synchronous and blocking: the framework's event
/// loop calls these directly, the same way it would call into any other
/// architecture's driver.
pub trait CoreInterface {
    /// One-shot target discovery. Establishes whether the core is currently
    /// running or halted and primes the driver's internal state.
    fn examine(&mut self) -> Result<(), Error>;

    /// Called periodically by the host framework. Refreshes `status()` and,
    /// on a RUNNING → HALTED transition, refreshes the register cache.
    fn poll(&mut self) -> Result<CoreStatus, Error>;

    /// The status as of the last `poll`/`examine`/`halt`/`resume`/`step`.
    fn status(&self) -> CoreStatus;

    /// Requests a halt. Does not itself wait for the halt to take effect;
    /// callers observe it via a subsequent `poll`.
    fn halt(&mut self) -> Result<(), Error>;

    /// Blocks until the core reports halted or `timeout` elapses.
    fn wait_for_core_halted(&mut self, timeout: Duration) -> Result<(), Error>;

    /// Resumes execution.
    ///
    /// `current`/`address` mirror the GDB `vCont`/`c [addr]` distinction: if
    /// `current` is false and `address` is `Some`, the PC is loaded with
    /// `address` before resuming. `debug_exec` selects whether the core
    /// resumes into the normal running state or a debug-monitor run state
    /// (relevant when the host framework's own code runs in debug mode).
    fn resume(&mut self, current: bool, address: Option<u32>, debug_exec: bool) -> Result<(), Error>;

    /// Single-steps one instruction and halts again.
    fn step(&mut self) -> Result<CoreInformation, Error>;

    /// Asserts the target's reset line(s).
    fn assert_reset(&mut self) -> Result<(), Error>;

    /// Deasserts the target's reset line(s) and re-establishes contact with
    /// the debug module. If `halt_after` is set, the core is halted again
    /// once reset completes (not atomically — see §4.7).
    fn deassert_reset(&mut self, halt_after: bool) -> Result<(), Error>;

    /// Reads a single register by its stable index into the 85-entry table.
    fn read_register(&mut self, id: RegisterId) -> Result<u32, Error>;

    /// Writes a single register by its stable index.
    fn write_register(&mut self, id: RegisterId, value: u32) -> Result<(), Error>;

    /// Returns the register descriptor table in GDB wire order.
    fn gdb_register_list(&self) -> &'static [RegisterDescriptor];

    /// Adds a hardware breakpoint, returning the slot index used.
    fn add_breakpoint(&mut self, bp: Breakpoint) -> Result<usize, Error>;

    /// Removes a previously-added breakpoint.
    fn remove_breakpoint(&mut self, bp: Breakpoint) -> Result<(), Error>;

    /// Number of hardware breakpoint units implemented by this core.
    fn available_breakpoint_units(&self) -> usize;
}
