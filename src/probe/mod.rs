//! The transport contract this crate consumes.
//!
//! Everything in this module is an "external collaborator" in the sense of
//! the driver: the physical JTAG transport (FTDI/J-Link bit-banging, USB
//! framing, ...) lives elsewhere and is reached only through the
//! [`JtagAccess`] trait. What lives here is the deferred-execution queueing
//! model the rest of the crate is built against, plus a small in-memory
//! [`fake_probe::FakeProbe`] used by tests.

use std::{collections::HashMap, fmt, sync::Arc};

use bitvec::{field::BitField, order::Lsb0, slice::BitSlice};

mod fake_probe;

#[cfg(any(test, feature = "test"))]
pub use fake_probe::FakeProbe;

/// An error occurring at the probe/transport level.
#[derive(thiserror::Error, Debug)]
pub enum DebugProbeError {
    /// The underlying USB/transport link failed.
    #[error("the probe's transport link failed")]
    TransportFailure,
    /// A JTAG scan did not complete before the transport's own timeout.
    #[error("a JTAG scan timed out")]
    Timeout,
    /// The probe does not support the requested scan length.
    #[error("the probe does not support a {0}-bit shift")]
    UnsupportedShiftLength(u32),
    /// Catch-all for backend-specific failures.
    #[error("{0}")]
    Other(String),
}

/// Which TAP end-state a shift should settle in.
///
/// Every [`JtagAccess`] implementation is expected to end each scan in
/// [`TapState::Idle`] per §4.1 — passing anything else is only meaningful to
/// transports that chain several shifts without returning to idle in
/// between, which this crate never asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapState {
    /// The canonical resting state between scans.
    Idle,
    /// Pause-DR, used by some transports to batch shifts without walking the
    /// full state machine in between.
    PauseDr,
}

/// Low-level access to a single TAP on the JTAG chain.
///
/// This trait is the transport contract of §6: a concrete implementation
/// drives real wires. The driver never talks to hardware except through
/// this trait, so it can be exercised against [`FakeProbe`] in tests.
pub trait JtagAccess: fmt::Debug {
    /// The width, in bits, of the IR register for this TAP.
    fn ir_len(&self) -> u32;

    /// Sets the number of idle cycles inserted after each DR access. Some
    /// targets need a handful of idle clocks for the debug module to settle.
    fn set_idle_cycles(&mut self, idle_cycles: u8);

    /// Returns the currently configured idle cycle count.
    fn idle_cycles(&self) -> u8;

    /// Shifts `data` into the IR register. The IR is not expected to capture
    /// meaningful output for this driver, so no value is returned.
    fn write_ir(&mut self, data: u32, end_state: TapState) -> Result<(), DebugProbeError>;

    /// Shifts `data` (`len` bits, little-endian) into the DR register,
    /// returning the bits shifted out of it in the same scan.
    fn write_dr(
        &mut self,
        data: &[u8],
        len: u32,
        end_state: TapState,
    ) -> Result<Vec<u8>, DebugProbeError>;

    /// Drives the transport's system reset line(s) and waits the requested
    /// number of microseconds.
    fn add_reset(&mut self, trst: bool, srst: bool) -> Result<(), DebugProbeError>;

    /// Inserts a delay into the scan sequence.
    fn add_sleep(&mut self, micros: u32) -> Result<(), DebugProbeError>;

    /// Executes every shift scheduled via [`JtagCommandQueue::schedule`] and
    /// returns the results keyed by the tokens that were handed out.
    ///
    /// The default implementation executes commands one at a time; real
    /// transports should override this to actually batch the scans.
    fn write_register_batch(
        &mut self,
        queue: &JtagCommandQueue,
    ) -> Result<DeferredResultSet, BatchExecutionError> {
        let mut results = DeferredResultSet::new();

        for (idx, command) in queue.iter() {
            let outcome = match command {
                JtagCommand::Ir { value } => self.write_ir(*value, TapState::Idle).map(|_| CommandResult::None),
                JtagCommand::Dr { data, len } => self
                    .write_dr(data, *len, TapState::Idle)
                    .map(CommandResult::VecU8),
                JtagCommand::Reset { trst, srst } => {
                    self.add_reset(*trst, *srst).map(|_| CommandResult::None)
                }
                JtagCommand::Sleep { micros } => {
                    self.add_sleep(*micros).map(|_| CommandResult::None)
                }
            };

            match outcome {
                Ok(result) => results.push(idx, result),
                Err(e) => return Err(BatchExecutionError::new(e.into(), results)),
            }
        }

        Ok(results)
    }
}

/// A single scheduled JTAG shift.
#[derive(Debug, Clone)]
pub enum JtagCommand {
    /// Shift `value` into IR.
    Ir {
        /// The IR opcode.
        value: u32,
    },
    /// Shift `data` (`len` bits) into DR.
    Dr {
        /// Outgoing payload, little-endian.
        data: Vec<u8>,
        /// Number of bits in `data`.
        len: u32,
    },
    /// Pulse the reset line(s).
    Reset {
        /// Assert TRST.
        trst: bool,
        /// Assert SRST.
        srst: bool,
    },
    /// Wait `micros` microseconds before the next shift.
    Sleep {
        /// Delay, in microseconds.
        micros: u32,
    },
}

/// Results produced by executing a [`JtagCommand`].
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// No meaningful result (IR shifts, resets, sleeps).
    None,
    /// The bytes shifted out of DR during the scan.
    VecU8(Vec<u8>),
}

impl CommandResult {
    /// Interprets the result as a little-endian `u32`.
    ///
    /// # Panics
    ///
    /// Panics if the result does not carry at least 4 bytes. Only called
    /// internally on results the driver itself scheduled with a known shape.
    pub fn into_u32(self) -> u32 {
        match self {
            CommandResult::VecU8(mut bytes) => {
                bytes.resize(4, 0);
                BitSlice::<u8, Lsb0>::from_slice(&bytes).load_le::<u32>()
            }
            CommandResult::None => panic!("CommandResult::None has no u32 representation"),
        }
    }

    /// Interprets the result as a single byte.
    ///
    /// # Panics
    ///
    /// Panics if the result carries no bytes.
    pub fn into_u8(self) -> u8 {
        match self {
            CommandResult::VecU8(bytes) => bytes.first().copied().unwrap_or(0),
            CommandResult::None => panic!("CommandResult::None has no u8 representation"),
        }
    }
}

/// A queue of JTAG shifts scheduled for later, batched execution.
///
/// Scheduling a command returns a [`DeferredResultIndex`] token; the value it
/// refers to is only defined once [`JtagAccess::write_register_batch`] (or
/// the higher-level `flush`) has returned successfully. Reading the token
/// before that is a logic error the type system makes inconvenient, not
/// impossible — matching the "reading incoming buffers before flush is
/// undefined" rule of §3.
#[derive(Debug, Default)]
pub struct JtagCommandQueue {
    commands: Vec<(DeferredResultIndex, JtagCommand)>,
}

impl JtagCommandQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a command, returning a token redeemable after a flush.
    pub fn schedule(&mut self, command: JtagCommand) -> DeferredResultIndex {
        let index = DeferredResultIndex::new();
        self.commands.push((index.clone(), command));
        index
    }

    /// Number of commands currently queued.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the queue has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&DeferredResultIndex, &JtagCommand)> {
        self.commands.iter().map(|(idx, cmd)| (idx, cmd))
    }

    /// Drops every scheduled command. Used after a successful flush.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// An error produced while executing a batch of commands.
///
/// Carries the results that *did* complete before the failure, so a caller
/// that only needed an early subset of the batch can still make use of them.
#[derive(thiserror::Error, Debug)]
#[error("batch execution failed after {} successful commands: {error}", results.len())]
pub struct BatchExecutionError {
    /// The error that aborted the batch.
    #[source]
    pub error: DebugProbeError,
    /// Results captured before the failure.
    pub results: DeferredResultSet,
}

impl BatchExecutionError {
    pub(crate) fn new(error: DebugProbeError, results: DeferredResultSet) -> Self {
        Self { error, results }
    }
}

/// The set of results produced by executing a [`JtagCommandQueue`].
#[derive(Debug, Default)]
pub struct DeferredResultSet(HashMap<DeferredResultIndex, CommandResult>);

impl DeferredResultSet {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, idx: &DeferredResultIndex, result: CommandResult) {
        self.0.insert(idx.clone(), result);
    }

    /// Absorbs another result set, e.g. after a partially-successful batch.
    pub(crate) fn merge(&mut self, other: DeferredResultSet) {
        self.0.extend(other.0);
    }

    /// Number of results captured.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether any results were captured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Takes the result for `index` out of the set.
    ///
    /// Returns the index back as `Err` if it was never populated (the batch
    /// aborted before reaching it).
    pub fn take(&mut self, index: DeferredResultIndex) -> Result<CommandResult, DeferredResultIndex> {
        self.0.remove(&index).ok_or(index)
    }
}

/// An opaque token redeemable for the result of a scheduled [`JtagCommand`]
/// once the owning queue has been flushed.
#[derive(Eq)]
pub struct DeferredResultIndex(Arc<()>);

impl DeferredResultIndex {
    fn new() -> Self {
        Self(Arc::new(()))
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl Clone for DeferredResultIndex {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl PartialEq for DeferredResultIndex {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::hash::Hash for DeferredResultIndex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state)
    }
}

impl fmt::Debug for DeferredResultIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeferredResultIndex").field(&self.id()).finish()
    }
}
