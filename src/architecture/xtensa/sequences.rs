//! Chip-specific hooks into the connect/halt/reset sequence.
//!
//! The 108Mini core itself needs nothing beyond the generic handshake of
//! §4.7; this trait exists so a host framework describing a concrete chip
//! (e.g. one with an external power-management IC that needs poking before
//! the debug module will respond) can inject the extra steps without this
//! crate knowing about that chip.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::architecture::xtensa::communication_interface::XtensaCommunicationInterface;
use crate::Error;

/// Chip-specific extensions to the connect/halt/reset sequence.
pub trait XtensaDebugSequence: Debug + Send + Sync {
    /// Called once the debug module has answered and before the core is
    /// otherwise touched.
    fn on_connect(&self, _interface: &mut XtensaCommunicationInterface<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Called every time the core transitions into the halted state.
    fn on_halt(&self, _interface: &mut XtensaCommunicationInterface<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Resets the target and waits for it to halt again, within `timeout`.
    fn reset_and_halt(&self, interface: &mut XtensaCommunicationInterface<'_>, timeout: Duration) -> Result<(), Error> {
        interface.reset_and_halt(timeout)
    }
}

/// The sequence used when a host framework does not supply a chip-specific
/// one: every hook is a no-op beyond what
/// [`XtensaCommunicationInterface`] already does on its own.
#[derive(Debug, Default)]
pub struct DefaultXtensaSequence;

impl DefaultXtensaSequence {
    /// Builds a shareable handle to the default sequence.
    pub fn create() -> Arc<dyn XtensaDebugSequence> {
        Arc::new(Self)
    }
}

impl XtensaDebugSequence for DefaultXtensaSequence {}
