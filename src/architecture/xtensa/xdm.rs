//! TAP primitive, Nexus transaction, Power/Status and OCD register layers
//! (§4.1-§4.2).
//!
//! Everything that puts bytes on the JTAG wire for the Xtensa debug module
//! lives here. Instruction injection (§4.3) and the higher-level poll/halt
//! state machine (§4.7) are built one level up, in
//! [`super::communication_interface`], entirely in terms of the primitives
//! this module exposes.

use crate::architecture::xtensa::arch::Instruction;
use crate::architecture::xtensa::config::XtensaChipConfig;
use crate::probe::{
    CommandResult, DebugProbeError, DeferredResultIndex, DeferredResultSet, JtagAccess,
    JtagCommand, JtagCommandQueue,
};

/// IR opcodes for the TAP instructions this layer drives (§4.1).
mod ir {
    pub const PWRCTL: u32 = 0x08;
    pub const PWRSTAT: u32 = 0x09;
    pub const NARSEL: u32 = 0x1C;
}

/// Nexus register addresses in the OCD block this driver touches (§4.2).
///
/// The wider TRAX (0x00-0x09), performance-counter (0x20-0x3F) and
/// CoreSight-ID (0x60-0x7F) ranges are addressable the same way but are not
/// given named constants: nothing in this driver's scope issues a
/// transaction against them.
pub mod nexus {
    /// Device identification register.
    pub const OCD_ID: u8 = 0x40;
    /// Debug Control Register.
    pub const DCR: u8 = 0x41;
    /// Write-1-to-clear view of [`DCR`].
    pub const DCR_CLR: u8 = 0x42;
    /// Write-1-to-set view of [`DCR`].
    pub const DCR_SET: u8 = 0x43;
    /// Debug Status Register.
    pub const DSR: u8 = 0x44;
    /// Scratch register used to exchange data with injected instructions.
    pub const DDR: u8 = 0x45;
    /// `DDR`, but writing it also triggers execution of `DIR0`.
    pub const DDR_EXEC: u8 = 0x46;
    /// Writing an instruction word here executes it immediately.
    pub const DIR0_EXEC: u8 = 0x47;
    /// Instruction register used by the [`DDR_EXEC`] two-step form.
    pub const DIR0: u8 = 0x48;
}

/// `PWRCTL` (§4.1): requests the debug module's power domains stay live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerControl(pub u8);

impl PowerControl {
    pub const JTAG_DEBUG_USE: u8 = 1 << 7;
    pub const DEBUG_RESET: u8 = 1 << 6;
    pub const CORE_RESET: u8 = 1 << 4;
    pub const DEBUG_WAKEUP: u8 = 1 << 2;
    pub const MEM_WAKEUP: u8 = 1 << 1;
    pub const CORE_WAKEUP: u8 = 1 << 0;

    /// Returns a copy with `bits` additionally set.
    pub const fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }
}

/// `PWRSTAT` (§4.1): observed, write-1-to-clear power-domain status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerStatus(pub u8);

impl PowerStatus {
    pub const DEBUG_WAS_RESET: u8 = 1 << 6;
    pub const CORE_WAS_RESET: u8 = 1 << 4;
    pub const CORE_STILL_NEEDED: u8 = 1 << 3;
    pub const DEBUG_DOMAIN_ON: u8 = 1 << 2;
    pub const MEM_DOMAIN_ON: u8 = 1 << 1;
    pub const CORE_DOMAIN_ON: u8 = 1 << 0;

    /// The mask this driver writes back to `PWRSTAT` to clear the two
    /// "was reset" latches while reading the current status.
    pub const CLEAR_RESET_LATCHES: u8 = Self::DEBUG_WAS_RESET | Self::CORE_WAS_RESET;

    pub fn debug_was_reset(self) -> bool {
        self.0 & Self::DEBUG_WAS_RESET != 0
    }

    pub fn core_was_reset(self) -> bool {
        self.0 & Self::CORE_WAS_RESET != 0
    }

    pub fn debug_domain_on(self) -> bool {
        self.0 & Self::DEBUG_DOMAIN_ON != 0
    }
}

/// `DCR`, the Debug Control Register (§4.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugControl(pub u32);

impl DebugControl {
    pub const ENABLE_OCD: u32 = 1 << 0;
    pub const DEBUG_INTERRUPT: u32 = 1 << 1;
    pub const INTERRUPT_ALL_CONDS: u32 = 1 << 2;
    pub const BREAK_IN_EN: u32 = 1 << 16;
    pub const BREAK_OUT_EN: u32 = 1 << 17;
    pub const DEBUG_SW_ACTIVE: u32 = 1 << 20;
    pub const RUN_STALL_IN_EN: u32 = 1 << 21;
    pub const DEBUG_MODE_OUT_EN: u32 = 1 << 22;
}

/// `DSR`, the Debug Status Register (§4.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugStatus(pub u32);

impl DebugStatus {
    pub const EXEC_DONE: u32 = 1 << 0;
    pub const EXEC_EXCEPTION: u32 = 1 << 1;
    pub const EXEC_BUSY: u32 = 1 << 2;
    pub const EXEC_OVERRUN: u32 = 1 << 3;
    pub const STOPPED: u32 = 1 << 4;
    pub const CORE_WROTE_DDR: u32 = 1 << 10;
    pub const CORE_READ_DDR: u32 = 1 << 11;
    pub const HOST_WROTE_DDR: u32 = 1 << 14;
    pub const HOST_READ_DDR: u32 = 1 << 15;
    pub const DEBUG_PEND_BREAK: u32 = 1 << 16;
    pub const DEBUG_PEND_HOST: u32 = 1 << 17;
    pub const DEBUG_PEND_TRAX: u32 = 1 << 18;
    pub const DEBUG_INT_BREAK: u32 = 1 << 20;
    pub const DEBUG_INT_HOST: u32 = 1 << 21;
    pub const DEBUG_INT_TRAX: u32 = 1 << 22;
    pub const RUN_STALL_SAMPLE: u32 = 1 << 24;

    pub fn stopped(self) -> bool {
        self.0 & Self::STOPPED != 0
    }

    pub fn exec_busy(self) -> bool {
        self.0 & Self::EXEC_BUSY != 0
    }

    pub fn exec_exception(self) -> bool {
        self.0 & Self::EXEC_EXCEPTION != 0
    }

    pub fn exec_overrun(self) -> bool {
        self.0 & Self::EXEC_OVERRUN != 0
    }
}

/// The status bits shifted out of the NAR half of a Nexus transaction,
/// reporting the outcome of the *previous* Nexus access.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum XdmRegisterError {
    #[error("busy")]
    Busy,
    #[error("error")]
    Error,
    #[error("unexpected NAR status {0:#04b}")]
    Unexpected(u8),
}

/// Errors arising from the TAP/Nexus/OCD layers.
#[derive(thiserror::Error, Debug)]
pub enum XdmError {
    /// An error with the usage of the probe or its transport occurred.
    #[error("an error with the usage of the probe occurred")]
    Probe(#[from] DebugProbeError),
    /// A deferred result was read without the queue it came from ever
    /// having been successfully flushed.
    #[error("a deferred result was never produced (queue never flushed successfully)")]
    ResultNotAvailable,
    /// A Nexus register access reported a busy or error status.
    #[error("nexus register {address:#04x} {action}: {source}")]
    Register {
        /// The Nexus address involved.
        address: u8,
        /// `"reading"` or `"writing"`.
        action: &'static str,
        #[source]
        source: XdmRegisterError,
    },
    /// An injected instruction raised a CPU exception.
    #[error("the core raised an exception while executing an injected instruction")]
    ExecException,
    /// The debug module reported `EXECOVERRUN` for an injected instruction.
    #[error("an injected instruction overran its execution budget")]
    ExecOverrun,
    /// `OCDID` read back as all-zero or all-one bits: the debug module is
    /// not powered, or the TAP is talking to the wrong device.
    #[error("the Xtensa debug module appears to be powered off")]
    PoweredOff,
}

/// Owns a `JtagAccess` transport and the queue of shifts scheduled against
/// it, and exposes the TAP/Nexus/Power/OCD register primitives of §4.1-4.2.
///
/// Nothing above the `schedule_*`/`*_write`/`*_read` calls in this struct
/// knows anything about Xtensa CPU state; it is purely a typed veneer over
/// [`JtagAccess`].
pub struct Xdm<'probe> {
    probe: &'probe mut dyn JtagAccess,
    config: XtensaChipConfig,
    queue: JtagCommandQueue,
    results: DeferredResultSet,
    /// Indices of the NAR-half captures of in-flight Nexus accesses, along
    /// with the address and direction they belong to, checked for
    /// busy/error status as part of the next [`Xdm::flush`].
    pending_nar_checks: Vec<(u8, &'static str, DeferredResultIndex)>,
}

impl<'probe> Xdm<'probe> {
    /// Wraps a transport with the given chip configuration.
    pub fn new(probe: &'probe mut dyn JtagAccess, config: XtensaChipConfig) -> Self {
        probe.set_idle_cycles(config.idle_cycles);
        Self {
            probe,
            config,
            queue: JtagCommandQueue::new(),
            results: DeferredResultSet::new(),
            pending_nar_checks: Vec::new(),
        }
    }

    /// The configuration this instance was constructed with.
    pub fn config(&self) -> &XtensaChipConfig {
        &self.config
    }

    fn schedule(&mut self, command: JtagCommand) -> DeferredResultIndex {
        self.queue.schedule(command)
    }

    /// Executes every shift scheduled so far and checks any pending Nexus
    /// status bits for busy/error conditions.
    ///
    /// A no-op if nothing is queued, so callers can call this liberally
    /// without worrying about empty-batch overhead.
    pub fn flush(&mut self) -> Result<(), XdmError> {
        if self.queue.is_empty() {
            return Ok(());
        }

        tracing::trace!("Flushing {} queued JTAG commands", self.queue.len());

        match self.probe.write_register_batch(&self.queue) {
            Ok(results) => {
                self.queue.clear();
                self.results.merge(results);
            }
            Err(e) => {
                self.queue.clear();
                self.results.merge(e.results);
                return Err(XdmError::Probe(e.error));
            }
        }

        self.check_pending_nar_status()
    }

    fn check_pending_nar_status(&mut self) -> Result<(), XdmError> {
        let checks = std::mem::take(&mut self.pending_nar_checks);
        for (address, action, idx) in checks {
            let Ok(result) = self.results.take(idx) else {
                // The NAR shift was part of a batch that aborted before
                // reaching it; the probe error already surfaced above.
                continue;
            };

            match result.into_u8() & 0b11 {
                0 => {}
                1 => {
                    tracing::warn!("Nexus {action} {address:#04x}: error status");
                    return Err(XdmError::Register {
                        address,
                        action,
                        source: XdmRegisterError::Error,
                    });
                }
                2 => {
                    tracing::warn!("Nexus {action} {address:#04x}: busy status");
                    return Err(XdmError::Register {
                        address,
                        action,
                        source: XdmRegisterError::Busy,
                    });
                }
                other => {
                    return Err(XdmError::Register {
                        address,
                        action,
                        source: XdmRegisterError::Unexpected(other),
                    });
                }
            }
        }
        Ok(())
    }

    fn take(&mut self, index: DeferredResultIndex) -> Result<CommandResult, XdmError> {
        match self.results.take(index) {
            Ok(result) => Ok(result),
            Err(index) => {
                self.flush()?;
                self.results.take(index).map_err(|_| XdmError::ResultNotAvailable)
            }
        }
    }

    // --- §4.1: PWRCTL / PWRSTAT -------------------------------------------

    /// Schedules a `PWRCTL` write. The previous PWRCTL byte is shifted out
    /// but is not meaningful to this driver, so no token is kept.
    fn schedule_power_control(&mut self, bits: PowerControl) {
        self.schedule(JtagCommand::Ir { value: ir::PWRCTL });
        self.schedule(JtagCommand::Dr {
            data: vec![bits.0],
            len: 8,
        });
    }

    /// Asserts `DEBUGWAKEUP`/`MEMWAKEUP`/`COREWAKEUP`, then re-writes the
    /// same bits plus `JTAGDEBUGUSE`.
    ///
    /// Two writes are required every time: `JTAGDEBUGUSE` self-clears on
    /// any PWRCTL write, so a fresh 0→1 edge has to be produced on this
    /// write to keep the debug path live (§4.1).
    pub fn assert_debug_wakeup(&mut self) -> Result<(), XdmError> {
        let base =
            PowerControl::default().with(PowerControl::DEBUG_WAKEUP | PowerControl::MEM_WAKEUP | PowerControl::CORE_WAKEUP);
        self.schedule_power_control(base);
        self.schedule_power_control(base.with(PowerControl::JTAG_DEBUG_USE));
        Ok(())
    }

    /// Schedules `PWRSTAT` read-and-clear (of the two was-reset latches),
    /// returning a token for the status as observed *before* the clear.
    pub fn schedule_power_status(&mut self) -> DeferredResultIndex {
        self.schedule(JtagCommand::Ir { value: ir::PWRSTAT });
        self.schedule(JtagCommand::Dr {
            data: vec![PowerStatus::CLEAR_RESET_LATCHES],
            len: 8,
        })
    }

    /// Reads and clears `PWRSTAT`, flushing immediately.
    pub fn power_status(&mut self) -> Result<PowerStatus, XdmError> {
        let idx = self.schedule_power_status();
        self.flush()?;
        Ok(PowerStatus(self.take(idx)?.into_u8()))
    }

    // --- §4.1: Nexus register file -----------------------------------------

    fn schedule_nexus_write(&mut self, address: u8, value: u32) {
        self.schedule(JtagCommand::Ir { value: ir::NARSEL });
        let nar = self.schedule(JtagCommand::Dr {
            data: vec![(address << 1) | 1],
            len: 8,
        });
        self.pending_nar_checks.push((address, "writing", nar));
        self.schedule(JtagCommand::Dr {
            data: value.to_le_bytes().to_vec(),
            len: 32,
        });
    }

    fn schedule_nexus_read(&mut self, address: u8) -> DeferredResultIndex {
        self.schedule(JtagCommand::Ir { value: ir::NARSEL });
        let nar = self.schedule(JtagCommand::Dr {
            data: vec![address << 1],
            len: 8,
        });
        self.pending_nar_checks.push((address, "reading", nar));
        self.schedule(JtagCommand::Dr {
            data: vec![0; 4],
            len: 32,
        })
    }

    fn nexus_write(&mut self, address: u8, value: u32) -> Result<(), XdmError> {
        self.schedule_nexus_write(address, value);
        self.flush()
    }

    fn nexus_read(&mut self, address: u8) -> Result<u32, XdmError> {
        let idx = self.schedule_nexus_read(address);
        self.flush()?;
        Ok(self.take(idx)?.into_u32())
    }

    // --- §4.2: OCD register layer ------------------------------------------

    /// `DCRSET`: sets bits in the Debug Control Register.
    pub fn dcr_set(&mut self, bits: u32) -> Result<(), XdmError> {
        self.nexus_write(nexus::DCR_SET, bits)
    }

    /// `DCRCLR`: clears bits in the Debug Control Register.
    pub fn dcr_clr(&mut self, bits: u32) -> Result<(), XdmError> {
        self.nexus_write(nexus::DCR_CLR, bits)
    }

    /// `DCRSET <- ENABLEOCD`.
    pub fn enable_ocd(&mut self) -> Result<(), XdmError> {
        self.dcr_set(DebugControl::ENABLE_OCD)
    }

    /// Reads `DSR` and flushes immediately.
    pub fn read_dsr(&mut self) -> Result<DebugStatus, XdmError> {
        Ok(DebugStatus(self.nexus_read(nexus::DSR)?))
    }

    /// Schedules a `DSR` read without flushing.
    pub fn schedule_read_dsr(&mut self) -> DeferredResultIndex {
        self.schedule_nexus_read(nexus::DSR)
    }

    /// Reads `OCDID` and flushes immediately.
    pub fn read_ocd_id(&mut self) -> Result<u32, XdmError> {
        self.nexus_read(nexus::OCD_ID)
    }

    /// Schedules writing `DDR`, the instruction-injection scratch register.
    pub fn schedule_write_ddr(&mut self, value: u32) {
        self.schedule_nexus_write(nexus::DDR, value);
    }

    /// Schedules reading `DDR`, returning a token for the value.
    pub fn schedule_read_ddr(&mut self) -> DeferredResultIndex {
        self.schedule_nexus_read(nexus::DDR)
    }

    /// Reads `DDR` and flushes immediately.
    pub fn read_ddr(&mut self) -> Result<u32, XdmError> {
        self.nexus_read(nexus::DDR)
    }

    /// Schedules executing `instruction` via `DIR0EXEC`.
    pub fn schedule_execute(&mut self, instruction: Instruction) {
        self.schedule_nexus_write(nexus::DIR0_EXEC, instruction.encoding());
    }

    /// Executes `instruction` immediately and checks `DSR` for an exception
    /// or overrun before returning.
    pub fn execute(&mut self, instruction: Instruction) -> Result<(), XdmError> {
        self.schedule_execute(instruction);
        self.flush()?;
        self.check_exec_status()
    }

    fn check_exec_status(&mut self) -> Result<(), XdmError> {
        let status = self.read_dsr()?;
        if status.exec_exception() {
            tracing::warn!("Injected instruction raised a CPU exception");
            return Err(XdmError::ExecException);
        }
        if status.exec_overrun() {
            tracing::warn!("Injected instruction overran (EXECOVERRUN)");
            return Err(XdmError::ExecOverrun);
        }
        Ok(())
    }

    // --- §4.7 (transport-level parts): enter debug mode / reset ------------

    /// Brings the debug module out of reset and confirms it answers, per
    /// the power-on handshake of §4.1/§4.7.
    pub fn enter_debug_mode(&mut self) -> Result<(), XdmError> {
        tracing::debug!("Entering Xtensa debug mode");
        self.assert_debug_wakeup()?;
        self.flush()?;
        self.enable_ocd()?;

        let id = self.read_ocd_id()?;
        if id == 0 || id == u32::MAX {
            tracing::warn!("OCDID read back as {id:#010x}; debug module appears unpowered");
            return Err(XdmError::PoweredOff);
        }
        tracing::info!("Xtensa debug module responding, OCDID = {id:#010x}");
        Ok(())
    }

    /// Pulses the transport's reset line(s). `srst` is always asserted;
    /// `trst` follows [`XtensaChipConfig::pulse_trst_on_reset`].
    pub fn assert_reset(&mut self) -> Result<(), XdmError> {
        tracing::debug!("Asserting target reset");
        self.schedule(JtagCommand::Reset {
            trst: self.config.pulse_trst_on_reset,
            srst: true,
        });
        self.flush()
    }

    /// Releases the reset line(s).
    pub fn deassert_reset(&mut self) -> Result<(), XdmError> {
        tracing::debug!("Deasserting target reset");
        self.schedule(JtagCommand::Reset {
            trst: false,
            srst: false,
        });
        self.flush()
    }

    /// Queues a delay of `micros` microseconds in the scan sequence.
    pub fn sleep(&mut self, micros: u32) {
        self.schedule(JtagCommand::Sleep { micros });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_control_bits_match_spec_layout() {
        let bits = PowerControl::default()
            .with(PowerControl::DEBUG_WAKEUP | PowerControl::MEM_WAKEUP | PowerControl::CORE_WAKEUP);
        assert_eq!(bits.0, 0b0000_0111);
        assert_eq!(bits.with(PowerControl::JTAG_DEBUG_USE).0, 0b1000_0111);
    }

    #[test]
    fn power_status_clear_mask_targets_was_reset_bits_only() {
        assert_eq!(PowerStatus::CLEAR_RESET_LATCHES, 0b0101_0000);
    }

    #[test]
    fn debug_status_stopped_bit_is_four() {
        assert!(DebugStatus(1 << 4).stopped());
        assert!(!DebugStatus(0).stopped());
    }
}
