//! Per-chip constants (§4.9).
//!
//! The host framework's config-registry (out of scope) is expected to
//! populate one of these from a chip description file and hand it to
//! [`super::communication_interface::XtensaCommunicationInterface::new`].
//! This driver never reads a file itself.

/// The number of hardware instruction-breakpoint slots the 108Mini
/// configuration implements.
pub const XT_NUM_BREAKPOINTS: usize = 2;

/// Constants describing the specific Xtensa core instance being debugged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XtensaChipConfig {
    /// Width, in bits, of the TAP's instruction register.
    pub ir_width: u32,
    /// Idle cycles requested after each DR shift.
    pub idle_cycles: u8,
    /// Number of hardware breakpoint units (mirrors [`XT_NUM_BREAKPOINTS`];
    /// kept as a field so a future core with a different count doesn't need
    /// a new constant).
    pub num_hardware_breakpoints: usize,
    /// The debug level used to select which `EPC[n]`/`EPS[n]` pair backs PC
    /// and PS while halted. The 108Mini uses level 6.
    pub epc_debug_level: u8,
    /// Whether `TRST` should be pulsed alongside `SRST` on reset.
    pub pulse_trst_on_reset: bool,
}

impl Default for XtensaChipConfig {
    fn default() -> Self {
        Self {
            ir_width: 5,
            idle_cycles: 100,
            num_hardware_breakpoints: XT_NUM_BREAKPOINTS,
            epc_debug_level: 6,
            pulse_trst_on_reset: false,
        }
    }
}
