//! Host-framework breakpoint records (§3, "Breakpoint slot").

/// The kind of breakpoint the host framework asked for.
///
/// Only [`BreakpointType::Hardware`] is honoured by this driver; a `Software`
/// request fails fast with [`crate::Error::ResourceNotAvailable`] per §4.6 —
/// the 108Mini configuration this driver targets has no software-breakpoint
/// support (trap-based breakpoints would require instruction patching this
/// driver does not implement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointType {
    /// A hardware instruction breakpoint (IBREAKA/IBREAKENABLE).
    Hardware,
    /// A software breakpoint (unsupported).
    Software,
}

/// A breakpoint request as handed down by the host framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    /// The instruction address to break on.
    pub address: u32,
    /// The requested breakpoint kind.
    pub kind: BreakpointType,
}

impl Breakpoint {
    /// Convenience constructor for a hardware breakpoint at `address`.
    pub fn hardware(address: u32) -> Self {
        Self {
            address,
            kind: BreakpointType::Hardware,
        }
    }
}
