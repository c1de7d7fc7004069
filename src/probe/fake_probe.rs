//! An in-memory [`JtagAccess`] double that simulates just enough of the
//! Xtensa debug module and CPU to drive the state machine under test
//! (§4.8 "Test tooling").
//!
//! This is not a general Xtensa emulator: it decodes only the handful of
//! instruction encodings [`crate::architecture::xtensa::arch`] ever injects
//! (`RSR`/`WSR`/`XSR`, the three load/store widths, `ROTW`, `RFDO`) and
//! tracks only the OCD registers this driver actually touches. It exists so
//! `examine`/`poll`/`halt`/`resume`/`step`, the register cache refresh and
//! restore, the memory engine, and the breakpoint manager all have
//! something to talk to without real hardware.

use std::collections::HashMap;

use crate::probe::{DebugProbeError, JtagAccess, TapState};

const IR_PWRCTL: u32 = 0x08;
const IR_PWRSTAT: u32 = 0x09;
const IR_NARSEL: u32 = 0x1C;

const NEXUS_OCD_ID: u8 = 0x40;
const NEXUS_DCR_CLR: u8 = 0x42;
const NEXUS_DCR_SET: u8 = 0x43;
const NEXUS_DSR: u8 = 0x44;
const NEXUS_DDR: u8 = 0x45;
const NEXUS_DIR0_EXEC: u8 = 0x47;

const SR_DDR: u8 = 104;
const SR_ICOUNT_LEVEL: u8 = 237;

const DSR_STOPPED: u32 = 1 << 4;

const PWRSTAT_DEBUG_WAS_RESET: u8 = 1 << 6;
const PWRSTAT_CORE_WAS_RESET: u8 = 1 << 4;
const PWRSTAT_DOMAINS_ON: u8 = 0b0000_0111;

/// A pending Nexus transaction: the address and direction latched by the
/// first (8-bit) DR shift after an `IR=NARSEL`, awaiting the second
/// (32-bit) DR shift that actually moves data (§4.1).
#[derive(Debug, Clone, Copy)]
struct PendingNexus {
    address: u8,
    write: bool,
}

/// The simulated Xtensa CPU and debug-module state.
#[derive(Debug)]
pub struct FakeProbe {
    last_ir: u32,
    pending_nexus: Option<PendingNexus>,
    idle_cycles: u8,
    shift_count: usize,

    pwrstat: u8,
    dcr: u32,
    stopped: bool,

    ddr: u32,
    phys_ar: [u32; 64],
    window_base_units: u8,
    sr: HashMap<u8, u32>,
    memory: HashMap<u32, u8>,
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self {
            last_ir: 0,
            pending_nexus: None,
            idle_cycles: 0,
            shift_count: 0,
            pwrstat: PWRSTAT_DOMAINS_ON,
            dcr: 0,
            stopped: false,
            ddr: 0,
            phys_ar: [0; 64],
            window_base_units: 0,
            sr: HashMap::new(),
            memory: HashMap::new(),
        }
    }
}

impl FakeProbe {
    /// A fresh simulated target: debug domains powered, core running, no
    /// pending reset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether `DSR.STOPPED` should read as set.
    pub fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    /// Arranges for the next `PWRSTAT` read to report `DEBUGWASRESET` and
    /// `COREWASRESET`, as if a reset had just been observed.
    pub fn set_pending_reset(&mut self, pending: bool) {
        if pending {
            self.pwrstat |= PWRSTAT_DEBUG_WAS_RESET | PWRSTAT_CORE_WAS_RESET;
        } else {
            self.pwrstat &= !(PWRSTAT_DEBUG_WAS_RESET | PWRSTAT_CORE_WAS_RESET);
        }
    }

    /// Total number of IR/DR shifts this probe has seen, for asserting that
    /// a precondition failure produced no TAP traffic.
    pub fn shift_count(&self) -> usize {
        self.shift_count
    }

    fn ar_slot(&self, logical: u8) -> usize {
        (self.window_base_units as usize * 4 + logical as usize) % 64
    }

    fn read_ar(&self, logical: u8) -> u32 {
        self.phys_ar[self.ar_slot(logical)]
    }

    fn write_ar(&mut self, logical: u8, value: u32) {
        let slot = self.ar_slot(logical);
        self.phys_ar[slot] = value;
    }

    fn read_sr(&self, sr: u8) -> u32 {
        if sr == SR_DDR {
            self.ddr
        } else {
            *self.sr.get(&sr).unwrap_or(&0)
        }
    }

    fn write_sr(&mut self, sr: u8, value: u32) {
        if sr == SR_DDR {
            self.ddr = value;
        } else {
            self.sr.insert(sr, value);
        }
    }

    fn read_mem(&self, address: u32, size: u8) -> u32 {
        let mut bytes = [0u8; 4];
        for i in 0..size as u32 {
            bytes[i as usize] = *self.memory.get(&(address + i)).unwrap_or(&0);
        }
        u32::from_le_bytes(bytes)
    }

    fn write_mem(&mut self, address: u32, size: u8, value: u32) {
        let bytes = value.to_le_bytes();
        for i in 0..size as u32 {
            self.memory.insert(address + i, bytes[i as usize]);
        }
    }

    /// Decodes and executes one injected instruction word (§4.3).
    fn execute_instruction(&mut self, encoding: u32) {
        let low_nibble = encoding & 0xF;
        let t = ((encoding >> 4) & 0xF) as u8;
        let s = ((encoding >> 8) & 0xF) as u8;

        if low_nibble == 0x2 {
            // Load/store RRI8 family: distinguished by bits 12..16.
            let kind = (encoding >> 12) & 0xF;
            let imm8 = ((encoding >> 16) & 0xFF) as u32;
            let base = self.read_ar(s);
            match kind {
                0 => {
                    let addr = base.wrapping_add(imm8);
                    self.write_ar(t, self.read_mem(addr, 1));
                }
                1 => {
                    let addr = base.wrapping_add(imm8 * 2);
                    self.write_ar(t, self.read_mem(addr, 2));
                }
                2 => {
                    let addr = base.wrapping_add(imm8 * 4);
                    self.write_ar(t, self.read_mem(addr, 4));
                }
                4 => {
                    let addr = base.wrapping_add(imm8);
                    self.write_mem(addr, 1, self.read_ar(t));
                }
                5 => {
                    let addr = base.wrapping_add(imm8 * 2);
                    self.write_mem(addr, 2, self.read_ar(t));
                }
                6 => {
                    let addr = base.wrapping_add(imm8 * 4);
                    self.write_mem(addr, 4, self.read_ar(t));
                }
                _ => {}
            }
            return;
        }

        match encoding & 0xFF_0000 {
            0x03_0000 => {
                let sr = ((encoding >> 8) & 0xFF) as u8;
                let value = self.read_sr(sr);
                self.write_ar(t, value);
                return;
            }
            0x13_0000 => {
                let sr = ((encoding >> 8) & 0xFF) as u8;
                let value = self.read_ar(t);
                self.write_sr(sr, value);
                return;
            }
            0x61_0000 => {
                let sr = ((encoding >> 8) & 0xFF) as u8;
                let old_sr = self.read_sr(sr);
                let old_ar = self.read_ar(t);
                self.write_sr(sr, old_ar);
                self.write_ar(t, old_sr);
                return;
            }
            _ => {}
        }

        if encoding & 0xFFF_000 == 0x408_000 {
            let n = ((encoding >> 4) & 0xF) as u8;
            self.window_base_units = (self.window_base_units + n) % 16;
            return;
        }

        if encoding & 0xFF_FF00 == 0xF1_E000 || encoding & 0xFF_FF00 == 0xF1_E100 {
            // RFDO: resume the core. `ICOUNTLEVEL` armed (the single-step
            // recipe) means exactly one instruction retires before the
            // `ICOUNT` trap re-stops the core; a real target spends a few
            // cycles doing that, but nothing here cares about the
            // difference, so the "one instruction" happens instantaneously.
            self.stopped = self.read_sr(SR_ICOUNT_LEVEL) != 0;
        }
    }

    fn handle_nexus_read(&mut self, address: u8) -> u32 {
        match address {
            NEXUS_OCD_ID => 0x1200_34E5,
            NEXUS_DSR => {
                if self.stopped {
                    DSR_STOPPED
                } else {
                    0
                }
            }
            NEXUS_DDR => self.ddr,
            _ => 0,
        }
    }

    fn handle_nexus_write(&mut self, address: u8, value: u32) {
        match address {
            NEXUS_DCR_SET => self.dcr |= value,
            NEXUS_DCR_CLR => self.dcr &= !value,
            NEXUS_DDR => self.ddr = value,
            NEXUS_DIR0_EXEC => self.execute_instruction(value),
            _ => {}
        }
    }
}

impl JtagAccess for FakeProbe {
    fn ir_len(&self) -> u32 {
        5
    }

    fn set_idle_cycles(&mut self, idle_cycles: u8) {
        self.idle_cycles = idle_cycles;
    }

    fn idle_cycles(&self) -> u8 {
        self.idle_cycles
    }

    fn write_ir(&mut self, data: u32, _end_state: TapState) -> Result<(), DebugProbeError> {
        self.shift_count += 1;
        self.last_ir = data;
        if data != IR_NARSEL {
            self.pending_nexus = None;
        }
        Ok(())
    }

    fn write_dr(&mut self, data: &[u8], len: u32, _end_state: TapState) -> Result<Vec<u8>, DebugProbeError> {
        self.shift_count += 1;

        match self.last_ir {
            IR_PWRCTL if len == 8 => Ok(vec![0]),
            IR_PWRSTAT if len == 8 => {
                let old = self.pwrstat;
                self.pwrstat &= !data[0];
                Ok(vec![old])
            }
            IR_NARSEL if len == 8 => {
                self.pending_nexus = Some(PendingNexus {
                    address: data[0] >> 1,
                    write: data[0] & 1 != 0,
                });
                Ok(vec![0])
            }
            IR_NARSEL if len == 32 => {
                let Some(pending) = self.pending_nexus.take() else {
                    return Ok(vec![0; 4]);
                };
                if pending.write {
                    let value = u32::from_le_bytes(data.try_into().unwrap_or([0; 4]));
                    self.handle_nexus_write(pending.address, value);
                    Ok(vec![0; 4])
                } else {
                    let value = self.handle_nexus_read(pending.address);
                    Ok(value.to_le_bytes().to_vec())
                }
            }
            _ => Ok(vec![0; (len as usize).div_ceil(8)]),
        }
    }

    fn add_reset(&mut self, _trst: bool, srst: bool) -> Result<(), DebugProbeError> {
        self.shift_count += 1;
        if srst {
            self.set_pending_reset(true);
            self.stopped = false;
        }
        Ok(())
    }

    fn add_sleep(&mut self, _micros: u32) -> Result<(), DebugProbeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::xtensa::arch::{CpuRegister, Instruction, SpecialRegister};

    fn exec(probe: &mut FakeProbe, instruction: Instruction) {
        probe.write_ir(IR_NARSEL, TapState::Idle).unwrap();
        probe.write_dr(&[(NEXUS_DIR0_EXEC << 1) | 1], 8, TapState::Idle).unwrap();
        probe
            .write_dr(&instruction.encoding().to_le_bytes(), 32, TapState::Idle)
            .unwrap();
    }

    fn write_ddr(probe: &mut FakeProbe, value: u32) {
        probe.write_ir(IR_NARSEL, TapState::Idle).unwrap();
        probe.write_dr(&[(NEXUS_DDR << 1) | 1], 8, TapState::Idle).unwrap();
        probe.write_dr(&value.to_le_bytes(), 32, TapState::Idle).unwrap();
    }

    fn read_ddr(probe: &mut FakeProbe) -> u32 {
        probe.write_ir(IR_NARSEL, TapState::Idle).unwrap();
        probe.write_dr(&[NEXUS_DDR << 1], 8, TapState::Idle).unwrap();
        let bytes = probe.write_dr(&[0; 4], 32, TapState::Idle).unwrap();
        u32::from_le_bytes(bytes.try_into().unwrap())
    }

    #[test]
    fn rsr_wsr_round_trip_through_ddr() {
        let mut probe = FakeProbe::new();
        write_ddr(&mut probe, 0xCAFE_BABE);
        exec(&mut probe, Instruction::rsr(SpecialRegister::Ddr, CpuRegister::A3));
        exec(&mut probe, Instruction::wsr(SpecialRegister::Ddr, CpuRegister::A3));
        assert_eq!(read_ddr(&mut probe), 0xCAFE_BABE);
    }

    #[test]
    fn load_store_round_trip() {
        let mut probe = FakeProbe::new();
        write_ddr(&mut probe, 0x1000);
        exec(&mut probe, Instruction::rsr(SpecialRegister::Ddr, CpuRegister::A0));
        write_ddr(&mut probe, 0x55);
        exec(&mut probe, Instruction::rsr(SpecialRegister::Ddr, CpuRegister::A1));
        exec(&mut probe, Instruction::s8i(CpuRegister::A0, CpuRegister::A1, 2));
        exec(&mut probe, Instruction::l8ui(CpuRegister::A0, CpuRegister::A1, 2));
        exec(&mut probe, Instruction::wsr(SpecialRegister::Ddr, CpuRegister::A1));
        assert_eq!(read_ddr(&mut probe), 0x55);
    }

    #[test]
    fn rotw_forward_and_back_cancels() {
        let mut probe = FakeProbe::new();
        exec(&mut probe, Instruction::rotw(4));
        exec(&mut probe, Instruction::rotw(-4));
        assert_eq!(probe.window_base_units, 0);
    }

    #[test]
    fn pwrstat_read_and_clear_latches_reset_then_clears() {
        let mut probe = FakeProbe::new();
        probe.set_pending_reset(true);
        probe.write_ir(IR_PWRSTAT, TapState::Idle).unwrap();
        let status = probe.write_dr(&[PWRSTAT_DEBUG_WAS_RESET | PWRSTAT_CORE_WAS_RESET], 8, TapState::Idle).unwrap();
        assert_eq!(status[0] & PWRSTAT_DEBUG_WAS_RESET, PWRSTAT_DEBUG_WAS_RESET);
        assert_eq!(probe.pwrstat & PWRSTAT_DEBUG_WAS_RESET, 0);
    }
}
