//! The chunked memory-access engine (§4.5).
//!
//! Built entirely out of the instruction-injection recipes of §4.3: two
//! general registers (`a0` as the address base, `a1` as a data scratch) and
//! a run of immediate-offset loads or stores per chunk.

use scroll::{Pread, Pwrite, LE};

use crate::architecture::xtensa::arch::{CpuRegister, Instruction, SpecialRegister};
use crate::architecture::xtensa::register_cache::RegisterCache;
use crate::architecture::xtensa::xdm::Xdm;
use crate::core::RegisterId;
use crate::Error;

/// The largest run of elements a single chunk can cover: the range of the
/// `imm8` immediate operand used by the load/store instructions (step 3).
const MAX_CHUNK_ELEMENTS: usize = 255;

/// `AR[reg] <- value`, via the DDR/RSR recipe of §4.3.
pub(crate) fn write_ar(xdm: &mut Xdm, reg: CpuRegister, value: u32) -> Result<(), Error> {
    xdm.schedule_write_ddr(value);
    xdm.execute(Instruction::rsr(SpecialRegister::Ddr, reg))?;
    Ok(())
}

/// `value <- AR[reg]`, via the WSR/DDR recipe of §4.3.
pub(crate) fn read_ar(xdm: &mut Xdm, reg: CpuRegister) -> Result<u32, Error> {
    xdm.execute(Instruction::wsr(SpecialRegister::Ddr, reg))?;
    Ok(xdm.read_ddr()?)
}

/// Reserves `a0`/`a1` as scratch for the duration of a memory access.
///
/// The engine is about to overwrite both on-chip without going through the
/// normal write recipe (which would mark them dirty itself); since the
/// cache is guaranteed valid+clean right after a halt, we force both dirty
/// here so the pre-resume writeback restores whatever they held before this
/// access clobbered them (§4.5 step 2).
fn reserve_scratch(cache: &mut RegisterCache) {
    for reg in [CpuRegister::base(), CpuRegister::scratch()] {
        cache.clobber(RegisterId(reg.address()));
    }
}

fn validate(address: u32, size: u8, count: usize) -> Result<(), Error> {
    if !matches!(size, 1 | 2 | 4) {
        return Err(Error::Syntax("memory access size must be 1, 2 or 4 bytes"));
    }
    if count == 0 {
        return Err(Error::Syntax("memory access count must be nonzero"));
    }
    if size > 1 && address % size as u32 != 0 {
        return Err(Error::UnalignedAccess { address, width: size });
    }
    Ok(())
}

fn load_instruction(size: u8, base: CpuRegister, dest: CpuRegister, imm8: u8) -> Instruction {
    match size {
        1 => Instruction::l8ui(base, dest, imm8),
        2 => Instruction::l16ui(base, dest, imm8),
        _ => Instruction::l32i(base, dest, imm8),
    }
}

fn store_instruction(size: u8, base: CpuRegister, src: CpuRegister, imm8: u8) -> Instruction {
    match size {
        1 => Instruction::s8i(base, src, imm8),
        2 => Instruction::s16i(base, src, imm8),
        _ => Instruction::s32i(base, src, imm8),
    }
}

/// Writes the low `size` bytes of `value` into `buf` at `offset`, little-endian.
fn write_sized(buf: &mut [u8], offset: usize, size: u8, value: u32) {
    match size {
        1 => buf.pwrite_with(value as u8, offset, LE),
        2 => buf.pwrite_with(value as u16, offset, LE),
        _ => buf.pwrite_with(value, offset, LE),
    }
    .expect("offset was computed from a caller-validated buffer length");
}

/// Reads `size` little-endian bytes out of `buf` at `offset`, zero-extended to `u32`.
fn read_sized(buf: &[u8], offset: usize, size: u8) -> u32 {
    match size {
        1 => buf.pread_with::<u8>(offset, LE).expect("validated offset") as u32,
        2 => buf.pread_with::<u16>(offset, LE).expect("validated offset") as u32,
        _ => buf.pread_with::<u32>(offset, LE).expect("validated offset"),
    }
}

/// Reads `count` elements of `size` bytes (1, 2 or 4) starting at `address`
/// into `dst`, which must be at least `count * size` bytes long.
pub fn read_elements(
    xdm: &mut Xdm,
    cache: &mut RegisterCache,
    address: u32,
    size: u8,
    count: usize,
    dst: &mut [u8],
) -> Result<(), Error> {
    validate(address, size, count)?;
    reserve_scratch(cache);

    let base = CpuRegister::base();
    let scratch = CpuRegister::scratch();

    for chunk_start in (0..count).step_by(MAX_CHUNK_ELEMENTS) {
        let chunk_len = (count - chunk_start).min(MAX_CHUNK_ELEMENTS);
        let chunk_address = address.wrapping_add((chunk_start * size as usize) as u32);
        write_ar(xdm, base, chunk_address)?;

        for i in 0..chunk_len {
            xdm.execute(load_instruction(size, base, scratch, i as u8))?;
            let value = read_ar(xdm, scratch)?;
            let offset = (chunk_start + i) * size as usize;
            write_sized(dst, offset, size, value);
        }
    }

    Ok(())
}

/// Writes `count` elements of `size` bytes (1, 2 or 4) starting at `address`
/// from `src`, which must be at least `count * size` bytes long.
pub fn write_elements(
    xdm: &mut Xdm,
    cache: &mut RegisterCache,
    address: u32,
    size: u8,
    count: usize,
    src: &[u8],
) -> Result<(), Error> {
    validate(address, size, count)?;
    reserve_scratch(cache);

    let base = CpuRegister::base();
    let scratch = CpuRegister::scratch();

    for chunk_start in (0..count).step_by(MAX_CHUNK_ELEMENTS) {
        let chunk_len = (count - chunk_start).min(MAX_CHUNK_ELEMENTS);
        let chunk_address = address.wrapping_add((chunk_start * size as usize) as u32);
        write_ar(xdm, base, chunk_address)?;

        for i in 0..chunk_len {
            let offset = (chunk_start + i) * size as usize;
            let value = read_sized(src, offset, size);
            write_ar(xdm, scratch, value)?;
            xdm.execute(store_instruction(size, base, scratch, i as u8))?;
        }
    }

    Ok(())
}

/// Reads an arbitrary byte range, word-aligning the underlying accesses
/// (instruction/IRAM fetch may require word-sized transfers).
pub fn read_buffer(xdm: &mut Xdm, cache: &mut RegisterCache, address: u64, buf: &mut [u8]) -> Result<(), Error> {
    if buf.is_empty() {
        return Ok(());
    }
    let address = u32::try_from(address).map_err(|_| Error::Syntax("address out of range for a 32-bit target"))?;

    let aligned_start = address & !0b11;
    let aligned_end = (address + buf.len() as u32 + 3) & !0b11;
    let word_count = ((aligned_end - aligned_start) / 4) as usize;

    let mut words = vec![0u8; word_count * 4];
    read_elements(xdm, cache, aligned_start, 4, word_count, &mut words)?;

    let skip = (address - aligned_start) as usize;
    buf.copy_from_slice(&words[skip..skip + buf.len()]);
    Ok(())
}

/// Writes an arbitrary byte range, performing read-modify-write on the
/// partial head/tail words so bytes outside `buf` are left untouched.
pub fn write_buffer(xdm: &mut Xdm, cache: &mut RegisterCache, address: u64, buf: &[u8]) -> Result<(), Error> {
    if buf.is_empty() {
        return Ok(());
    }
    let address = u32::try_from(address).map_err(|_| Error::Syntax("address out of range for a 32-bit target"))?;

    let aligned_start = address & !0b11;
    let aligned_end = (address + buf.len() as u32 + 3) & !0b11;
    let word_count = ((aligned_end - aligned_start) / 4) as usize;

    let mut words = vec![0u8; word_count * 4];
    // Only the boundary words need a prior read; re-reading the whole
    // aligned range is simpler and cheap relative to the round trips the
    // writes themselves already cost.
    read_elements(xdm, cache, aligned_start, 4, word_count, &mut words)?;

    let skip = (address - aligned_start) as usize;
    words[skip..skip + buf.len()].copy_from_slice(buf);

    write_elements(xdm, cache, aligned_start, 4, word_count, &words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_size() {
        assert!(validate(0, 3, 1).is_err());
    }

    #[test]
    fn validate_rejects_zero_count() {
        assert!(validate(0, 4, 0).is_err());
    }

    #[test]
    fn validate_rejects_misaligned_word_access() {
        assert!(validate(2, 4, 1).is_err());
        assert!(validate(4, 4, 1).is_ok());
    }

    #[test]
    fn validate_allows_any_byte_address_for_byte_access() {
        assert!(validate(1, 1, 1).is_ok());
    }
}
