/*
 * Memory-Mapped I/O
 *
 * Volatile 32-bit register access. Every peripheral on the BCM283x is
 * word-addressed, so these are the only accessors drivers need.
 */

/*
 * read32 - Read a 32-bit device register
 * @addr: Absolute register address
 *
 * Returns the value currently held by the register.
 */
#[inline(always)]
pub unsafe fn read32(addr: usize) -> u32 {
	unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/*
 * write32 - Write a 32-bit device register
 * @addr: Absolute register address
 * @value: Value to store
 */
#[inline(always)]
pub unsafe fn write32(addr: usize, value: u32) {
	unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/*
 * modify32 - Read-modify-write a 32-bit device register
 * @addr: Absolute register address
 * @f: Maps the current value to the value written back
 */
#[inline(always)]
pub unsafe fn modify32(addr: usize, f: impl FnOnce(u32) -> u32) {
	unsafe { write32(addr, f(read32(addr))) }
}

/*
 * Mmio - Register window starting at a fixed base address
 *
 * Drivers hold one of these and address registers by byte offset.
 * Tests point the base at an ordinary word array.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mmio {
	base: usize,
}

impl Mmio {
	/*
	 * new - Create a register window
	 * @base: Address of the first register
	 *
	 * The caller guarantees that `base` maps a device (or memory) block large
	 * enough for every offset the owning driver uses, for as long as the
	 * window is alive.
	 */
	pub const unsafe fn new(base: usize) -> Self {
		Mmio { base }
	}

	pub const fn base(&self) -> usize {
		self.base
	}

	#[inline(always)]
	pub fn read(&self, offset: usize) -> u32 {
		unsafe { read32(self.base + offset) }
	}

	#[inline(always)]
	pub fn write(&self, offset: usize, value: u32) {
		unsafe { write32(self.base + offset, value) }
	}

	#[inline(always)]
	pub fn modify(&self, offset: usize, f: impl FnOnce(u32) -> u32) {
		unsafe { modify32(self.base + offset, f) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn window_reads_and_writes_by_offset() {
		let mut regs = [0u32; 4];
		let mmio = unsafe { Mmio::new(regs.as_mut_ptr() as usize) };

		mmio.write(0x8, 0xDEAD_BEEF);
		mmio.modify(0x8, |v| v & 0xFFFF);

		assert_eq!(mmio.read(0x8), 0xBEEF);
		assert_eq!(mmio.read(0x0), 0);
	}
}
