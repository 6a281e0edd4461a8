/*
 * Interrupt-Safe Locking
 *
 * A spin mutex that also masks IRQs for as long as it is held. Data shared
 * between the interrupt dispatcher and ordinary code must sit behind one of
 * these: on a single core a plain spin lock taken by the main loop would
 * deadlock the moment an IRQ handler tried to take it too.
 */

use core::ops::{Deref, DerefMut};
use spin::{Mutex, MutexGuard};

use crate::cpu::{self, IrqState};

pub struct IrqMutex<T> {
	inner: Mutex<T>,
}

/*
 * struct IrqMutexGuard - Held lock plus the mask state to restore
 *
 * The inner guard is released before IRQs are unmasked again.
 */
pub struct IrqMutexGuard<'a, T> {
	guard: Option<MutexGuard<'a, T>>,
	saved: IrqState,
}

impl<T> IrqMutex<T> {
	pub const fn new(data: T) -> Self {
		IrqMutex {
			inner: Mutex::new(data),
		}
	}

	/*
	 * lock - Mask IRQs, then acquire the lock
	 */
	pub fn lock(&self) -> IrqMutexGuard<'_, T> {
		let saved = cpu::mask_irq();
		IrqMutexGuard {
			guard: Some(self.inner.lock()),
			saved,
		}
	}

	/*
	 * try_lock - Acquire without spinning
	 *
	 * Restores the mask state and returns None if the lock is taken.
	 */
	pub fn try_lock(&self) -> Option<IrqMutexGuard<'_, T>> {
		let saved = cpu::mask_irq();
		match self.inner.try_lock() {
			Some(guard) => Some(IrqMutexGuard {
				guard: Some(guard),
				saved,
			}),
			None => {
				cpu::restore(saved);
				None
			}
		}
	}

	pub fn is_locked(&self) -> bool {
		self.inner.is_locked()
	}
}

impl<T> Deref for IrqMutexGuard<'_, T> {
	type Target = T;

	fn deref(&self) -> &T {
		match &self.guard {
			Some(guard) => guard,
			None => unreachable!("guard used after release"),
		}
	}
}

impl<T> DerefMut for IrqMutexGuard<'_, T> {
	fn deref_mut(&mut self) -> &mut T {
		match &mut self.guard {
			Some(guard) => guard,
			None => unreachable!("guard used after release"),
		}
	}
}

impl<T> Drop for IrqMutexGuard<'_, T> {
	fn drop(&mut self) {
		drop(self.guard.take());
		cpu::restore(self.saved);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// Only test in this crate that touches the emulated mask bits.
	#[test]
	fn lock_masks_irqs_and_restores_on_release() {
		let m = IrqMutex::new(5u32);

		cpu::enable_interrupts();
		{
			let mut outer = m.lock();
			assert!(!cpu::interrupts_enabled());
			*outer += 1;

			assert!(m.try_lock().is_none());
			assert!(!cpu::interrupts_enabled());
		}
		assert!(cpu::interrupts_enabled());
		assert!(!m.is_locked());
		assert_eq!(*m.lock(), 6);
		assert!(cpu::interrupts_enabled());

		cpu::disable_interrupts();
		{
			let _g = m.lock();
		}
		assert!(!cpu::interrupts_enabled());

		let nested = cpu::without_interrupts(|| {
			let _g = m.lock();
			cpu::interrupts_enabled()
		});
		assert!(!nested);
	}
}
