use hal::cpu;
use hal::gpio::OutputPin;

/* Indicator half-period while halted; slow enough to see on an LED */
const BLINK_CYCLES: u32 = 500_000;

//Never returns: blink @indicator forever with interrupts masked
pub fn halt_with(indicator: &mut impl OutputPin) -> ! {
	cpu::disable_interrupts();
	cpu::disable_fiq();
	loop {
		indicator.toggle();
		cpu::spin_cycles(BLINK_CYCLES);
	}
}
