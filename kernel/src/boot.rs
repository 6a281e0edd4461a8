/*
 * Boot and exception glue
 *
 * The firmware loads the image at 0x8000 and jumps to _start in SVC mode
 * (HYP on newer Pi 2 firmware). _start leaves HYP if needed, points VBAR at
 * the exception table, gives each exception mode its own stack, clears BSS
 * and calls kernel_main.
 */

use hal::gpio::Led;
use vectors::traps::{self, Trap};

use crate::{FAST_IRQ, INTC, VECTORS};

#[cfg(all(target_arch = "arm", target_os = "none"))]
core::arch::global_asm!(
	r#"
	.section .text.boot, "ax"
	.global _start
_start:
	.arch_extension virt
	mrs r0, cpsr
	and r1, r0, #0x1F
	cmp r1, #0x1A
	bne 1f
	bic r0, r0, #0x1F
	orr r0, r0, #0xD3
	msr spsr_cxsf, r0
	adr lr, 1f
	msr elr_hyp, lr
	eret
1:
	ldr r0, =_vectors
	mcr p15, 0, r0, c12, c0, 0

	ldr r4, =__stack_top
	cps #0x12
	mov sp, r4
	sub r4, r4, #{irq_stack}
	cps #0x11
	mov sp, r4
	sub r4, r4, #{fiq_stack}
	cps #0x17
	mov sp, r4
	cps #0x1B
	mov sp, r4
	sub r4, r4, #{abort_stack}
	cps #0x13
	mov sp, r4

	ldr r0, =__bss_start
	ldr r1, =__bss_end
	mov r2, #0
2:
	cmp r0, r1
	strlo r2, [r0], #4
	blo 2b

	bl kernel_main
3:
	wfi
	b 3b

	.section .text.vectors, "ax"
	.balign 32
_vectors:
	b reset_stub
	b undefined_stub
	b svc_stub
	b prefetch_abort_stub
	b data_abort_stub
	b unused_stub
	b irq_stub
	b fiq_stub

reset_stub:
	mov r0, #0x00
	b trap_stub
undefined_stub:
	mov r0, #0x04
	b trap_stub
svc_stub:
	mov r0, #0x08
	b trap_stub
prefetch_abort_stub:
	mov r0, #0x0C
	b trap_stub
data_abort_stub:
	mov r0, #0x10
	b trap_stub
unused_stub:
	mov r0, #0x14
trap_stub:
	bl trap_entry
	b .

irq_stub:
	sub lr, lr, #4
	push {{r0-r3, r12, lr}}
	bl irq_entry
	ldmfd sp!, {{r0-r3, r12, pc}}^

fiq_stub:
	sub lr, lr, #4
	push {{r0-r3, r12, lr}}
	bl fiq_entry
	ldmfd sp!, {{r0-r3, r12, pc}}^
	"#,
	irq_stack = const IRQ_STACK_SIZE,
	fiq_stack = const FIQ_STACK_SIZE,
	abort_stack = const ABORT_STACK_SIZE,
);

/* Stacks are carved downwards from __stack_top; SVC gets what the linker
 * script leaves below them */
const IRQ_STACK_SIZE: u32 = 0x1000;
const FIQ_STACK_SIZE: u32 = 0x1000;
const ABORT_STACK_SIZE: u32 = 0x1000;

//IRQ vector, IRQs masked by the core for the duration
#[unsafe(no_mangle)]
extern "C" fn irq_entry() {
	VECTORS.dispatch(&INTC);
}

#[unsafe(no_mangle)]
extern "C" fn fiq_entry() {
	FAST_IRQ.fire();
}

/*
 * trap_entry - Every vector other than IRQ and FIQ
 * @offset: Vector table offset of the exception taken
 */
#[unsafe(no_mangle)]
extern "C" fn trap_entry(offset: u32) -> ! {
	let trap = Trap::from_vector_offset(offset).unwrap_or(Trap::Unused);
	traps::fatal(trap, &mut Led::activity())
}
