use core::panic::PanicInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    // No task may queue another actuator frame past this point.
    cortex_m::interrupt::disable();
    defmt::error!("teleop panic: {}", defmt::Display2Format(info));
    cortex_m::asm::udf();
}
