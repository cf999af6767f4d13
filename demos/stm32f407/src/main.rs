//! Example: Continuous environmental monitoring with the BME280 on an STM32F407.
//!
//! This example demonstrates:
//! 1. **Initialization**: Setting up I2C and the BME280 driver.
//! 2. **Measurement Loop**: Reading a compensated sample every 500ms while the
//!    sensor converts continuously in normal mode.
//! 3. **Formatting**: Logging temperature, pressure (kPa) and humidity via defmt.

#![no_main]
#![no_std]
#![deny(unsafe_code)]

use bme280_driver::{Bme280, ADDR_SECONDARY};
use defmt_rtt as _;
use panic_probe as _;
use stm32f4xx_hal::{self as hal, prelude::*};

#[cortex_m_rt::entry]
fn main() -> ! {
    // --- 1. Hardware Setup ---
    let dp = hal::pac::Peripherals::take().unwrap();
    let clock_cfg = hal::rcc::Config::default().sysclk(168.MHz());
    let mut rcc = dp.RCC.freeze(clock_cfg);

    // Setup I2C1 (SCL on PB6, SDA on PB7)
    let gpiob = dp.GPIOB.split(&mut rcc);
    let scl = gpiob.pb6.into_open_drain_output();
    let sda = gpiob.pb7.into_open_drain_output();

    let i2c = hal::i2c::I2c1::new(
        dp.I2C1,
        (scl, sda),
        hal::i2c::Mode::Standard {
            frequency: 100.kHz().into(),
        },
        &mut rcc,
    );

    // Delay provider (TIM6) for start-up/reset timing and loop pacing
    let mut delay = dp.TIM6.delay_us(&mut rcc);

    // --- 2. Driver Initialization ---
    // Most breakout boards pull SDO high (0x77)
    let bme280 = Bme280::new(i2c, ADDR_SECONDARY);

    // Verifies the chip id, resets, reads calibration and starts normal mode
    let mut bme280 = bme280
        .init(&mut delay)
        .expect("Failed to initialize BME280");

    // --- 3. Measurement Loop ---
    loop {
        let data = bme280.read_new_data().expect("Failed to read data");

        // 0.0 Pa means the calibration could not be applied
        if data.pres.0 == 0.0 {
            defmt::warn!("pressure compensation degenerate, check calibration");
        }

        defmt::println!(
            "T = {=f64} C  p = {=f64} kPa  H = {=f64} %",
            data.temp.0,
            data.pres.as_kpa(),
            data.hum.0
        );

        delay.delay_ms(500);
    }
}
