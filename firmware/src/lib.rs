//! Serial drive controller firmware for RP2040.
//!
//! Binds the platform-agnostic [`drive_core`] to the RP2040 peripherals.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Receives register commands over UART (115200 baud, 8N1)
//! 2. Drives the propulsion ESC and the steering servo with 50 Hz PWM
//! 3. Measures wheel speed from a hall sensor
//! 4. Streams a telemetry frame back every 10 ms
//!
//! # Hardware Configuration
//!
//! | Function   | GPIO | Description |
//! |------------|------|-------------|
//! | UART1 TX   | 8    | Telemetry and read replies |
//! | UART1 RX   | 9    | Commands |
//! | ESC        | 2    | PWM slice 1 A |
//! | Servo      | 4    | PWM slice 2 A |
//! | Wheel      | 7    | PWM slice 3 B, edge counter |
//!
//! PWM slice 4 is reserved for the microsecond time base.
//!
//! # Architecture
//!
//! - **High-priority executor** (`SWI_IRQ_1`): UART receive and transmit DMA
//!   tasks, see [`serial`]
//! - **`PWM_IRQ_WRAP`**: time base overflow, see [`timebase`]
//! - **Thread executor**: the foreground loop, which polls
//!   [`Controller`](drive_core::Controller) and yields between passes
//!
//! # Modules
//!
//! - [`serial`]: transport DMA tasks ([`Transport`], [`SignalTxDriver`])
//! - [`outputs`]: ESC and servo PWM
//! - [`timebase`]: microsecond clock ([`timebase::CLOCK`])
//! - [`wheel`]: wheel pulse counter ([`WheelCounter`])
//! - [`imu`]: default inertial sensor ([`StaticImu`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

pub use drive_core::{Controller, DriveConfig, Hardware};

pub mod imu;
pub mod outputs;
pub mod serial;
pub mod timebase;
pub mod wheel;

pub use imu::StaticImu;
pub use serial::{SignalTxDriver, Transport};
pub use wheel::WheelCounter;
