//! Platform-agnostic core of the serial drive controller.
//!
//! This crate holds everything between the UART and the PWM pins without
//! depending on any particular microcontroller. It builds for `no_std`
//! targets and runs its tests on the host.
//!
//! # Overview
//!
//! - [`ring`]: power-of-two byte ring buffer ([`RingBuffer`])
//! - [`transport`]: interrupt/DMA-fed serial transport ([`SerialTransport`])
//!   and the [`Link`]/[`TxDriver`] seams
//! - [`parser`]: byte-level command frame parser ([`CommandParser`])
//! - [`registers`]: shadow registers ([`ShadowRegisters`])
//! - [`command`]: command reader, dispatch and read replies ([`CommandReader`])
//! - [`motor`]: ESC state machine with brake sequencing ([`Motor`])
//! - [`servo`]: steering servo ([`SteeringServo`])
//! - [`speedometer`]: wheel speed ([`Speedometer`])
//! - [`clock`]: 32-bit microsecond time base ([`MicrosClock`])
//! - [`controller`]: foreground loop, failsafe and periodic tasks
//!   ([`Controller`])
//! - [`config`]: vehicle constants and buffer sizes
//!
//! # Data flow
//!
//! ```text
//! UART RX DMA -> SerialTransport -> CommandParser -> ShadowRegisters
//!                                                        |
//!                     Controller (1 ms motor, 100 ms speed, 10 ms telemetry)
//!                        |                |                   |
//!                      Motor       SteeringServo        TelemetryFrame
//!                        |                |                   |
//!                       PWM              PWM        SerialTransport -> UART TX DMA
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and log output
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must stay first so the log macros are visible to the modules below.
mod fmt;

pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
mod error;
pub mod imu;
pub mod motor;
pub mod parser;
pub mod registers;
pub mod ring;
pub mod servo;
pub mod speedometer;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod mock;

pub use clock::{MicrosClock, TickCounter};
pub use command::{CommandReader, PendingCommands};
pub use config::{
    ControllerConfig, DriveConfig, MotorConfig, PulseRange, ServoConfig, SpeedometerConfig,
    RX_RING_SIZE, RX_STAGING_SIZE, TX_CHUNK_MAX, TX_RING_SIZE,
};
pub use controller::{Controller, Hardware, PeriodicTask};
pub use error::TransportError;
pub use imu::{ImuSample, InertialSensor};
pub use motor::{speed_to_duty, Motor, MotorContext, MotorState};
pub use parser::{CommandParser, ParserState};
pub use registers::{CommandKind, ShadowRegisters};
pub use ring::RingBuffer;
pub use servo::SteeringServo;
pub use speedometer::{PulseCounter, Speedometer};
pub use transport::{Link, SerialTransport, TxDriver};

// Re-export the wire formats for convenience
pub use drive_proto::{CommandFrame, Register, TelemetryFrame};
