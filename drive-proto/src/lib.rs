//! Wire formats for the serial drive controller.
//!
//! This crate provides everything needed to talk to the controller over its
//! serial link, from either end:
//!
//! - **Checksum**: [`crc8()`] (CRC-8/SMBUS: poly 0x07,
//!   init 0x00, no reflection, no final XOR)
//! - **Command frames**: [`CommandFrame`] encode/decode, [`Register`] map
//! - **Telemetry**: [`TelemetryFrame`] encode/decode
//! - **Host decoding**: [`LinkDecoder`] splits a device stream into
//!   [`LinkMessage`]s
//!
//! # Command Frame
//!
//! ```text
//! [ HDR | D0 | D1 | CRC8 ]
//! ```
//!
//! - `HDR` bit 7 set for a read request, bits 6..0 the register address
//! - write: `D0`/`D1` carry a little-endian `i16`
//! - read: `D0` is the burst count, `D1` is a flags byte
//! - `CRC8` covers `HDR`, `D0`, `D1`
//!
//! Read requests are answered with one write frame per register.
//!
//! # Telemetry Frame
//!
//! 37 bytes, little-endian: `0xAA 0x55`, type `0x01`, length `32`, a `u32`
//! millisecond timestamp, seven `f32` (acceleration xyz, angular rate xyz,
//! speed) and a CRC-8 over everything before it.
//!
//! # Example
//!
//! ```
//! use drive_proto::{CommandFrame, Register};
//!
//! let raw = CommandFrame::write(Register::Motor.address(), 500).encode();
//! assert_eq!(raw, [0x01, 0xF4, 0x01, 0x2C]);
//!
//! let frame = CommandFrame::decode(&raw).unwrap();
//! assert_eq!(frame.value(), 500);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod crc;
mod error;
pub mod frame;
pub mod link;
pub mod register;
pub mod telemetry;

pub use crc::crc8;
pub use error::{DecodeError, FrameError};
pub use frame::{make_header, Access, CommandFrame, FRAME_LEN, READ_FLAG};
pub use link::{LinkDecoder, LinkMessage};
pub use register::{Register, MAX_ADDRESS};
pub use telemetry::{TelemetryFrame, TELEMETRY_FRAME_LEN};
