//! FBIP Wire Protocol - Binary packet format
//!
//! This crate implements the framing shared by the binary-family codecs:
//! - Fixed header (16 bytes, network byte order)
//! - Payload (`data_length` bytes, possibly zlib-compressed)
//! - CRC-32 of the payload, carried in the header

pub mod flags;
pub mod frame;
pub mod header;

pub use flags::*;
pub use frame::*;
pub use header::*;
