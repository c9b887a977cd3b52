//! Z-Wave serial API encoding and decoding in pure Rust.
//!
//! `rustzw-core` provides zero-copy encoding and decoding of the frames
//! exchanged with a Z-Wave controller stick, the bodies of the serial-API
//! messages that carry application commands, the command class registry, and
//! the per-class payload codecs. It performs no I/O.
//!
//! # Feature flags
//!
//! - **`std`** (default) enables `std::error::Error` implementations.
//! - **`serde`** derives `Serialize`/`Deserialize` on core types.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Command class identifiers, the descriptor registry, and per-class payload codecs.
pub mod command_class;
/// Zero-copy reader/writer over byte buffers.
pub mod encoding;
/// Error types for encoding and decoding operations.
pub mod error;
/// Serial frame layout, checksum, and single-byte control tokens.
pub mod frame;
/// Incremental deframer with resynchronization for an inbound byte stream.
pub mod frame_buffer;
/// Bodies of the serial-API messages that address nodes.
pub mod serial_api;

pub use command_class::{CommandClass, CommandClassDescriptor, HandlerKind, Registry};
pub use error::{DecodeError, EncodeError};
pub use frame::{Frame, MessageClass, MessageType, OwnedFrame};
pub use frame_buffer::{FrameBuffer, Inbound};

/// Node identifier assigned by the controller (1..=232 on a classic network).
pub type NodeId = u8;
