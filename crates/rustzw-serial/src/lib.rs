#![allow(async_fn_in_trait)]

pub mod serial;
pub mod traits;

pub use serial::{SerialConfig, SerialTransport};
pub use traits::{Transport, TransportError};
