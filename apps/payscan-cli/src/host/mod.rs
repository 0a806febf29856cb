//! # Host Adapters
//!
//! Concrete implementations of the scanner's collaborator traits.
//!
//! ```text
//! host/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── decoder.rs  ◄─── RqrrDecoder (Decoder)
//! ├── replay.rs   ◄─── ReplayCamera (CameraBackend) + ReplayDevice
//! └── console.rs  ◄─── ConsoleSink (NotificationSink)
//! ```

pub mod console;
pub mod decoder;
pub mod replay;

pub use console::ConsoleSink;
pub use decoder::RqrrDecoder;
pub use replay::{ReplayCamera, ReplayDevice};
