//! # CLI Commands
//!
//! ```text
//! commands/
//! ├── mod.rs     ◄─── You are here (exports)
//! ├── image.rs   ◄─── payscan image <path>   (gallery mode)
//! ├── camera.rs  ◄─── payscan camera <dir>   (camera mode, replayed)
//! └── config.rs  ◄─── payscan config         (show / save settings)
//! ```
//!
//! Every command builds its own scanner through [`crate::build_scanner`],
//! so the notification sink and form wiring stay identical across modes.

pub mod camera;
pub mod config;
pub mod image;
