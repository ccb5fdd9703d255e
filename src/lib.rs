//! Win32 OpenGL 4.6 core profile bring-up: a two-pass window/context
//! bootstrap and a typed function table resolved against the result.

pub mod bootstrap;
pub mod config;
pub mod gl;
pub mod logging;
pub mod platform;
pub mod resolver;
pub mod surface;
pub mod wgl;

#[cfg(windows)]
pub mod win32;

#[cfg(test)]
mod testing;

pub use bootstrap::{bootstrap, BootstrapError, BootstrapErrorKind, Stage};
pub use config::Config;
pub use surface::GlSurface;
