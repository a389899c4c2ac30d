//! parla-lib — Speech console engine.
//!
//! Synthesis and recognition controllers, the capability seams they drive,
//! the engine adapters behind those seams, console assembly, and the HTTP
//! API. Depends on parla-core for pure types and transcript markup.

pub mod capability;
pub mod console;
pub mod kokoro;
pub mod presenter;
pub mod recognition;
pub mod server;
pub mod sidecar;
pub mod synthesis;

// Re-export parla-core for convenience
pub use parla_core;
