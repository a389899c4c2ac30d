//! parla-core — Pure types, locale bundles, and transcript markup.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod highlight;
pub mod locale;
pub mod types;
