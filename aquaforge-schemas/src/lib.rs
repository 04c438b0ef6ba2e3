//! Shared data model for the AquaForge calculation engine.
//!
//! Everything here is plain data: the engine in `aquaforge-core` reads these types and
//! returns new values, and the host application decides what to persist.

pub mod batch;
pub mod biometric;
pub mod environment;
pub mod feeding;
pub mod file_formats;
pub mod species;
