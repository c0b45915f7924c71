//! Step definitions for job runner scenarios.

pub mod world;

mod given;
mod then;
mod when;
