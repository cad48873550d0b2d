//! Pure level assembly logic for shipgen.
//!
//! This crate turns a solved, abstract level layout into concrete geometric
//! facts: where doors sit, which hull tile goes on each exterior cell, and
//! which rooms are reachable from which. Functions take plain data and return
//! results, so everything here is unit-testable without threads, a solver, or
//! an engine.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`assembler`] | Layout → placement plan for the world builder |
//! | [`boundary`] | Rotation/mirror-aware hull tile pattern matching |
//! | [`connectivity`] | Monotonic reachability groups as doors open |
//! | [`direction`] | Cardinal directions, open-side flags, tile rotations |
//! | [`doors`] | Physical door placement on shared walls |
//! | [`layout`] | Solver data contract (parameters, squares, rooms, layouts) |
//! | [`metrics`] | Level quality measures (density, linearity, ...) |
//! | [`validation`] | Layout sanity checks (bounds, overlaps, door geometry) |

pub mod assembler;
pub mod boundary;
pub mod connectivity;
pub mod direction;
pub mod doors;
pub mod layout;
pub mod metrics;
pub mod validation;
