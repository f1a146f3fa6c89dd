//! `scanfit` library crate.
//!
//! The binary (`scanfit`) is a thin wrapper around this library so that:
//!
//! - everything from parsing to fitting is testable in-process
//! - the pieces can be reused from batch reduction scripts or notebooks
//! - the module layout stays visible in one place

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod specfile;
