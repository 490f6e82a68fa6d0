//! Fits a logarithmic pricing curve `f(x) = a + b·ln(x + c)` through a handful of benchmark
//! (input, price) points by nonlinear least squares, then resolves displayed prices for
//! arbitrary inputs under one of several policies: straight off the curve, off the curve after
//! rounding the input up to a configured step, or from the nearest benchmark at or above the
//! input.

pub mod benchmark;
pub mod config;
pub mod csv;
pub mod curve;
pub mod display;
pub mod file;
pub mod fit;
pub mod linear;
pub mod opt;
pub mod print;
pub mod query;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
