//! texbatch library: application logic for the concurrent LaTeX project builder.

pub mod app;
pub mod config;
pub mod errors;
