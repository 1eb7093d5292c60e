//! Report generation.
//!
//! Renders a [`CepsResult`] as Markdown or JSON.
//!
//! [`CepsResult`]: crate::models::CepsResult

pub mod generator;

pub use generator::*;
