// src/processing/libvips/mod.rs

//! Rich conversion backend via libvips-rs.
//!
//! Compiled only with the `vips` feature. Selected over the basic backend
//! whenever libvips initialises at startup.
//!
//! - [`RichEncoder`]: loads through libvips and implements the backend trait.
//! - `formats`: the fixed `webpsave` options.

mod executor;
mod formats;

pub use executor::RichEncoder;
