//! Fallback backend built from pure-Rust decoders and libwebp.
//!
//! Needs no system libraries, so it is always available unless the libwebp
//! self-test fails.

mod encoder;

pub use encoder::BasicEncoder;
