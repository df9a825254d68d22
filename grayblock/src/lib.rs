// THEORY:
// This file is the main entry point for the `grayblock` library crate.
// It defines the public API exposed to external consumers (like the
// `grayblock_server` upload service).
//
// The primary export is the `Pixelator` and its configuration
// (`PixelationConfig`, `DownscaleFilter`, `ToneMode`), the high-level
// interface to the whole engine. The building blocks in `core_modules`
// stay public for callers that need a single stage, but most users only
// ever call `Pixelator::process` or `pipeline::transform`.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use core_modules::codec::PNG_CONTENT_TYPE;
pub use error::PixelateError;
pub use pipeline::{
    DEFAULT_BLOCK_SIZE, DownscaleFilter, PixelationConfig, Pixelator, ToneMode, transform,
};
