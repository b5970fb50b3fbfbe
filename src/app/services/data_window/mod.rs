//! Windowed access to the live dataset
//!
//! [`DataWindow`] owns the authoritative in-memory dataset and hands out
//! bounded views of it: a visible prefix grown chunk by chunk, a filtered and
//! sorted subset, and a downsampled chart series. Every operation is
//! synchronous; debouncing search input is left to the caller.
//!
//! - [`window`] - The window itself and its view operations
//! - [`sampling`] - Fixed-stride chart downsampling

pub mod sampling;
pub mod window;

#[cfg(test)]
pub mod tests;

pub use sampling::downsample;
pub use window::{ChunkLoad, DataWindow, SortDirection, SortKey, WindowSnapshot};
