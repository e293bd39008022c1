//! Drawing surfaces for the clock face
//!
//! - **layout**: text parts and theme signals (the live face)
//! - **markup**: textblock markup parsing
//! - **canvas**: RGBA capture buffer and PNG encoding
//! - **font**: fontdue rasterisation

mod canvas;
mod font;
mod layout;
pub mod markup;

pub use canvas::Canvas;
pub use font::{FontRenderer, TextExtent};
pub use layout::{ClockLayout, DisplaySurface};
