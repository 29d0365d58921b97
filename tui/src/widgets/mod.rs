//! Optional widgets layered on a [`crate::TuiContext`].
//!
//! Each widget is a plain state machine: the embedder routes input
//! events at it and calls its `draw` with the context when refreshing.
//! Widgets never take the context hostage; dropping one leaves the
//! screen content to be repainted by whoever owns the context next.
//! The set compiled in is fixed at build time through cargo features.

#[cfg(feature = "widget-listwnd")]
pub mod listwnd;

#[cfg(feature = "widget-readline")]
pub mod readline;
