//! Terminal emulator core.
//!
//! This crate holds the state that sits between a pty byte stream and a
//! renderer: a [`Screen`] of styled cells with scrollback and selection,
//! a [`Vte`] that drives the `vtsm` escape-sequence machine and mutates
//! the screen, and the input translators that turn keys and mouse events
//! back into bytes for the child process.
//!
//! Nothing here performs I/O; the embedding layer owns the pty and the
//! event loop and feeds bytes through [`Vte::input`].

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;

pub mod cell;
pub mod charset;
pub mod color;
pub mod line;
pub mod screen;
pub mod selection;
pub mod snapshot;
pub mod symbols;
pub mod utf8;
pub mod vte;

#[cfg(test)]
mod test;

pub use crate::cell::{AttrFlags, Cell, CellAttributes};
pub use crate::color::{ColorIndex, Palette};
pub use crate::screen::{Screen, ScreenFlags};
pub use crate::symbols::{Symbol, SymbolTable, UCS4_MAX};
pub use crate::vte::{KeyModifiers, Keysym, MouseProto, Vte, VteHost};

/// Monotonic damage stamp.  Zero is reserved: a draw pass reports age 0
/// exactly once after counter overflow to demand a full repaint.
pub type Age = u32;

use thiserror::Error;

/// Errors surfaced by the core.  Parse-level protocol violations are not
/// represented here; those resync to ground and at most log.
#[derive(Debug, Error)]
pub enum TermError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("malformed data: {0}")]
    Protocol(&'static str),

    #[error("peer closed the connection")]
    BrokenConnection,
}

pub type Result<T> = std::result::Result<T, TermError>;
