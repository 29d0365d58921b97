//! The consumer-facing contract: events delivered by the host and the
//! handler table a client implements against them.

use atui_term::vte::{KeyModifiers, Keysym};
use std::os::unix::io::RawFd;

/// Kinds of sub-surfaces a context can ask its host for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SubwindowType {
    /// A full nested text surface.
    Tui,
    /// Transient surface for menus and completion popups.
    Popup,
    /// Surface that will be handed over to another process.
    Handover,
    /// Debug inspection surface.
    Debug,
    /// Accessibility view (screen-reader friendly projection).
    Accessibility,
}

/// Reset severity delivered with [`Event::Reset`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResetLevel {
    /// Soft: drop transient state.
    Soft,
    /// Hard: rebuild everything derived from the connection.
    Hard,
}

/// Execution state transitions of the surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExecState {
    Running,
    Suspended,
    Terminating,
}

/// Structured records the host queues on a context.  These mirror the
/// event channel of the display server connection; the transport
/// itself lives outside this crate.
#[derive(Debug)]
pub enum Event {
    Key {
        sym: Keysym,
        mods: KeyModifiers,
        codepoint: Option<u32>,
    },
    Utf8(Vec<u8>),
    MouseMotion {
        x: usize,
        y: usize,
        mods: KeyModifiers,
    },
    MouseButton {
        index: u8,
        press: bool,
        x: usize,
        y: usize,
        mods: KeyModifiers,
    },
    /// A label binding fired (rising edge when `active`).
    Label {
        label: String,
        active: bool,
    },
    Resize {
        cols: usize,
        rows: usize,
    },
    Paste(Vec<u8>),
    Reset(ResetLevel),
    /// Positioning hint: latitude, longitude, elevation.
    Geohint(f32, f32, f32),
    /// State transfer descriptor.  The fd is owned by the receiving
    /// callback and must be closed there.
    State {
        input: bool,
        fd: RawFd,
    },
    /// Binary chunk transfer descriptor, same ownership rule.
    Bchunk {
        input: bool,
        extension: String,
        fd: RawFd,
    },
    /// Answer to a sub-window request; `None` means the host refused.
    Subwindow {
        kind: SubwindowType,
        id: u32,
        accepted: bool,
    },
    Visibility {
        visible: bool,
        focused: bool,
    },
    ExecState(ExecState),
    /// Free-form command line forwarded from the host shell.
    CliCommand(Vec<String>),
}

/// Handler table.  Every method has a reasonable default so clients
/// implement only what they care about; returning `false` from the
/// input handlers routes the event into the built-in behavior
/// (terminal write-through, scrollback bindings, selection).
#[allow(unused_variables)]
pub trait TuiHandlers {
    /// Enumerate input labels; called with an increasing index until
    /// `None` is returned.
    fn query_label(&mut self, index: usize) -> Option<crate::labels::LabelHint> {
        None
    }

    /// A label fired.  Return true when consumed.
    fn input_label(&mut self, label: &str, active: bool) -> bool {
        false
    }

    /// Keyboard input.  Return true when consumed; unconsumed keys are
    /// translated for the child process.
    fn input_key(&mut self, sym: Keysym, mods: KeyModifiers, codepoint: Option<u32>) -> bool {
        false
    }

    /// Committed text input.  Return true when consumed.
    fn input_utf8(&mut self, text: &[u8]) -> bool {
        false
    }

    fn input_mouse_motion(&mut self, x: usize, y: usize, mods: KeyModifiers) {}

    fn input_mouse_button(&mut self, x: usize, y: usize, index: u8, press: bool, mods: KeyModifiers) {
    }

    fn resized(&mut self, cols: usize, rows: usize) {}

    fn reset(&mut self, level: ResetLevel) {}

    fn geohint(&mut self, lat: f32, long: f32, elev: f32) {}

    /// State save/restore stream.  The fd belongs to this call; close
    /// it before returning or dup it to keep it.
    fn state(&mut self, input: bool, fd: RawFd) {
        unsafe {
            libc::close(fd);
        }
    }

    /// Binary chunk stream, same descriptor discipline as `state`.
    fn bchunk(&mut self, input: bool, extension: &str, fd: RawFd) {
        unsafe {
            libc::close(fd);
        }
    }

    /// A sub-window request was answered.  `accepted == false` must be
    /// treated as a plain no-op by clients.
    fn subwindow(&mut self, kind: SubwindowType, id: u32, accepted: bool) {}

    /// Glyph substitution hook over a whole row; return true when any
    /// cell was rewritten.
    fn substitute(&mut self, row: &mut [atui_term::cell::Cell], y: usize) -> bool {
        false
    }

    /// Palette or color scheme changed under the context.
    fn recolor(&mut self) {}

    fn visibility(&mut self, visible: bool, focused: bool) {}

    fn exec_state(&mut self, state: ExecState) {}

    /// Command forwarded from a host-side command line.
    fn cli_command(&mut self, args: &[String]) {}

    /// Cooperative tick while the loop is otherwise idle.
    fn tick(&mut self) {}
}

/// A handler table with every default, for contexts driven purely by
/// the embedder.
pub struct NoHandlers;

impl TuiHandlers for NoHandlers {}
