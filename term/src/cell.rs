//! Cells and their attributes.

use crate::symbols::Symbol;
use crate::Age;

bitflags! {
    /// Style bits carried by every cell.  `PROTECT` participates in the
    /// selective-erase paths rather than rendering.
    #[derive(Default)]
    pub struct AttrFlags: u8 {
        const BOLD          = 0x01;
        const UNDERLINE     = 0x02;
        const INVERSE       = 0x04;
        const ITALIC        = 0x08;
        const BLINK         = 0x10;
        const STRIKETHROUGH = 0x20;
        const PROTECT       = 0x40;
    }
}

/// Resolved attributes for one cell: RGB on both channels plus the style
/// bitmask.  Two records compare equal iff every field matches; the
/// damage tracker relies on that to skip no-op erases.
///
/// `custom_id` is an opaque byte the embedder may use to tag cells
/// (widget internals, semantic regions); the core only stores it.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct CellAttributes {
    pub fg: [u8; 3],
    pub bg: [u8; 3],
    pub flags: AttrFlags,
    pub custom_id: u8,
}

impl CellAttributes {
    pub fn new(fg: [u8; 3], bg: [u8; 3]) -> Self {
        CellAttributes {
            fg,
            bg,
            flags: AttrFlags::default(),
            custom_id: 0,
        }
    }

    #[inline]
    pub fn has(&self, flag: AttrFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set(&mut self, flag: AttrFlags, on: bool) -> &mut Self {
        self.flags.set(flag, on);
        self
    }
}

/// One character position.  `width == 0` marks the continuation column
/// of a wide glyph: its symbol content is meaningless to the renderer
/// but its age still advances with every overwrite.
///
/// `draw_ch` starts out equal to `ch` and may be rewritten by the
/// host's substitution pass without disturbing the logical content that
/// selection-copy and state save read from `ch`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Cell {
    pub ch: Symbol,
    pub draw_ch: Symbol,
    pub width: u8,
    pub attr: CellAttributes,
    pub age: Age,
}

impl Cell {
    pub fn blank(attr: CellAttributes, age: Age) -> Self {
        Cell {
            ch: 0,
            draw_ch: 0,
            width: 1,
            attr,
            age,
        }
    }

    /// Re-initialize in place to the blank state.
    pub fn init(&mut self, attr: &CellAttributes, age: Age) {
        self.ch = 0;
        self.draw_ch = 0;
        self.width = 1;
        self.attr = *attr;
        self.age = age;
    }
}
