//! Color palettes.
//!
//! A palette is an immutable table of 18 RGB entries: the 16 ANSI slots
//! plus the default foreground and background.  Contexts copy the table
//! they are constructed with; swapping in another one re-resolves every
//! indexed color and forces a repaint (handled by the vte layer).

/// Named slots into a [`Palette`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(usize)]
pub enum ColorIndex {
    Black = 0,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    LightGrey,
    DarkGrey,
    LightRed,
    LightGreen,
    LightYellow,
    LightBlue,
    LightMagenta,
    LightCyan,
    White,
    Foreground,
    Background,
}

pub const COLOR_NUM: usize = 18;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Palette {
    colors: [[u8; 3]; COLOR_NUM],
}

impl Palette {
    /// Look a palette up by its CLI name.  Unknown names fall back to
    /// the default table.
    pub fn named(name: &str) -> &'static Palette {
        match name {
            "solarized" => &SOLARIZED,
            "solarized-black" => &SOLARIZED_BLACK,
            "solarized-white" => &SOLARIZED_WHITE,
            _ => &DEFAULT,
        }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> [u8; 3] {
        self.colors[idx.min(COLOR_NUM - 1)]
    }

    #[inline]
    pub fn color(&self, idx: ColorIndex) -> [u8; 3] {
        self.colors[idx as usize]
    }

    pub fn set(&mut self, idx: usize, rgb: [u8; 3]) {
        if idx < COLOR_NUM {
            self.colors[idx] = rgb;
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        DEFAULT
    }
}

pub static DEFAULT: Palette = Palette {
    colors: [
        [0, 0, 0],       // black
        [205, 0, 0],     // red
        [0, 205, 0],     // green
        [205, 205, 0],   // yellow
        [0, 0, 238],     // blue
        [205, 0, 205],   // magenta
        [0, 205, 205],   // cyan
        [229, 229, 229], // light grey
        [127, 127, 127], // dark grey
        [255, 0, 0],     // light red
        [0, 255, 0],     // light green
        [255, 255, 0],   // light yellow
        [92, 92, 255],   // light blue
        [255, 0, 255],   // light magenta
        [0, 255, 255],   // light cyan
        [255, 255, 255], // white
        [229, 229, 229], // default foreground
        [0, 0, 0],       // default background
    ],
};

pub static SOLARIZED: Palette = Palette {
    colors: [
        [7, 54, 66],
        [220, 50, 47],
        [133, 153, 0],
        [181, 137, 0],
        [38, 139, 210],
        [211, 54, 130],
        [42, 161, 152],
        [238, 232, 213],
        [0, 43, 54],
        [203, 75, 22],
        [88, 110, 117],
        [101, 123, 131],
        [131, 148, 150],
        [108, 113, 196],
        [147, 161, 161],
        [253, 246, 227],
        [238, 232, 213],
        [7, 54, 66],
    ],
};

pub static SOLARIZED_BLACK: Palette = Palette {
    colors: [
        [0, 0, 0],
        [220, 50, 47],
        [133, 153, 0],
        [181, 137, 0],
        [38, 139, 210],
        [211, 54, 130],
        [42, 161, 152],
        [238, 232, 213],
        [0, 43, 54],
        [203, 75, 22],
        [88, 110, 117],
        [101, 123, 131],
        [131, 148, 150],
        [108, 113, 196],
        [147, 161, 161],
        [253, 246, 227],
        [238, 232, 213],
        [0, 0, 0],
    ],
};

pub static SOLARIZED_WHITE: Palette = Palette {
    colors: [
        [7, 54, 66],
        [220, 50, 47],
        [133, 153, 0],
        [181, 137, 0],
        [38, 139, 210],
        [211, 54, 130],
        [42, 161, 152],
        [238, 232, 213],
        [0, 43, 54],
        [203, 75, 22],
        [88, 110, 117],
        [101, 123, 131],
        [131, 148, 150],
        [108, 113, 196],
        [147, 161, 161],
        [253, 246, 227],
        [7, 54, 66],
        [238, 232, 213],
    ],
};

/// Resolve an xterm-256 index to RGB against a palette: the 16 palette
/// entries, the 6x6x6 cube, then the 24-step greyscale ramp.
pub fn xterm256(palette: &Palette, code: u8) -> [u8; 3] {
    const CUBE: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

    match code {
        0..=15 => palette.get(code as usize),
        16..=231 => {
            let c = code as usize - 16;
            let b = CUBE[c % 6];
            let g = CUBE[(c / 6) % 6];
            let r = CUBE[c / 36];
            [r, g, b]
        }
        232..=255 => {
            let v = (code as usize - 232) as u8 * 10 + 8;
            [v, v, v]
        }
    }
}
