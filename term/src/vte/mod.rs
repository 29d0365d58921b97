//! Escape sequence dispatch: gives meaning to what `vtsm` categorizes.
//!
//! [`Vte`] owns the decoder front-end (UTF-8 / 8-bit / 7-bit), the SGR
//! pen, charset slots, the mouse-protocol state and the DECSC save
//! area.  It mutates a [`Screen`] and talks back to the child and the
//! embedder through [`VteHost`].

mod csi;
mod input;

pub use input::{KeyModifiers, Keysym};

use crate::cell::{AttrFlags, CellAttributes};
use crate::charset::{Charset, DESIGNATORS, UNICODE_LOWER, UNICODE_UPPER};
use crate::color::{ColorIndex, Palette, COLOR_NUM};
use crate::screen::{Screen, ScreenFlags};
use crate::symbols::{ucs4_width, Symbol};
use crate::utf8::{Utf8Machine, Utf8State};
use vtsm::{CsiArgs, CsiFlags, VtActor, VtParser};

bitflags! {
    #[derive(Default)]
    pub struct VteFlags: u32 {
        /// DEC cursor key mode (DECCKM).
        const CURSOR_KEY_MODE        = 0x0000_0001;
        /// DEC keypad application mode (DECKPAM).
        const KEYPAD_APPLICATION     = 0x0000_0002;
        /// Line-feed/new-line mode (LNM).
        const LINE_FEED_NEW_LINE     = 0x0000_0004;
        /// Treat input as Latin-1 instead of UTF-8.
        const MODE_8BIT              = 0x0000_0008;
        /// Mask the high bit off all input.
        const MODE_7BIT              = 0x0000_0010;
        /// Emit C1 controls as single 8-bit bytes.
        const USE_C1                 = 0x0000_0020;
        /// Keyboard action mode (KAM); keyboard is disabled.
        const KEYBOARD_ACTION        = 0x0000_0040;
        /// Insert/replace mode (IRM).
        const INSERT_REPLACE         = 0x0000_0080;
        /// Send-receive mode (SRM); set means local echo off.
        const SEND_RECEIVE           = 0x0000_0100;
        /// Text cursor enable (DECTCEM).
        const TEXT_CURSOR            = 0x0000_0200;
        /// Inverse video on the whole screen (DECSCNM).
        const INVERSE_SCREEN         = 0x0000_0400;
        /// Relative origin (DECOM).
        const ORIGIN_MODE            = 0x0000_0800;
        /// Auto-wrap (DECAWM).
        const AUTO_WRAP              = 0x0000_1000;
        /// Auto-repeat (DECARM); tracked, not enforced here.
        const AUTO_REPEAT            = 0x0000_2000;
        /// National replacement charsets (DECNRCM); tracked only.
        const NATIONAL_CHARSET       = 0x0000_4000;
        /// Background-color-erase: erased cells take the current pen.
        const BACKGROUND_COLOR_ERASE = 0x0000_8000;
        /// One-shot ESC prefix for Alt-modified input.
        const PREPEND_ESCAPE         = 0x0001_0000;
        /// Refuse alternate-screen switches.
        const TITE_INHIBIT           = 0x0002_0000;
        /// Bracketed paste.
        const PASTE_BRACKET          = 0x0004_0000;
    }
}

bitflags! {
    /// Mouse reporting state: which events report and in which
    /// encoding.  Exactly one encoding bit is active at a time.
    #[derive(Default)]
    pub struct MouseProto: u8 {
        const BUTTON = 0x01;
        const DRAG   = 0x02;
        const MOTION = 0x04;
        const SGR    = 0x08;
        const X10    = 0x10;
        const RXVT   = 0x20;
    }
}

impl MouseProto {
    pub(crate) const ENCODINGS: MouseProto = MouseProto::from_bits_truncate(
        MouseProto::SGR.bits() | MouseProto::X10.bits() | MouseProto::RXVT.bits(),
    );
}

/// DECSC/DECRC save set.
#[derive(Debug, Default, Copy, Clone)]
struct SavedState {
    cursor: (usize, usize),
    cattr: CellAttributes,
    faint: bool,
    c_fgcode: i32,
    c_bgcode: i32,
    gl: usize,
    gr: usize,
    mouse: MouseProto,
    wrap_mode: bool,
    origin_mode: bool,
}

/// Read-only view of parser internals for a debug side-channel.
#[derive(Debug)]
pub struct DebugState {
    pub state: &'static str,
    pub flags: VteFlags,
    pub mouse: MouseProto,
    pub buttons: u8,
}

/// What the terminal needs from its embedder: a sink towards the child
/// process and a handful of out-of-band notifications.
pub trait VteHost {
    /// Queue bytes for the child (the pty write path).
    fn write(&mut self, data: &[u8]);

    /// The client set a window title via OSC 0/1/2.
    fn set_title(&mut self, _title: &str) {}

    /// An OSC string the core does not interpret, with its truncation
    /// flag.  Kind prefix included.
    fn osc_string(&mut self, _data: &[u8], _truncated: bool) {}
}

pub struct Vte {
    parser: VtParser,
    utf8: Utf8Machine,

    pub(crate) flags: VteFlags,
    pub(crate) mstate: MouseProto,
    pub(crate) mbutton: u8,
    pub(crate) mouse_x: usize,
    pub(crate) mouse_y: usize,

    palette: Palette,
    palette_name: Option<String>,

    pub(crate) cattr: CellAttributes,
    pub(crate) def_attr: CellAttributes,
    /// Palette index of the pen color, or -1 when a direct RGB value is
    /// in effect.  Needed so palette swaps re-resolve indexed colors.
    pub(crate) c_fgcode: i32,
    pub(crate) c_bgcode: i32,
    d_fgcode: i32,
    d_bgcode: i32,
    pub(crate) faint: bool,

    g: [&'static Charset; 4],
    gl: usize,
    gr: usize,
    glt: Option<usize>,
    grt: Option<usize>,

    saved: SavedState,
    pub(crate) alt_cursor: (usize, usize),

    parse_cnt: u32,
}

impl Vte {
    pub fn new(palette: &Palette) -> Self {
        let mut vte = Vte {
            parser: VtParser::new(),
            utf8: Utf8Machine::new(),
            flags: VteFlags::default(),
            mstate: MouseProto::default(),
            mbutton: 0,
            mouse_x: 0,
            mouse_y: 0,
            palette: *palette,
            palette_name: None,
            cattr: CellAttributes::default(),
            def_attr: CellAttributes::default(),
            c_fgcode: ColorIndex::Foreground as i32,
            c_bgcode: ColorIndex::Background as i32,
            d_fgcode: ColorIndex::Foreground as i32,
            d_bgcode: ColorIndex::Background as i32,
            faint: false,
            g: [
                &UNICODE_LOWER,
                &UNICODE_UPPER,
                &UNICODE_LOWER,
                &UNICODE_UPPER,
            ],
            gl: 0,
            gr: 1,
            glt: None,
            grt: None,
            saved: SavedState::default(),
            alt_cursor: (0, 0),
            parse_cnt: 0,
        };
        vte.apply_palette();
        vte
    }

    /* ---- palette and colors ---- */

    fn apply_palette(&mut self) {
        self.def_attr.fg = self.palette.color(ColorIndex::Foreground);
        self.def_attr.bg = self.palette.color(ColorIndex::Background);
        self.d_fgcode = ColorIndex::Foreground as i32;
        self.d_bgcode = ColorIndex::Background as i32;
        self.to_rgb(true);
        self.cattr = self.def_attr;
        self.c_fgcode = self.d_fgcode;
        self.c_bgcode = self.d_bgcode;
    }

    /// Swap the whole palette by name.  Indexed colors re-resolve and
    /// the screen is erased to force a repaint in the new scheme.
    pub fn set_palette(&mut self, screen: &mut Screen, name: &str) {
        self.palette = *Palette::named(name);
        self.palette_name = Some(name.to_string());
        self.apply_palette();
        screen.set_def_attr(&self.def_attr);
        screen.erase_screen(false);
    }

    pub fn palette_name(&self) -> Option<&str> {
        self.palette_name.as_deref()
    }

    /// Override one palette slot.  Indexed colors re-resolve so a new
    /// default foreground/background takes effect immediately.
    pub fn set_color(&mut self, idx: usize, rgb: [u8; 3]) {
        if idx < COLOR_NUM {
            self.palette.set(idx, rgb);
            self.to_rgb(true);
            self.to_rgb(false);
        }
    }

    pub fn default_attr(&self) -> CellAttributes {
        self.def_attr
    }

    pub fn get_color(&self, idx: usize) -> [u8; 3] {
        self.palette.get(idx)
    }

    /// Resolve indexed color codes to RGB on the pen (or the default
    /// attr).  Bold promotes dark indexed foregrounds to their bright
    /// sibling; faint halves the channels.
    pub(crate) fn to_rgb(&mut self, defattr: bool) {
        let (fgc, bgc) = if defattr {
            (self.d_fgcode, self.d_bgcode)
        } else {
            (self.c_fgcode, self.c_bgcode)
        };

        let attr = if defattr {
            &mut self.def_attr
        } else {
            &mut self.cattr
        };

        if fgc >= 0 {
            let mut fgc = fgc as usize;
            if attr.has(AttrFlags::BOLD) && fgc < 8 {
                fgc += 8;
            }
            if fgc >= COLOR_NUM {
                fgc = ColorIndex::Foreground as usize;
            }
            attr.fg = self.palette.get(fgc);
            if self.faint && !defattr {
                attr.fg = [attr.fg[0] >> 1, attr.fg[1] >> 1, attr.fg[2] >> 1];
            }
        }

        if bgc >= 0 {
            let mut bgc = bgc as usize;
            if bgc >= COLOR_NUM {
                bgc = ColorIndex::Background as usize;
            }
            attr.bg = self.palette.get(bgc);
        }
    }

    /// Point the pen (or default) channel at a palette slot.
    pub(crate) fn set_indexed(&mut self, defattr: bool, fg: bool, code: i32) {
        let code = if code >= COLOR_NUM as i32 {
            ColorIndex::Foreground as i32
        } else {
            code
        };

        if defattr {
            if fg {
                self.d_fgcode = code;
            } else {
                self.d_bgcode = code;
            }
        } else if fg {
            self.c_fgcode = code;
        } else {
            self.c_bgcode = code;
        }

        if code < 0 {
            return;
        }

        let rgb = self.palette.get(code as usize);
        let attr = if defattr {
            &mut self.def_attr
        } else {
            &mut self.cattr
        };
        if fg {
            attr.fg = rgb;
        } else {
            attr.bg = rgb;
        }
    }

    /* ---- accessors ---- */

    pub fn flags(&self) -> VteFlags {
        self.flags
    }

    pub fn mouse_state(&self) -> MouseProto {
        self.mstate
    }

    pub fn cursor_visible(&self) -> bool {
        self.flags.contains(VteFlags::TEXT_CURSOR)
    }

    pub fn bracketed_paste(&self) -> bool {
        self.flags.contains(VteFlags::PASTE_BRACKET)
    }

    /// True while a sequence is half-parsed; a renderer may want to
    /// delay a frame for sequences split across reads.
    pub fn in_sequence(&self) -> bool {
        !self.parser.is_ground()
    }

    pub fn pen(&self) -> CellAttributes {
        self.cattr
    }

    pub fn debug_state(&self) -> DebugState {
        DebugState {
            state: self.parser.state().name(),
            flags: self.flags,
            mouse: self.mstate,
            buttons: self.mbutton,
        }
    }

    /* ---- reset ---- */

    fn reset_saved_state(&mut self) {
        self.saved = SavedState {
            cursor: (0, 0),
            cattr: self.def_attr,
            faint: false,
            c_fgcode: self.d_fgcode,
            c_bgcode: self.d_bgcode,
            gl: 0,
            gr: 1,
            mouse: MouseProto::default(),
            wrap_mode: true,
            origin_mode: false,
        };
        self.mbutton = 0;
        self.mouse_x = 0;
        self.mouse_y = 0;
    }

    /// Soft reset: everything back to power-on defaults without
    /// touching screen content.
    pub fn reset(&mut self, screen: &mut Screen) {
        self.flags = VteFlags::TEXT_CURSOR
            | VteFlags::AUTO_REPEAT
            | VteFlags::SEND_RECEIVE
            | VteFlags::AUTO_WRAP
            | VteFlags::BACKGROUND_COLOR_ERASE;
        self.mstate = MouseProto::default();

        screen.reset();
        screen.set_flags(ScreenFlags::AUTO_WRAP);

        self.utf8.reset();
        self.parser.reset();

        self.gl = 0;
        self.gr = 1;
        self.glt = None;
        self.grt = None;
        self.g = [
            &UNICODE_LOWER,
            &UNICODE_UPPER,
            &UNICODE_LOWER,
            &UNICODE_UPPER,
        ];

        self.cattr = self.def_attr;
        self.c_fgcode = self.d_fgcode;
        self.c_bgcode = self.d_bgcode;
        self.faint = false;
        self.to_rgb(false);
        screen.set_def_attr(&self.def_attr);

        self.reset_saved_state();
    }

    /// Hard reset (RIS): soft reset plus wiped content and history.
    pub fn hard_reset(&mut self, screen: &mut Screen) {
        self.reset(screen);
        screen.erase_screen(false);
        screen.clear_sb();
        screen.move_to(0, 0);
    }

    /* ---- input ---- */

    /// Feed bytes from the child into the state machine.  In the
    /// default mode a UTF-8 machine drives decoding; 8-bit mode maps
    /// bytes straight through as Latin-1, 7-bit mode masks the high
    /// bit (and logs, since a well-behaved peer never sends it).
    pub fn input(&mut self, data: &[u8], screen: &mut Screen, host: &mut dyn VteHost) {
        self.parse_cnt += 1;

        for &b in data {
            if self.flags.contains(VteFlags::MODE_7BIT) {
                if b & 0x80 != 0 {
                    log::debug!("8-bit byte 0x{:02x} from pty while in 7-bit mode", b);
                }
                self.parse_cp((b & 0x7f) as u32, screen, host);
            } else if self.flags.contains(VteFlags::MODE_8BIT) {
                self.parse_cp(b as u32, screen, host);
            } else {
                match self.utf8.feed(b) {
                    Utf8State::Accept | Utf8State::Reject => {
                        let cp = self.utf8.get();
                        self.parse_cp(cp, screen, host);
                    }
                    _ => {}
                }
            }
        }

        self.parse_cnt -= 1;
    }

    fn parse_cp(&mut self, cp: u32, screen: &mut Screen, host: &mut dyn VteHost) {
        let mut parser = std::mem::take(&mut self.parser);
        parser.advance(
            cp,
            &mut Performer {
                vte: self,
                screen,
                host,
            },
        );
        self.parser = parser;
    }

    /* ---- write-back ---- */

    /// Send bytes towards the child.  With send-receive mode off this
    /// is also a local echo: the data is re-parsed into our own screen
    /// first, unless we are already inside a parse (replies generated
    /// mid-sequence must not recurse).
    pub(crate) fn write(&mut self, data: &[u8], screen: &mut Screen, host: &mut dyn VteHost) {
        if self.parse_cnt == 0 && !self.flags.contains(VteFlags::SEND_RECEIVE) {
            if self.flags.contains(VteFlags::PREPEND_ESCAPE) {
                self.input(b"\x1b", screen, host);
            }
            self.input(data, screen, host);
        }

        if self.flags.contains(VteFlags::PREPEND_ESCAPE) {
            host.write(b"\x1b");
        }
        host.write(data);

        self.flags.remove(VteFlags::PREPEND_ESCAPE);
    }

    pub(crate) fn send_primary_da(&mut self, screen: &mut Screen, host: &mut dyn VteHost) {
        self.write(b"\x1b[?60;1;6;9;15c", screen, host);
    }

    /* ---- charset mapping ---- */

    /// Map a printable through GL/GR with single-shift handling.
    /// 0x20, 0x7F, 0xA0 and 0xFF map to themselves like everything
    /// above 0xFF.
    fn map_char(&mut self, cp: u32) -> u32 {
        match cp {
            0x21..=0x7e => {
                let table = match self.glt.take() {
                    Some(slot) => self.g[slot],
                    None => self.g[self.gl],
                };
                table[(cp - 0x20) as usize]
            }
            0xa1..=0xfe => {
                let table = match self.grt.take() {
                    Some(slot) => self.g[slot],
                    None => self.g[self.gr],
                };
                table[(cp - 0xa0) as usize]
            }
            _ => cp,
        }
    }

    fn set_charset(&mut self, flags: CsiFlags, set: &'static Charset) -> bool {
        if flags.contains(CsiFlags::POPEN) {
            self.g[0] = set;
        } else if flags.contains(CsiFlags::PCLOSE) {
            self.g[1] = set;
        } else if flags.contains(CsiFlags::MULT) {
            self.g[2] = set;
        } else if flags.contains(CsiFlags::PLUS) {
            self.g[3] = set;
        } else {
            return false;
        }
        true
    }
}

/// Bundles the vte state with the screen and host for the duration of
/// one parser step, so the `vtsm` actor callbacks can reach all three.
pub(crate) struct Performer<'a> {
    pub(crate) vte: &'a mut Vte,
    pub(crate) screen: &'a mut Screen,
    pub(crate) host: &'a mut dyn VteHost,
}

impl Performer<'_> {
    fn write_console(&mut self, sym: Symbol) {
        self.vte.to_rgb(false);
        let attr = self.vte.cattr;
        self.screen.write(sym, &attr);
    }

    fn do_print(&mut self, cp: u32) {
        let mapped = self.vte.map_char(cp);

        // zero-width input composes onto the previously written cell
        if ucs4_width(mapped) == 0 {
            self.screen.append_combining(mapped);
            return;
        }

        self.write_console(mapped);
    }

    fn do_execute(&mut self, ctrl: u32) {
        match ctrl {
            0x00 => {} // NUL, ignored on input
            0x05 => {
                // ENQ: answerback
                self.vte.write(b"\x06", self.screen, self.host);
            }
            0x07 => {} // BEL
            0x08 => self.screen.move_left(1),
            0x09 => self.screen.tab_right(1),
            0x0a | 0x0b | 0x0c => {
                if self.vte.flags.contains(VteFlags::LINE_FEED_NEW_LINE) {
                    self.screen.newline();
                } else {
                    self.screen.move_down(1, true);
                }
            }
            0x0d => self.screen.move_line_home(),
            0x0e => self.vte.gl = 1, // SO
            0x0f => self.vte.gl = 0, // SI
            0x11 | 0x13 => {} // XON/XOFF
            0x18 => {} // CAN; the state machine already aborted
            0x1a => {
                // SUB: abort and show an error symbol
                self.write_console(0xbf);
            }
            0x1b => {}
            0x1f => {}
            0x84 => self.screen.move_down(1, true), // IND
            0x85 => self.screen.newline(),          // NEL
            0x88 => self.screen.set_tabstop(),      // HTS
            0x8d => self.screen.move_up(1, true),   // RI
            0x8e => self.vte.glt = Some(2),         // SS2
            0x8f => self.vte.glt = Some(3),         // SS3
            0x9a => {
                // DECID
                self.vte.send_primary_da(self.screen, self.host);
            }
            0x9c => {} // ST
            _ => log::debug!("unhandled control char 0x{:02x}", ctrl),
        }
    }

    fn do_esc(&mut self, flags: CsiFlags, byte: u32) {
        let byte = byte as u8;

        // charset designations carry their slot in the collect flags
        if let Some(&set) = DESIGNATORS.get(&byte) {
            if self.vte.set_charset(flags, set) {
                return;
            }
        }

        match byte {
            b'F' if flags.contains(CsiFlags::SPACE) => {
                // S7C1T
                self.vte.flags.remove(VteFlags::USE_C1);
                return;
            }
            b'G' if flags.contains(CsiFlags::SPACE) => {
                // S8C1T
                self.vte.flags.insert(VteFlags::USE_C1);
                return;
            }
            _ => {}
        }

        // everything below is only valid without collected flags
        if !flags.is_empty() {
            log::debug!("unhandled escape sequence 0x{:02x}", byte);
            return;
        }

        match byte {
            b'D' => self.screen.move_down(1, true), // IND
            b'E' => self.screen.newline(),          // NEL
            b'H' => self.screen.set_tabstop(),      // HTS
            b'M' => self.screen.move_up(1, true),   // RI
            b'N' => self.vte.glt = Some(2),         // SS2
            b'O' => self.vte.glt = Some(3),         // SS3
            b'Z' => {
                // DECID
                self.vte.send_primary_da(self.screen, self.host);
            }
            b'\\' => {} // ST
            b'~' => self.vte.gr = 1,  // LS1R
            b'n' => self.vte.gl = 2,  // LS2
            b'}' => self.vte.gr = 2,  // LS2R
            b'o' => self.vte.gl = 3,  // LS3
            b'|' => self.vte.gr = 3,  // LS3R
            b'=' => {
                self.vte.flags.insert(VteFlags::KEYPAD_APPLICATION);
            }
            b'>' => {
                self.vte.flags.remove(VteFlags::KEYPAD_APPLICATION);
            }
            b'c' => {
                // RIS
                self.vte.hard_reset(self.screen);
            }
            b'7' => self.save_state(),    // DECSC
            b'8' => self.restore_state(), // DECRC
            _ => log::debug!("unhandled escape sequence 0x{:02x}", byte),
        }
    }

    pub(crate) fn save_state(&mut self) {
        let v = &mut *self.vte;
        v.saved.cursor = self.screen.cursor();
        v.saved.cattr = v.cattr;
        v.saved.faint = v.faint;
        v.saved.c_fgcode = v.c_fgcode;
        v.saved.c_bgcode = v.c_bgcode;
        v.saved.gl = v.gl;
        v.saved.gr = v.gr;
        v.saved.mouse = v.mstate;
        v.saved.wrap_mode = v.flags.contains(VteFlags::AUTO_WRAP);
        v.saved.origin_mode = v.flags.contains(VteFlags::ORIGIN_MODE);
    }

    pub(crate) fn restore_state(&mut self) {
        let v = &mut *self.vte;
        self.screen.move_to(v.saved.cursor.0, v.saved.cursor.1);
        v.cattr = v.saved.cattr;
        v.faint = v.saved.faint;
        v.c_fgcode = v.saved.c_fgcode;
        v.c_bgcode = v.saved.c_bgcode;
        v.to_rgb(false);
        if v.flags.contains(VteFlags::BACKGROUND_COLOR_ERASE) {
            self.screen.set_def_attr(&v.cattr);
        }
        v.gl = v.saved.gl;
        v.gr = v.saved.gr;
        v.mstate = v.saved.mouse;

        v.flags.set(VteFlags::AUTO_WRAP, v.saved.wrap_mode);
        if v.saved.wrap_mode {
            self.screen.set_flags(ScreenFlags::AUTO_WRAP);
        } else {
            self.screen.reset_flags(ScreenFlags::AUTO_WRAP);
        }

        v.flags.set(VteFlags::ORIGIN_MODE, v.saved.origin_mode);
        if v.saved.origin_mode {
            self.screen.set_flags(ScreenFlags::REL_ORIGIN);
        } else {
            self.screen.reset_flags(ScreenFlags::REL_ORIGIN);
        }
    }
}

impl VtActor for Performer<'_> {
    fn print(&mut self, cp: u32) {
        self.do_print(cp);
    }

    fn execute(&mut self, ctrl: u32) {
        self.do_execute(ctrl);
    }

    fn esc_dispatch(&mut self, flags: CsiFlags, byte: u32) {
        self.do_esc(flags, byte);
    }

    fn csi_dispatch(&mut self, args: &CsiArgs, flags: CsiFlags, byte: u32) {
        self.do_csi(args, flags, byte);
    }

    fn osc_dispatch(&mut self, data: &[u8], truncated: bool) {
        // window title kinds are understood here, the rest belongs to
        // the embedder
        let title = data
            .strip_prefix(b"0;")
            .or_else(|| data.strip_prefix(b"1;"))
            .or_else(|| data.strip_prefix(b"2;"));

        match title {
            Some(rest) if !truncated => match std::str::from_utf8(rest) {
                Ok(title) => self.host.set_title(title),
                Err(_) => log::debug!("OSC title is not valid utf-8"),
            },
            _ => self.host.osc_string(data, truncated),
        }
    }
}
