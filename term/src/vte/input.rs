//! Input translation: keys, mouse and paste become the byte sequences
//! the child expects.

use super::{MouseProto, Vte, VteFlags, VteHost};
use crate::screen::Screen;
use crate::utf8;

bitflags! {
    #[derive(Default)]
    pub struct KeyModifiers: u8 {
        const SHIFT = 0x01;
        const ALT   = 0x02;
        const CTRL  = 0x04;
        const META  = 0x08;
    }
}

/// Symbolic keys the translator understands.  Plain printable input
/// arrives as `Char`; anything not listed here falls through to the
/// codepoint the host supplies alongside the event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Keysym {
    Char(char),
    Backspace,
    Tab,
    Clear,
    Return,
    SysReq,
    Escape,
    Home,
    Insert,
    Delete,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Right,
    Left,
    KpEnter,
    Kp0,
    Kp1,
    Kp2,
    Kp3,
    Kp4,
    Kp5,
    Kp6,
    Kp7,
    Kp8,
    Kp9,
    KpPeriod,
    KpMinus,
    KpPlus,
    KpMultiply,
    KpDivide,
    KpEquals,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Unknown,
}

/// Ctrl chord for an ASCII-ish key, per the usual C0 mapping.
fn ctrl_chord(c: char) -> Option<u8> {
    Some(match c {
        '2' | ' ' | '@' => 0x00,
        'a'..='z' => c as u8 - b'a' + 1,
        'A'..='Z' => c as u8 - b'A' + 1,
        '3' | '[' => 0x1b,
        '4' | '\\' => 0x1c,
        '5' | ']' => 0x1d,
        '6' | '`' => 0x1e,
        '7' | '/' => 0x1f,
        '8' => 0x7f,
        _ => return None,
    })
}

impl Vte {
    /// Translate one key event.  Resolution order: Ctrl chords, named
    /// keys (respecting cursor-key, keypad and new-line modes), then
    /// the raw codepoint.  Alt prepends ESC to whatever is sent.
    /// Returns false when nothing was recognized.
    pub fn handle_keyboard(
        &mut self,
        sym: Keysym,
        mods: KeyModifiers,
        cp: Option<u32>,
        screen: &mut Screen,
        host: &mut dyn VteHost,
    ) -> bool {
        use Keysym::*;

        if self.flags.contains(VteFlags::KEYBOARD_ACTION) {
            return true;
        }

        if mods.contains(KeyModifiers::ALT) {
            self.flags.insert(VteFlags::PREPEND_ESCAPE);
        }

        if mods.contains(KeyModifiers::CTRL) {
            if let Char(c) = sym {
                if let Some(byte) = ctrl_chord(c) {
                    self.write(&[byte], screen, host);
                    return true;
                }
            }
        }

        let app_cursor = self.flags.contains(VteFlags::CURSOR_KEY_MODE);
        let app_keypad = self.flags.contains(VteFlags::KEYPAD_APPLICATION);
        let shift = mods.contains(KeyModifiers::SHIFT);

        let fixed: Option<&[u8]> = match sym {
            Backspace => Some(b"\x08"),
            Tab => Some(b"\x09"),
            Clear => Some(b"\x0b"),
            SysReq => Some(b"\x15"),
            Escape => Some(b"\x1b"),
            KpEnter if app_keypad => Some(b"\x1bOM"),
            KpEnter | Return => {
                if self.flags.contains(VteFlags::LINE_FEED_NEW_LINE) {
                    Some(b"\x0d\x0a")
                } else {
                    Some(b"\x0d")
                }
            }
            Home | Kp7 => Some(if app_cursor { b"\x1bOH" } else { b"\x1b[H" }),
            End | Kp1 => Some(if app_cursor { b"\x1bOF" } else { b"\x1b[F" }),
            Insert | Kp0 => Some(b"\x1b[2~"),
            Delete | KpPeriod => Some(b"\x1b[3~"),
            PageUp | Kp9 => Some(b"\x1b[5~"),
            PageDown | Kp3 => Some(b"\x1b[6~"),
            Up | Kp8 => Some(if app_cursor { b"\x1bOA" } else { b"\x1b[A" }),
            Down | Kp2 => Some(if app_cursor { b"\x1bOB" } else { b"\x1b[B" }),
            Right | Kp6 => Some(if app_cursor { b"\x1bOC" } else { b"\x1b[C" }),
            Left | Kp4 => Some(if app_cursor { b"\x1bOD" } else { b"\x1b[D" }),
            Kp5 => Some(if app_keypad { b"\x1bOu" } else { b"5" }),
            KpMinus => Some(if app_keypad { b"\x1bOm" } else { b"-" }),
            KpPlus => Some(if app_keypad { b"\x1bOk" } else { b"+" }),
            KpMultiply => Some(if app_keypad { b"\x1bOo" } else { b"*" }),
            KpEquals | KpDivide => Some(if app_keypad { b"\x1bOj" } else { b"/" }),
            F1 => Some(if shift { b"\x1b[23~" } else { b"\x1bOP" }),
            F2 => Some(if shift { b"\x1b[24~" } else { b"\x1bOQ" }),
            F3 => Some(if shift { b"\x1b[25~" } else { b"\x1bOR" }),
            F4 => Some(if shift { b"\x1b[26~" } else { b"\x1bOS" }),
            F5 => Some(if shift { b"\x1b[28~" } else { b"\x1b[15~" }),
            F6 => Some(if shift { b"\x1b[29~" } else { b"\x1b[17~" }),
            F7 => Some(if shift { b"\x1b[31~" } else { b"\x1b[18~" }),
            F8 => Some(if shift { b"\x1b[32~" } else { b"\x1b[19~" }),
            F9 => Some(if shift { b"\x1b[33~" } else { b"\x1b[20~" }),
            F10 => Some(if shift { b"\x1b[34~" } else { b"\x1b[21~" }),
            F11 => Some(if shift { b"\x1b[23;2~" } else { b"\x1b[23~" }),
            F12 => Some(if shift { b"\x1b[24;2~" } else { b"\x1b[24~" }),
            Char(_) | Unknown => None,
        };

        if let Some(seq) = fixed {
            let seq = seq.to_vec();
            self.write(&seq, screen, host);
            return true;
        }

        if let Some(cp) = cp {
            if self.flags.contains(VteFlags::MODE_7BIT) {
                let byte = if cp < 0x80 {
                    cp as u8
                } else {
                    log::debug!("non-ASCII keyboard input U+{:X} in 7-bit mode", cp);
                    b'?'
                };
                self.write(&[byte], screen, host);
            } else if self.flags.contains(VteFlags::MODE_8BIT) {
                let byte = if cp <= 0xff {
                    cp as u8
                } else {
                    log::debug!("non-Latin-1 keyboard input U+{:X} in 8-bit mode", cp);
                    b'?'
                };
                self.write(&[byte], screen, host);
            } else {
                let mut buf = [0u8; 4];
                let len = utf8::encode(cp, &mut buf);
                if len > 0 {
                    let seq = buf[..len].to_vec();
                    self.write(&seq, screen, host);
                }
            }
            return true;
        }

        self.flags.remove(VteFlags::PREPEND_ESCAPE);
        false
    }

    /// Wrap and forward pasted text, bracketing it when the client
    /// asked for that.
    pub fn paste(&mut self, data: &[u8], screen: &mut Screen, host: &mut dyn VteHost) {
        if self.flags.contains(VteFlags::PASTE_BRACKET) {
            self.write(b"\x1b[200~", screen, host);
        }
        let data = data.to_vec();
        self.write(&data, screen, host);
        if self.flags.contains(VteFlags::PASTE_BRACKET) {
            self.write(b"\x1b[201~", screen, host);
        }
    }

    fn mods_code(mods: KeyModifiers) -> i32 {
        let mut mc = 0;
        if mods.contains(KeyModifiers::SHIFT) {
            mc |= 1;
        }
        if mods.contains(KeyModifiers::ALT) {
            mc |= 2;
        }
        if mods.contains(KeyModifiers::CTRL) {
            mc |= 4;
        }
        mc
    }

    /// Emit one mouse report in the active encoding.  `col`/`row` are
    /// 1-based cell coordinates.
    fn mouse_wr(
        &mut self,
        btni: i32,
        press: bool,
        mods: i32,
        col: usize,
        row: usize,
        screen: &mut Screen,
        host: &mut dyn VteHost,
    ) {
        let seq: Vec<u8> = if self.mstate.contains(MouseProto::SGR) {
            format!(
                "\x1b[<{};{};{}{}",
                btni | mods,
                col,
                row,
                if press { 'M' } else { 'm' }
            )
            .into_bytes()
        } else if self.mstate.contains(MouseProto::X10) {
            // single-byte coordinates saturate near the wire limit
            let col = if col > 222 { 222 } else { col };
            let row = if row > 222 { 222 } else { row };
            let mut buf = b"\x1b[M".to_vec();
            buf.push(((btni | mods) + 32) as u8);
            buf.push((col + 32) as u8);
            buf.push((row + 32) as u8);
            buf
        } else if self.mstate.contains(MouseProto::RXVT) {
            let btni = if press { btni } else { 3 };
            format!("\x1b[{};{};{}M", btni | mods, col, row).into_bytes()
        } else {
            return;
        };

        self.write(&seq, screen, host);
    }

    /// Pointer moved to cell (x, y).  Reports drags while a button is
    /// held and any motion in all-motion mode; duplicate positions are
    /// dropped.
    pub fn mouse_motion(
        &mut self,
        x: usize,
        y: usize,
        mods: KeyModifiers,
        screen: &mut Screen,
        host: &mut dyn VteHost,
    ) {
        if x == self.mouse_x && y == self.mouse_y {
            return;
        }
        self.mouse_x = x;
        self.mouse_y = y;

        let dragging = self.mstate.contains(MouseProto::DRAG) && self.mbutton != 0;
        let motion = self.mstate.contains(MouseProto::MOTION);
        if !dragging && !motion {
            return;
        }

        let btnind = if self.mbutton & 0x01 != 0 {
            1
        } else if self.mbutton & 0x02 != 0 {
            2
        } else if self.mbutton & 0x04 != 0 {
            3
        } else {
            4
        };

        let mc = Vte::mods_code(mods);
        self.mouse_wr(btnind - 1 + 32, true, mc, x + 1, y + 1, screen, host);
    }

    /// Button `index` (1..=3 buttons, 4 wheel-up, 5 wheel-down) was
    /// pressed or released at the last reported position.
    pub fn mouse_button(
        &mut self,
        index: u8,
        press: bool,
        mods: KeyModifiers,
        screen: &mut Screen,
        host: &mut dyn VteHost,
    ) {
        if index < 1 || index > 5 {
            return;
        }

        let old = self.mbutton;
        if index <= 3 {
            if press {
                self.mbutton |= 1 << (index - 1);
            } else {
                self.mbutton &= !(1 << (index - 1));
            }
        }

        // buttons report on change only; the wheel has no held state
        if old == self.mbutton && index < 4 {
            return;
        }

        let btni = if index < 4 {
            index as i32 - 1
        } else {
            index as i32 - 4 + 64
        };

        let mc = Vte::mods_code(mods);
        let (col, row) = (self.mouse_x + 1, self.mouse_y + 1);
        self.mouse_wr(btni, press, mc, col, row, screen, host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellAttributes;
    use crate::color::Palette;

    struct Sink {
        written: Vec<u8>,
    }

    impl VteHost for Sink {
        fn write(&mut self, data: &[u8]) {
            self.written.extend_from_slice(data);
        }
    }

    fn setup() -> (Vte, Screen, Sink) {
        let mut screen = Screen::with_size(20, 10, CellAttributes::default()).unwrap();
        let mut vte = Vte::new(Palette::named("default"));
        vte.reset(&mut screen);
        (vte, screen, Sink { written: Vec::new() })
    }

    fn feed(vte: &mut Vte, screen: &mut Screen, sink: &mut Sink, bytes: &[u8]) {
        vte.input(bytes, screen, sink);
    }

    #[test]
    fn plain_key_sends_utf8() {
        let (mut vte, mut screen, mut sink) = setup();
        vte.handle_keyboard(
            Keysym::Char('a'),
            KeyModifiers::default(),
            Some('a' as u32),
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"a");
    }

    #[test]
    fn ctrl_c_is_etx() {
        let (mut vte, mut screen, mut sink) = setup();
        vte.handle_keyboard(
            Keysym::Char('c'),
            KeyModifiers::CTRL,
            Some('c' as u32),
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x03");
    }

    #[test]
    fn alt_prepends_escape() {
        let (mut vte, mut screen, mut sink) = setup();
        vte.handle_keyboard(
            Keysym::Char('x'),
            KeyModifiers::ALT,
            Some('x' as u32),
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x1bx");
    }

    #[test]
    fn cursor_keys_respect_application_mode() {
        let (mut vte, mut screen, mut sink) = setup();
        vte.handle_keyboard(
            Keysym::Up,
            KeyModifiers::default(),
            None,
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x1b[A");

        sink.written.clear();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1h");
        vte.handle_keyboard(
            Keysym::Up,
            KeyModifiers::default(),
            None,
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x1bOA");
    }

    #[test]
    fn keypad_application_mode() {
        let (mut vte, mut screen, mut sink) = setup();
        vte.handle_keyboard(
            Keysym::KpPlus,
            KeyModifiers::default(),
            None,
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"+");

        sink.written.clear();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b=");
        vte.handle_keyboard(
            Keysym::KpPlus,
            KeyModifiers::default(),
            None,
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x1bOk");
    }

    #[test]
    fn return_respects_newline_mode() {
        let (mut vte, mut screen, mut sink) = setup();
        vte.handle_keyboard(
            Keysym::Return,
            KeyModifiers::default(),
            None,
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x0d");

        sink.written.clear();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[20h");
        vte.handle_keyboard(
            Keysym::Return,
            KeyModifiers::default(),
            None,
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x0d\x0a");
    }

    #[test]
    fn unknown_key_reports_unhandled() {
        let (mut vte, mut screen, mut sink) = setup();
        let handled = vte.handle_keyboard(
            Keysym::Unknown,
            KeyModifiers::default(),
            None,
            &mut screen,
            &mut sink,
        );
        assert!(!handled);
        assert!(sink.written.is_empty());
    }

    #[test]
    fn sgr_mouse_press_report() {
        let (mut vte, mut screen, mut sink) = setup();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1000h\x1b[?1006h");

        vte.mouse_motion(5, 3, KeyModifiers::default(), &mut screen, &mut sink);
        sink.written.clear();
        vte.mouse_button(1, true, KeyModifiers::default(), &mut screen, &mut sink);
        assert_eq!(sink.written, b"\x1b[<0;6;4M");

        sink.written.clear();
        vte.mouse_button(1, false, KeyModifiers::default(), &mut screen, &mut sink);
        assert_eq!(sink.written, b"\x1b[<0;6;4m");
    }

    #[test]
    fn x10_mouse_encoding() {
        let (mut vte, mut screen, mut sink) = setup();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1000h");

        vte.mouse_button(1, true, KeyModifiers::default(), &mut screen, &mut sink);
        assert_eq!(sink.written, &[0x1b, b'[', b'M', 32, 33, 33]);
    }

    #[test]
    fn rxvt_mouse_encoding() {
        let (mut vte, mut screen, mut sink) = setup();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1000h\x1b[?1015h");

        vte.mouse_button(2, true, KeyModifiers::default(), &mut screen, &mut sink);
        assert_eq!(sink.written, b"\x1b[1;1;1M");
    }

    #[test]
    fn wheel_maps_to_64_65() {
        let (mut vte, mut screen, mut sink) = setup();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1000h\x1b[?1006h");

        vte.mouse_button(4, true, KeyModifiers::default(), &mut screen, &mut sink);
        assert_eq!(sink.written, b"\x1b[<64;1;1M");
        sink.written.clear();
        vte.mouse_button(5, true, KeyModifiers::default(), &mut screen, &mut sink);
        assert_eq!(sink.written, b"\x1b[<65;1;1M");
    }

    #[test]
    fn drag_reports_with_offset_code() {
        let (mut vte, mut screen, mut sink) = setup();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1002h\x1b[?1006h");

        vte.mouse_button(1, true, KeyModifiers::default(), &mut screen, &mut sink);
        sink.written.clear();
        vte.mouse_motion(2, 2, KeyModifiers::default(), &mut screen, &mut sink);
        assert_eq!(sink.written, b"\x1b[<32;3;3M");
    }

    #[test]
    fn motion_without_button_needs_all_motion_mode(){
        let (mut vte, mut screen, mut sink) = setup();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1002h\x1b[?1006h");
        vte.mouse_motion(4, 4, KeyModifiers::default(), &mut screen, &mut sink);
        assert!(sink.written.is_empty());

        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1003h\x1b[?1006h");
        vte.mouse_motion(5, 5, KeyModifiers::default(), &mut screen, &mut sink);
        // no button held: reported as release-class motion, code 3+32
        assert_eq!(sink.written, b"\x1b[<35;6;6M");
    }

    #[test]
    fn modifier_bits_add_to_button() {
        let (mut vte, mut screen, mut sink) = setup();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?1000h\x1b[?1006h");

        vte.mouse_button(
            1,
            true,
            KeyModifiers::SHIFT | KeyModifiers::CTRL,
            &mut screen,
            &mut sink,
        );
        assert_eq!(sink.written, b"\x1b[<5;1;1M");
    }

    #[test]
    fn bracketed_paste_wraps() {
        let (mut vte, mut screen, mut sink) = setup();
        vte.paste(b"hi", &mut screen, &mut sink);
        assert_eq!(sink.written, b"hi");

        sink.written.clear();
        feed(&mut vte, &mut screen, &mut sink, b"\x1b[?2004h");
        vte.paste(b"hi", &mut screen, &mut sink);
        assert_eq!(sink.written, b"\x1b[200~hi\x1b[201~");
    }
}
