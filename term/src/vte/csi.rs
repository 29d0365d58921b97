//! CSI dispatch: cursor motion, erase, SGR, mode switching, reports.

use super::{MouseProto, Performer, VteFlags};
use crate::cell::AttrFlags;
use crate::color::xterm256;
use crate::screen::ScreenFlags;
use vtsm::{CsiArgs, CsiFlags};

/// Default-1 counts: CUU and friends treat 0 and absent alike.
fn count(args: &CsiArgs, idx: usize) -> usize {
    let v = args.arg(idx);
    if v <= 0 {
        1
    } else {
        v as usize
    }
}

impl Performer<'_> {
    pub(crate) fn do_csi(&mut self, args: &CsiArgs, flags: CsiFlags, byte: u32) {
        match byte as u8 {
            b'A' => self.screen.move_up(count(args, 0), false), // CUU
            b'B' => self.screen.move_down(count(args, 0), false), // CUD
            b'C' => self.screen.move_right(count(args, 0)),     // CUF
            b'D' => self.screen.move_left(count(args, 0)),      // CUB
            b'd' => {
                // VPA
                let (x, _) = self.screen.cursor();
                self.screen.move_to(x, count(args, 0) - 1);
            }
            b'e' => {
                // VPR
                let (x, y) = self.screen.cursor();
                self.screen.move_to(x, y + count(args, 0));
            }
            b'H' | b'f' => {
                // CUP / HVP; row;col, 1-based
                let row = count(args, 0);
                let col = count(args, 1);
                self.screen.move_to(col - 1, row - 1);
            }
            b'G' => {
                // CHA
                let (_, y) = self.screen.cursor();
                self.screen.move_to(count(args, 0) - 1, y);
            }
            b'J' => {
                let protect = flags.contains(CsiFlags::WHAT);
                match args.arg(0) {
                    v if v <= 0 => self.screen.erase_cursor_to_screen(protect),
                    1 => self.screen.erase_screen_to_cursor(protect),
                    2 => self.screen.erase_screen(protect),
                    v => log::debug!("unknown parameter to CSI-J: {}", v),
                }
            }
            b'K' => {
                let protect = flags.contains(CsiFlags::WHAT);
                match args.arg(0) {
                    v if v <= 0 => self.screen.erase_cursor_to_end(protect),
                    1 => self.screen.erase_home_to_cursor(protect),
                    2 => self.screen.erase_current_line(protect),
                    v => log::debug!("unknown parameter to CSI-K: {}", v),
                }
            }
            b'X' => self.screen.erase_chars(count(args, 0)), // ECH
            b'm' => self.csi_attribute(args),
            b'p' => {
                if flags.contains(CsiFlags::GT) {
                    // xterm pointer mode; treated as soft reset
                    self.vte.reset(self.screen);
                } else if flags.contains(CsiFlags::BANG) {
                    // DECSTR
                    self.vte.reset(self.screen);
                } else if flags.contains(CsiFlags::CASH) {
                    // DECRQM; unanswered, reset to a sane state
                    self.vte.reset(self.screen);
                } else {
                    // DECSCL
                    self.csi_compat_mode(args);
                }
            }
            b'q' if flags.contains(CsiFlags::DQUOTE) => {
                // DECSCA: guard cells against selective erase
                let protect = args.arg(0) == 1;
                self.vte.cattr.set(AttrFlags::PROTECT, protect);
            }
            b'h' => self.csi_mode(args, flags, true),  // SM / DECSET
            b'l' => self.csi_mode(args, flags, false), // RM / DECRST
            b'r' => {
                // DECSTBM
                let top = args.arg(0).max(0) as usize;
                let bottom = args.arg(1).max(0) as usize;
                self.screen.set_margins(top, bottom);
            }
            b'c' => self.csi_dev_attr(args, flags), // DA
            b'L' => self.screen.insert_lines(count(args, 0)), // IL
            b'M' => self.screen.delete_lines(count(args, 0)), // DL
            b'g' => {
                // TBC
                match args.arg(0) {
                    v if v <= 0 => self.screen.reset_tabstop(),
                    3 => self.screen.reset_all_tabstops(),
                    v => log::debug!("invalid parameter {} to TBC", v),
                }
            }
            b'@' => self.screen.insert_chars(count(args, 0)), // ICH
            b'P' => self.screen.delete_chars(count(args, 0)), // DCH
            b'Z' => self.screen.tab_left(count(args, 0)),     // CBT
            b'I' => self.screen.tab_right(count(args, 0)),    // CHT
            b'n' => self.csi_dsr(args),                       // DSR
            b'S' => {
                self.screen.scroll_up(count(args, 0));
            }
            b'T' => {
                self.screen.scroll_down(count(args, 0));
            }
            other => log::debug!("unhandled CSI sequence '{}'", other as char),
        }
    }

    /// SGR.  Color state tracks palette indices separately from direct
    /// RGB so later palette swaps and bold-as-bright promotion can
    /// re-resolve them.
    fn csi_attribute(&mut self, args: &CsiArgs) {
        // bare `CSI m` means reset
        let empty = [0i32];
        let argv: &[i32] = if args.len() <= 1 && args.arg(0) == -1 {
            &empty
        } else {
            args.as_slice()
        };

        let v = &mut *self.vte;
        let mut i = 0;
        while i < argv.len() {
            match argv[i] {
                -1 => {}
                0 => {
                    v.c_fgcode = v.d_fgcode;
                    v.c_bgcode = v.d_bgcode;
                    v.cattr.fg = v.def_attr.fg;
                    v.cattr.bg = v.def_attr.bg;
                    v.cattr.flags = AttrFlags::default();
                    v.faint = false;
                }
                1 => {
                    v.cattr.set(AttrFlags::BOLD, true);
                }
                2 => v.faint = true,
                3 => {
                    v.cattr.set(AttrFlags::ITALIC, true);
                }
                4 => {
                    v.cattr.set(AttrFlags::UNDERLINE, true);
                }
                5 => {
                    v.cattr.set(AttrFlags::BLINK, true);
                }
                7 => {
                    v.cattr.set(AttrFlags::INVERSE, true);
                }
                8 => {
                    // concealed; the protect bit doubles as DECSCA
                    v.cattr.set(AttrFlags::PROTECT, true);
                }
                9 => {
                    v.cattr.set(AttrFlags::STRIKETHROUGH, true);
                }
                22 => {
                    v.cattr.set(AttrFlags::BOLD, false);
                    v.faint = false;
                }
                23 => {
                    v.cattr.set(AttrFlags::ITALIC, false);
                }
                24 => {
                    v.cattr.set(AttrFlags::UNDERLINE, false);
                }
                25 => {
                    v.cattr.set(AttrFlags::BLINK, false);
                }
                27 => {
                    v.cattr.set(AttrFlags::INVERSE, false);
                }
                28 => {
                    v.cattr.set(AttrFlags::PROTECT, false);
                }
                29 => {
                    v.cattr.set(AttrFlags::STRIKETHROUGH, false);
                }
                c @ 30..=37 => v.set_indexed(false, true, c - 30),
                39 => {
                    v.c_fgcode = v.d_fgcode;
                    v.cattr.fg = v.def_attr.fg;
                }
                c @ 40..=47 => v.set_indexed(false, false, c - 40),
                49 => {
                    v.c_bgcode = v.d_bgcode;
                    v.cattr.bg = v.def_attr.bg;
                }
                c @ 90..=97 => v.set_indexed(false, true, c - 90 + 8),
                c @ 100..=107 => v.set_indexed(false, false, c - 100 + 8),
                sel @ (38 | 48) => {
                    let fg = sel == 38;
                    match argv.get(i + 1).copied() {
                        Some(5) => {
                            // xterm-256 palette
                            let code = match argv.get(i + 2).copied() {
                                Some(c) if (0..=255).contains(&c) => c,
                                _ => {
                                    log::debug!("invalid 256-color SGR");
                                    break;
                                }
                            };
                            if code < 16 {
                                v.set_indexed(false, fg, code);
                            } else {
                                let rgb = xterm256(&v.palette, code as u8);
                                if fg {
                                    v.c_fgcode = -1;
                                    v.cattr.fg = rgb;
                                } else {
                                    v.c_bgcode = -1;
                                    v.cattr.bg = rgb;
                                }
                            }
                            i += 2;
                        }
                        Some(2) => {
                            // direct RGB
                            let rgb = (
                                argv.get(i + 2).copied(),
                                argv.get(i + 3).copied(),
                                argv.get(i + 4).copied(),
                            );
                            let (r, g, b) = match rgb {
                                (Some(r), Some(g), Some(b)) if r >= 0 && g >= 0 && b >= 0 => {
                                    (r as u8, g as u8, b as u8)
                                }
                                _ => {
                                    log::debug!("invalid truecolor SGR");
                                    break;
                                }
                            };
                            if fg {
                                v.c_fgcode = -1;
                                v.cattr.fg = [r, g, b];
                            } else {
                                v.c_bgcode = -1;
                                v.cattr.bg = [r, g, b];
                            }
                            i += 4;
                        }
                        _ => {
                            log::debug!("invalid SGR {}", sel);
                            break;
                        }
                    }
                }
                other => log::debug!("unhandled SGR attribute {}", other),
            }
            i += 1;
        }

        v.to_rgb(false);
        if v.flags.contains(VteFlags::BACKGROUND_COLOR_ERASE) {
            let pen = v.cattr;
            self.screen.set_def_attr(&pen);
        }
    }

    /// DECSCL.  Always soft-resets, then pins the input decode mode to
    /// the requested compatibility level.
    fn csi_compat_mode(&mut self, args: &CsiArgs) {
        self.vte.reset(self.screen);

        match args.arg(0) {
            61 => {
                // VT100: 7-bit only, charset tables to be safe
                let v = &mut *self.vte;
                v.flags.insert(VteFlags::MODE_7BIT);
                v.g[0] = &crate::charset::UNICODE_LOWER;
                v.g[1] = &crate::charset::DEC_SUPPLEMENTAL_GRAPHICS;
            }
            62..=64 => {
                let v = &mut *self.vte;
                if matches!(args.arg(1), 1 | 2) {
                    v.flags.insert(VteFlags::USE_C1);
                }
                v.flags.insert(VteFlags::MODE_8BIT);
                v.g[0] = &crate::charset::UNICODE_LOWER;
                v.g[1] = &crate::charset::DEC_SUPPLEMENTAL_GRAPHICS;
            }
            other => {
                log::debug!("unhandled DECSCL level {}, staying in utf-8 mode", other);
            }
        }
    }

    fn csi_mode(&mut self, args: &CsiArgs, flags: CsiFlags, set: bool) {
        for i in 0..args.len() {
            let mode = args.arg(i);
            if mode == -1 {
                continue;
            }

            if !flags.contains(CsiFlags::WHAT) {
                // ANSI modes
                match mode {
                    2 => self.vte.flags.set(VteFlags::KEYBOARD_ACTION, set), // KAM
                    4 => {
                        // IRM
                        self.vte.flags.set(VteFlags::INSERT_REPLACE, set);
                        if set {
                            self.screen.set_flags(ScreenFlags::INSERT_MODE);
                        } else {
                            self.screen.reset_flags(ScreenFlags::INSERT_MODE);
                        }
                    }
                    12 => self.vte.flags.set(VteFlags::SEND_RECEIVE, set), // SRM
                    20 => self.vte.flags.set(VteFlags::LINE_FEED_NEW_LINE, set), // LNM
                    other => log::debug!("unknown non-DEC (re)set-mode {}", other),
                }
                continue;
            }

            // DEC private modes
            match mode {
                1 => self.vte.flags.set(VteFlags::CURSOR_KEY_MODE, set), // DECCKM
                2 => {}  // DECANM; VT52 mode unsupported
                3 => {}  // DECCOLM; dynamic dimensions instead
                4 => {}  // DECSCLM; no smooth scrolling with scrollback
                5 => {
                    // DECSCNM
                    self.vte.flags.set(VteFlags::INVERSE_SCREEN, set);
                    if set {
                        self.screen.set_flags(ScreenFlags::INVERSE);
                    } else {
                        self.screen.reset_flags(ScreenFlags::INVERSE);
                    }
                }
                6 => {
                    // DECOM
                    self.vte.flags.set(VteFlags::ORIGIN_MODE, set);
                    if set {
                        self.screen.set_flags(ScreenFlags::REL_ORIGIN);
                    } else {
                        self.screen.reset_flags(ScreenFlags::REL_ORIGIN);
                    }
                }
                7 => {
                    // DECAWM
                    self.vte.flags.set(VteFlags::AUTO_WRAP, set);
                    if set {
                        self.screen.set_flags(ScreenFlags::AUTO_WRAP);
                    } else {
                        self.screen.reset_flags(ScreenFlags::AUTO_WRAP);
                    }
                }
                8 => self.vte.flags.set(VteFlags::AUTO_REPEAT, set), // DECARM
                9 | 12 | 18 | 19 => {} // X10 compat, blink, printer modes
                25 => self.vte.flags.set(VteFlags::TEXT_CURSOR, set), // DECTCEM
                42 => self.vte.flags.set(VteFlags::NATIONAL_CHARSET, set), // DECNRCM
                47 => {
                    // plain alternate screen
                    if self.vte.flags.contains(VteFlags::TITE_INHIBIT) {
                        continue;
                    }
                    if set {
                        self.screen.set_flags(ScreenFlags::ALTERNATE);
                    } else {
                        self.screen.reset_flags(ScreenFlags::ALTERNATE);
                    }
                }
                1000 | 1002 | 1003 => {
                    // mouse event classes share the X10 default encoding
                    if set {
                        let class = match mode {
                            1000 => MouseProto::BUTTON,
                            1002 => MouseProto::DRAG,
                            _ => MouseProto::MOTION,
                        };
                        self.vte.mstate = class | MouseProto::X10;
                    } else {
                        self.vte.mstate = MouseProto::default();
                    }
                }
                1006 => {
                    // SGR encoding replaces whatever encoding is active
                    let v = &mut *self.vte;
                    v.mstate = (v.mstate - MouseProto::ENCODINGS)
                        | if set { MouseProto::SGR } else { MouseProto::X10 };
                }
                1015 => {
                    let v = &mut *self.vte;
                    v.mstate = (v.mstate - MouseProto::ENCODINGS)
                        | if set { MouseProto::RXVT } else { MouseProto::X10 };
                }
                1047 => {
                    // alternate screen, erased when leaving
                    if self.vte.flags.contains(VteFlags::TITE_INHIBIT) {
                        continue;
                    }
                    if set {
                        self.screen.set_flags(ScreenFlags::ALTERNATE);
                    } else {
                        self.screen.erase_screen(false);
                        self.screen.reset_flags(ScreenFlags::ALTERNATE);
                    }
                }
                1048 => {
                    // cursor save/restore half of 1049
                    if self.vte.flags.contains(VteFlags::TITE_INHIBIT) {
                        continue;
                    }
                    if set {
                        self.vte.alt_cursor = self.screen.cursor();
                    } else {
                        let (x, y) = self.vte.alt_cursor;
                        self.screen.move_to(x, y);
                    }
                }
                1049 => {
                    // alternate screen with cursor save and erase on entry
                    if self.vte.flags.contains(VteFlags::TITE_INHIBIT) {
                        continue;
                    }
                    if set {
                        self.vte.alt_cursor = self.screen.cursor();
                        self.screen.set_flags(ScreenFlags::ALTERNATE);
                        self.screen.erase_screen(false);
                    } else {
                        self.screen.erase_screen(false);
                        self.screen.reset_flags(ScreenFlags::ALTERNATE);
                        let (x, y) = self.vte.alt_cursor;
                        self.screen.move_to(x, y);
                    }
                }
                2004 => self.vte.flags.set(VteFlags::PASTE_BRACKET, set),
                other => {
                    log::debug!("unknown DEC {}-mode {}", if set { "set" } else { "reset" }, other)
                }
            }
        }
    }

    fn csi_dev_attr(&mut self, args: &CsiArgs, flags: CsiFlags) {
        if args.len() <= 1 && args.arg(0) <= 0 {
            if flags.is_empty() {
                self.vte.send_primary_da(self.screen, self.host);
                return;
            } else if flags.contains(CsiFlags::GT) {
                self.vte.write(b"\x1b[>1;1;0c", self.screen, self.host);
                return;
            }
        }

        log::debug!("unhandled DA request {:?} {:?}", flags, args.as_slice());
    }

    fn csi_dsr(&mut self, args: &CsiArgs) {
        match args.arg(0) {
            5 => self.vte.write(b"\x1b[0n", self.screen, self.host),
            6 => {
                let (x, y) = self.screen.cursor();
                let reply = format!("\x1b[{};{}R", y + 1, x + 1);
                self.vte.write(reply.as_bytes(), self.screen, self.host);
            }
            other => log::debug!("unhandled DSR {}", other),
        }
    }
}
