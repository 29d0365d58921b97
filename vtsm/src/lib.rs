//! A state machine for terminal escape sequences, following the DEC ANSI
//! parser diagram.  Unlike a byte-oriented parser this one consumes
//! already-decoded codepoints: the embedding terminal owns the UTF-8 (or
//! 8-bit/7-bit) decode step and feeds UCS-4 values in, which keeps the
//! tables at 256 entries while still letting printable text above 0xFF
//! flow through `print`.
//!
//! The machine itself is semantics-free.  It categorizes input, assembles
//! CSI/DCS parameters and intermediate flags, buffers OSC strings, and
//! hands the results to an implementation of [`VtActor`] which gives the
//! sequences meaning.
#![allow(clippy::upper_case_acronyms)]

#[macro_use]
extern crate bitflags;

mod enums;
mod transitions;

pub use crate::enums::{Action, State};
use crate::transitions::{ENTRY, EXIT, TRANSITIONS, WIDE};

/// Up to this many CSI/DCS parameters are collected; further parameters
/// are dropped on the floor like xterm does.
pub const CSI_ARG_MAX: usize = 16;

/// Default cap for the OSC collector.
pub const OSC_LIMIT_DEFAULT: usize = 256;

bitflags! {
    /// Intermediate and private-marker characters seen while assembling a
    /// CSI, DCS or ESC sequence.  Only the set that dispatch actually
    /// inspects is tracked; anything else is discarded.
    #[derive(Default)]
    pub struct CsiFlags: u16 {
        const BANG   = 0x0001; // !
        const CASH   = 0x0002; // $
        const WHAT   = 0x0004; // ?
        const GT     = 0x0008; // >
        const SPACE  = 0x0010;
        const SQUOTE = 0x0020; // '
        const DQUOTE = 0x0040; // "
        const MULT   = 0x0080; // *
        const PLUS   = 0x0100; // +
        const POPEN  = 0x0200; // (
        const PCLOSE = 0x0400; // )
    }
}

impl CsiFlags {
    fn collect(&mut self, cp: u32) {
        match cp {
            0x21 => self.insert(CsiFlags::BANG),
            0x24 => self.insert(CsiFlags::CASH),
            0x3f => self.insert(CsiFlags::WHAT),
            0x3e => self.insert(CsiFlags::GT),
            0x20 => self.insert(CsiFlags::SPACE),
            0x27 => self.insert(CsiFlags::SQUOTE),
            0x22 => self.insert(CsiFlags::DQUOTE),
            0x2a => self.insert(CsiFlags::MULT),
            0x2b => self.insert(CsiFlags::PLUS),
            0x28 => self.insert(CsiFlags::POPEN),
            0x29 => self.insert(CsiFlags::PCLOSE),
            _ => {}
        }
    }
}

/// Numeric parameters of a CSI or DCS sequence.  A parameter that was
/// never written stays at the sentinel `-1`, which dispatch code reads as
/// "use the default".  Values saturate at 0xFFFF.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CsiArgs {
    argv: [i32; CSI_ARG_MAX],
    argc: usize,
}

impl Default for CsiArgs {
    fn default() -> Self {
        CsiArgs {
            argv: [-1; CSI_ARG_MAX],
            argc: 0,
        }
    }
}

impl CsiArgs {
    fn clear(&mut self) {
        self.argv = [-1; CSI_ARG_MAX];
        self.argc = 0;
    }

    fn separator(&mut self) {
        if self.argc < CSI_ARG_MAX {
            self.argc += 1;
        }
    }

    fn digit(&mut self, cp: u32) {
        if self.argc >= CSI_ARG_MAX {
            return;
        }
        // overflow guard; no real sequence needs values this large
        if self.argv[self.argc] > 0xffff {
            return;
        }
        if (0x30..=0x39).contains(&cp) {
            let d = (cp - 0x30) as i32;
            let cur = self.argv[self.argc];
            self.argv[self.argc] = if cur <= 0 { d } else { cur * 10 + d };
        }
    }

    /// Called at dispatch so the in-progress parameter is counted.
    fn finish(&mut self) {
        if self.argc < CSI_ARG_MAX {
            self.argc += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.argc
    }

    pub fn is_empty(&self) -> bool {
        self.argc == 0
    }

    /// Raw parameter value; `-1` when absent (also for out-of-range idx).
    pub fn arg(&self, idx: usize) -> i32 {
        if idx < self.argc {
            self.argv[idx]
        } else {
            -1
        }
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.argv[..self.argc]
    }
}

/// Receiver for categorized input.  The state machine calls these as it
/// walks the transition tables; default implementations ignore the DCS
/// hooks since passthrough consumers are rare.
pub trait VtActor {
    /// A printable codepoint reached the ground state.
    fn print(&mut self, cp: u32);

    /// Execute a C0 or C1 control function.
    fn execute(&mut self, ctrl: u32);

    /// Final byte of an escape sequence arrived.
    fn esc_dispatch(&mut self, flags: CsiFlags, byte: u32);

    /// Final byte of a control sequence arrived.
    fn csi_dispatch(&mut self, args: &CsiArgs, flags: CsiFlags, byte: u32);

    /// A complete OSC string was terminated by ST or BEL.  `truncated` is
    /// set when the collector cap was hit and bytes were dropped.
    fn osc_dispatch(&mut self, data: &[u8], truncated: bool);

    /// Device control string entered its passthrough phase.
    fn dcs_start(&mut self, _args: &CsiArgs, _flags: CsiFlags) {}

    /// One codepoint of DCS passthrough data.
    fn dcs_data(&mut self, _cp: u32) {}

    /// The device control string was terminated.
    fn dcs_end(&mut self) {}
}

/// The escape sequence state machine.  Feed it codepoints via
/// [`VtParser::advance`]; state is small and the parser never allocates
/// outside of the bounded OSC collector.
pub struct VtParser {
    state: State,
    args: CsiArgs,
    flags: CsiFlags,
    osc: Vec<u8>,
    osc_limit: usize,
    osc_truncated: bool,
}

impl Default for VtParser {
    fn default() -> Self {
        VtParser::new()
    }
}

#[inline(always)]
fn lookup(state: State, b: u8) -> u16 {
    TRANSITIONS[state as usize][b as usize]
}

impl VtParser {
    pub fn new() -> Self {
        VtParser::with_osc_limit(OSC_LIMIT_DEFAULT)
    }

    /// A parser whose OSC collector holds at most `limit` bytes; longer
    /// strings are delivered truncated with the flag set.
    pub fn with_osc_limit(limit: usize) -> Self {
        VtParser {
            state: State::Ground,
            args: CsiArgs::default(),
            flags: CsiFlags::default(),
            osc: Vec::new(),
            osc_limit: limit.max(1),
            osc_truncated: false,
        }
    }

    /// True when no sequence is in progress.
    pub fn is_ground(&self) -> bool {
        self.state == State::Ground
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Drop any half-assembled sequence and return to ground.
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.args.clear();
        self.flags = CsiFlags::default();
        self.osc.clear();
        self.osc_truncated = false;
    }

    fn action(&mut self, action: Action, cp: u32, actor: &mut dyn VtActor) {
        match action {
            Action::None | Action::Ignore => {}
            Action::Print => actor.print(cp),
            Action::Execute => actor.execute(cp),
            Action::Clear => {
                self.args.clear();
                self.flags = CsiFlags::default();
            }
            Action::Collect => self.flags.collect(cp),
            Action::Param => {
                if cp == 0x3b {
                    self.args.separator();
                } else {
                    self.args.digit(cp);
                }
            }
            Action::EscDispatch => actor.esc_dispatch(self.flags, cp),
            Action::CsiDispatch => {
                self.args.finish();
                actor.csi_dispatch(&self.args, self.flags, cp);
            }
            Action::DcsStart => {
                self.args.finish();
                actor.dcs_start(&self.args, self.flags);
            }
            Action::DcsCollect => actor.dcs_data(cp),
            Action::DcsEnd => actor.dcs_end(),
            Action::OscStart => {
                self.osc.clear();
                self.osc_truncated = false;
            }
            Action::OscCollect => {
                if let Some(c) = std::char::from_u32(cp) {
                    let mut buf = [0u8; 4];
                    let enc = c.encode_utf8(&mut buf).as_bytes();
                    if self.osc.len() + enc.len() <= self.osc_limit {
                        self.osc.extend_from_slice(enc);
                    } else {
                        self.osc_truncated = true;
                    }
                }
            }
            Action::OscEnd => {
                if !self.osc.is_empty() {
                    actor.osc_dispatch(&self.osc, self.osc_truncated);
                }
            }
        }
    }

    /// Parse one codepoint.  Runs the exit action of the old state, the
    /// transition action, and the entry action of the new state, in that
    /// order.  Entry/exit actions also run when a state explicitly
    /// re-enters itself (an ESC inside an unfinished ESC clears collected
    /// flags again).
    pub fn advance(&mut self, cp: u32, actor: &mut dyn VtActor) {
        let packed = if cp <= 0xff {
            lookup(self.state, cp as u8)
        } else {
            WIDE[self.state as usize]
        };

        let action = Action::from_u16(packed >> 8);
        let target = packed & 0xff;

        if target != 0 {
            let next = State::from_u16(target);
            self.action(EXIT[self.state as usize], cp, actor);
            self.action(action, cp, actor);
            self.action(ENTRY[next as usize], cp, actor);
            self.state = next;
        } else {
            self.action(action, cp, actor);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use k9::assert_equal as assert_eq;

    #[derive(Debug, Clone, Eq, PartialEq)]
    enum Event {
        Print(char),
        Execute(u32),
        Esc { flags: CsiFlags, byte: u8 },
        Csi { args: Vec<i32>, flags: CsiFlags, byte: u8 },
        Osc { data: Vec<u8>, truncated: bool },
        DcsStart,
        DcsData(u32),
        DcsEnd,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl VtActor for Recorder {
        fn print(&mut self, cp: u32) {
            self.events
                .push(Event::Print(std::char::from_u32(cp).unwrap()));
        }
        fn execute(&mut self, ctrl: u32) {
            self.events.push(Event::Execute(ctrl));
        }
        fn esc_dispatch(&mut self, flags: CsiFlags, byte: u32) {
            self.events.push(Event::Esc {
                flags,
                byte: byte as u8,
            });
        }
        fn csi_dispatch(&mut self, args: &CsiArgs, flags: CsiFlags, byte: u32) {
            self.events.push(Event::Csi {
                args: args.as_slice().to_vec(),
                flags,
                byte: byte as u8,
            });
        }
        fn osc_dispatch(&mut self, data: &[u8], truncated: bool) {
            self.events.push(Event::Osc {
                data: data.to_vec(),
                truncated,
            });
        }
        fn dcs_start(&mut self, _args: &CsiArgs, _flags: CsiFlags) {
            self.events.push(Event::DcsStart);
        }
        fn dcs_data(&mut self, cp: u32) {
            self.events.push(Event::DcsData(cp));
        }
        fn dcs_end(&mut self) {
            self.events.push(Event::DcsEnd);
        }
    }

    fn parse(input: &[u8]) -> Vec<Event> {
        let mut parser = VtParser::new();
        let mut rec = Recorder::default();
        for &b in input {
            parser.advance(b as u32, &mut rec);
        }
        rec.events
    }

    #[test]
    fn plain_print_and_execute() {
        assert_eq!(
            parse(b"hi\x07"),
            vec![Event::Print('h'), Event::Print('i'), Event::Execute(0x07)]
        );
    }

    #[test]
    fn sgr_roundtrip() {
        assert_eq!(
            parse(b"\x1b[32mA\x1b[m"),
            vec![
                Event::Csi {
                    args: vec![32],
                    flags: CsiFlags::default(),
                    byte: b'm'
                },
                Event::Print('A'),
                Event::Csi {
                    args: vec![-1],
                    flags: CsiFlags::default(),
                    byte: b'm'
                },
            ]
        );
    }

    #[test]
    fn default_params_keep_sentinel() {
        assert_eq!(
            parse(b"\x1b[;5H"),
            vec![Event::Csi {
                args: vec![-1, 5],
                flags: CsiFlags::default(),
                byte: b'H'
            }]
        );
    }

    #[test]
    fn private_marker_sets_flag() {
        assert_eq!(
            parse(b"\x1b[?1049h"),
            vec![Event::Csi {
                args: vec![1049],
                flags: CsiFlags::WHAT,
                byte: b'h'
            }]
        );
    }

    #[test]
    fn intermediates_collect() {
        assert_eq!(
            parse(b"\x1b[!p"),
            vec![Event::Csi {
                args: vec![-1],
                flags: CsiFlags::BANG,
                byte: b'p'
            }]
        );
        assert_eq!(
            parse(b"\x1b(0"),
            vec![Event::Esc {
                flags: CsiFlags::POPEN,
                byte: b'0'
            }]
        );
    }

    #[test]
    fn params_saturate_and_cap() {
        // one huge value saturates rather than wrapping
        let events = parse(b"\x1b[4294967296m");
        match &events[0] {
            Event::Csi { args, .. } => assert!(args[0] >= 0xffff),
            other => panic!("unexpected {:?}", other),
        }

        // more than CSI_ARG_MAX parameters: the tail is dropped
        let events = parse(b"\x1b[1;2;3;4;5;6;7;8;9;10;11;12;13;14;15;16;17;18m");
        match &events[0] {
            Event::Csi { args, .. } => {
                assert_eq!(args.len(), CSI_ARG_MAX);
                assert_eq!(args[CSI_ARG_MAX - 1], 16);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn colon_aborts_csi() {
        // ':' is not supported in parameters and poisons the sequence
        assert_eq!(parse(b"\x1b[38:2:1:2:3mX"), vec![Event::Print('X')]);
    }

    #[test]
    fn osc_bel_and_st() {
        assert_eq!(
            parse(b"\x1b]0;hello\x07"),
            vec![Event::Osc {
                data: b"0;hello".to_vec(),
                truncated: false
            }]
        );
        // ESC \ pops out of the OSC string; the dispatch happens on the
        // ESC and the backslash dispatches as its own escape.
        assert_eq!(
            parse(b"\x1b]0;there\x1b\\"),
            vec![
                Event::Osc {
                    data: b"0;there".to_vec(),
                    truncated: false
                },
                Event::Esc {
                    flags: CsiFlags::default(),
                    byte: b'\\'
                },
            ]
        );
    }

    #[test]
    fn osc_truncates_at_limit() {
        let mut parser = VtParser::with_osc_limit(8);
        let mut rec = Recorder::default();
        for &b in b"\x1b]0;aaaaaaaaaaaaaaaa\x07" {
            parser.advance(b as u32, &mut rec);
        }
        assert_eq!(
            rec.events,
            vec![Event::Osc {
                data: b"0;aaaaaa".to_vec(),
                truncated: true
            }]
        );
    }

    #[test]
    fn osc_collects_wide_codepoints() {
        let mut parser = VtParser::new();
        let mut rec = Recorder::default();
        for &b in b"\x1b]2;" {
            parser.advance(b as u32, &mut rec);
        }
        parser.advance(0xe4 as u32, &mut rec); // 'ä' as a decoded codepoint
        parser.advance(0x07, &mut rec);
        assert_eq!(
            rec.events,
            vec![Event::Osc {
                data: "2;\u{e4}".as_bytes().to_vec(),
                truncated: false
            }]
        );
    }

    #[test]
    fn dcs_pass_hooks() {
        assert_eq!(
            parse(b"\x1bP1$qm\x1b\\"),
            vec![
                Event::DcsStart,
                Event::DcsData(b'm' as u32),
                Event::DcsEnd,
                Event::Esc {
                    flags: CsiFlags::default(),
                    byte: b'\\'
                },
            ]
        );
    }

    #[test]
    fn st_ignore_swallows_apc() {
        assert_eq!(
            parse(b"\x1b_Gpayload\x1b\\A"),
            vec![
                Event::Esc {
                    flags: CsiFlags::default(),
                    byte: b'\\'
                },
                Event::Print('A'),
            ]
        );
    }

    #[test]
    fn can_aborts_sequence() {
        assert_eq!(
            parse(b"\x1b[12\x18X"),
            vec![Event::Execute(0x18), Event::Print('X')]
        );
    }

    #[test]
    fn esc_inside_esc_clears() {
        // the second ESC re-enters the escape state and re-runs CLEAR
        assert_eq!(
            parse(b"\x1b(\x1b(B"),
            vec![Event::Esc {
                flags: CsiFlags::POPEN,
                byte: b'B'
            }]
        );
    }

    #[test]
    fn c1_csi_entry() {
        assert_eq!(
            parse(&[0x9b, b'5', b'A']),
            vec![Event::Csi {
                args: vec![5],
                flags: CsiFlags::default(),
                byte: b'A'
            }]
        );
    }

    #[test]
    fn wide_codepoints_print_in_ground() {
        let mut parser = VtParser::new();
        let mut rec = Recorder::default();
        parser.advance(0x4e16, &mut rec);
        assert_eq!(rec.events, vec![Event::Print('\u{4e16}')]);
    }
}
