// Transition tables for the state machine, built from the DEC ANSI
// parser diagram (https://vt100.net/emu/dec_ansi_parser) with the usual
// xterm deviations: SOS/PM/APC collapse into StIgnore, and C1 controls
// act from any state.

use crate::enums::{Action, State, STATE_NUM};

/// Apply all u8 values to `fn(u8) -> u16`, return `[u16; 256]`.
macro_rules! define_table {
    ( $func:tt ) => {{
        const fn gen() -> [u16; 256] {
            let mut arr = [0; 256];

            let mut i = 0;
            while i < 256 {
                arr[i] = $func(i as u8);
                i += 1;
            }
            arr
        }
        gen()
    }};
}

/// Pack an action and a target state into one table entry.  A zero state
/// nibble means "hold current state, run only the transition action".
const fn pack(action: Action, state: State) -> u16 {
    ((action as u16) << 8) | (state as u16)
}

const fn hold(action: Action) -> u16 {
    (action as u16) << 8
}

/// Codepoints that transition regardless of the current state.  These run
/// before the per-state rules, so a C1 control aborts a half-finished
/// sequence (firing the exit action of the state it tears down).
const fn anywhere_or(i: u8, fallback: u16) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x18 | 0x1a => pack(Execute, Ground),
        0x80..=0x8f => pack(Execute, Ground),
        0x91..=0x97 => pack(Execute, Ground),
        0x99 | 0x9a | 0x9c => pack(Execute, Ground),
        0x1b => pack(None, Esc),
        0x98 | 0x9e | 0x9f => pack(None, StIgnore),
        0x90 => pack(None, DcsEntry),
        0x9d => pack(None, OscString),
        0x9b => pack(None, CsiEntry),
        _ => fallback,
    }
}

const fn ground(i: u8) -> u16 {
    use Action::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f => hold(Execute),
        0x20..=0x7f => hold(Print),
        _ => anywhere_or(i, hold(Print)),
    }
}

const fn esc(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f => hold(Execute),
        0x7f => hold(Ignore),
        0x20..=0x2f => pack(Collect, EscInt),
        0x30..=0x4f | 0x51..=0x57 | 0x59 | 0x5a | 0x5c | 0x60..=0x7e => {
            pack(EscDispatch, Ground)
        }
        0x5b => pack(None, CsiEntry),
        0x5d => pack(None, OscString),
        0x50 => pack(None, DcsEntry),
        0x58 | 0x5e | 0x5f => pack(None, StIgnore),
        _ => anywhere_or(i, pack(Collect, EscInt)),
    }
}

const fn esc_int(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f => hold(Execute),
        0x20..=0x2f => hold(Collect),
        0x7f => hold(Ignore),
        0x30..=0x7e => pack(EscDispatch, Ground),
        _ => anywhere_or(i, hold(Collect)),
    }
}

const fn csi_entry(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f => hold(Execute),
        0x7f => hold(Ignore),
        0x20..=0x2f => pack(Collect, CsiInt),
        0x3a => pack(None, CsiIgnore),
        0x30..=0x39 | 0x3b => pack(Param, CsiParam),
        0x3c..=0x3f => pack(Collect, CsiParam),
        0x40..=0x7e => pack(CsiDispatch, Ground),
        _ => anywhere_or(i, pack(None, CsiIgnore)),
    }
}

const fn csi_param(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f => hold(Execute),
        0x30..=0x39 | 0x3b => hold(Param),
        0x7f => hold(Ignore),
        0x3a | 0x3c..=0x3f => pack(None, CsiIgnore),
        0x20..=0x2f => pack(Collect, CsiInt),
        0x40..=0x7e => pack(CsiDispatch, Ground),
        _ => anywhere_or(i, pack(None, CsiIgnore)),
    }
}

const fn csi_int(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f => hold(Execute),
        0x20..=0x2f => hold(Collect),
        0x7f => hold(Ignore),
        0x30..=0x3f => pack(None, CsiIgnore),
        0x40..=0x7e => pack(CsiDispatch, Ground),
        _ => anywhere_or(i, pack(None, CsiIgnore)),
    }
}

const fn csi_ignore(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f => hold(Execute),
        0x20..=0x3f | 0x7f => hold(Ignore),
        0x40..=0x7e => pack(None, Ground),
        _ => anywhere_or(i, hold(Ignore)),
    }
}

const fn dcs_entry(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f | 0x7f => hold(Ignore),
        0x3a => pack(None, DcsIgnore),
        0x20..=0x2f => pack(Collect, DcsInt),
        0x30..=0x39 | 0x3b => pack(Param, DcsParam),
        0x3c..=0x3f => pack(Collect, DcsParam),
        0x40..=0x7e => pack(None, DcsPass),
        _ => anywhere_or(i, pack(None, DcsPass)),
    }
}

const fn dcs_param(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f | 0x7f => hold(Ignore),
        0x30..=0x39 | 0x3b => hold(Param),
        0x3a | 0x3c..=0x3f => pack(None, DcsIgnore),
        0x20..=0x2f => pack(Collect, DcsInt),
        0x40..=0x7e => pack(None, DcsPass),
        _ => anywhere_or(i, pack(None, DcsPass)),
    }
}

const fn dcs_int(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f | 0x7f => hold(Ignore),
        0x20..=0x2f => hold(Collect),
        0x30..=0x3f => pack(None, DcsIgnore),
        0x40..=0x7e => pack(None, DcsPass),
        _ => anywhere_or(i, pack(None, DcsPass)),
    }
}

const fn dcs_pass(i: u8) -> u16 {
    use Action::*;
    match i {
        0x00..=0x17 | 0x19 | 0x1c..=0x1f | 0x20..=0x7e => hold(DcsCollect),
        0x7f => hold(Ignore),
        _ => anywhere_or(i, hold(DcsCollect)),
    }
}

const fn dcs_ignore(i: u8) -> u16 {
    use Action::*;
    match i {
        0x00..=0x7f => hold(Ignore),
        _ => anywhere_or(i, hold(Ignore)),
    }
}

const fn osc_string(i: u8) -> u16 {
    use Action::*;
    use State::*;
    match i {
        0x00..=0x06 | 0x08..=0x17 | 0x19 | 0x1c..=0x1f => hold(Ignore),
        0x20..=0x7f => hold(OscCollect),
        // BEL terminates like ST; the exit action delivers the string.
        0x07 => pack(None, Ground),
        _ => anywhere_or(i, hold(OscCollect)),
    }
}

const fn st_ignore(i: u8) -> u16 {
    use Action::*;
    match i {
        0x00..=0x7f => hold(Ignore),
        _ => anywhere_or(i, hold(Ignore)),
    }
}

/// Row 0 is the reserved "no state" discriminant and never indexed.
pub(crate) static TRANSITIONS: [[u16; 256]; STATE_NUM] = [
    [0u16; 256],
    define_table!(ground),
    define_table!(esc),
    define_table!(esc_int),
    define_table!(csi_entry),
    define_table!(csi_param),
    define_table!(csi_int),
    define_table!(csi_ignore),
    define_table!(dcs_entry),
    define_table!(dcs_param),
    define_table!(dcs_int),
    define_table!(dcs_pass),
    define_table!(dcs_ignore),
    define_table!(osc_string),
    define_table!(st_ignore),
];

/// Transition applied to codepoints above 0xFF, which the byte tables
/// cannot index: every state treats them as its printable default.
pub(crate) static WIDE: [u16; STATE_NUM] = [
    0,
    hold(Action::Print),      // Ground
    pack(Action::Collect, State::EscInt),
    hold(Action::Collect),    // EscInt
    pack(Action::None, State::CsiIgnore),
    pack(Action::None, State::CsiIgnore),
    pack(Action::None, State::CsiIgnore),
    hold(Action::Ignore),     // CsiIgnore
    pack(Action::None, State::DcsPass),
    pack(Action::None, State::DcsPass),
    pack(Action::None, State::DcsPass),
    hold(Action::DcsCollect), // DcsPass
    hold(Action::Ignore),     // DcsIgnore
    hold(Action::OscCollect), // OscString
    hold(Action::Ignore),     // StIgnore
];

pub(crate) static ENTRY: [Action; STATE_NUM] = [
    Action::None,
    Action::None,     // Ground
    Action::Clear,    // Esc
    Action::None,     // EscInt
    Action::Clear,    // CsiEntry
    Action::None,     // CsiParam
    Action::None,     // CsiInt
    Action::None,     // CsiIgnore
    Action::Clear,    // DcsEntry
    Action::None,     // DcsParam
    Action::None,     // DcsInt
    Action::DcsStart, // DcsPass
    Action::None,     // DcsIgnore
    Action::OscStart, // OscString
    Action::None,     // StIgnore
];

pub(crate) static EXIT: [Action; STATE_NUM] = [
    Action::None,
    Action::None,   // Ground
    Action::None,   // Esc
    Action::None,   // EscInt
    Action::None,   // CsiEntry
    Action::None,   // CsiParam
    Action::None,   // CsiInt
    Action::None,   // CsiIgnore
    Action::None,   // DcsEntry
    Action::None,   // DcsParam
    Action::None,   // DcsInt
    Action::DcsEnd, // DcsPass
    Action::None,   // DcsIgnore
    Action::OscEnd, // OscString
    Action::None,   // StIgnore
];
