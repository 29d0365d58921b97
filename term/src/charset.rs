//! G0..G3 character set tables.
//!
//! A charset maps the 94/96 printable positions (GL 0x20..0x7E, GR
//! 0xA0..0xFE) to output symbols.  Only ASCII, DEC special graphics and
//! DEC supplemental are real tables; the national designators all alias
//! to the upper table until dedicated glyph data exists.

use crate::symbols::Symbol;
use std::collections::HashMap;

/// Index with `value - 0x20` for GL lookups, `value - 0xA0` for GR.
pub type Charset = [Symbol; 96];

const fn identity(base: u32) -> Charset {
    let mut t = [0u32; 96];
    let mut i = 0;
    while i < 96 {
        t[i] = base + i as u32;
        i += 1;
    }
    t
}

const fn dec_special() -> Charset {
    let mut t = identity(0x20);
    t[0x5f - 0x20] = 0x20; // blank
    t[0x60 - 0x20] = 0x25c6; // diamond
    t[0x61 - 0x20] = 0x2592; // checkerboard
    t[0x62 - 0x20] = 0x2409; // HT
    t[0x63 - 0x20] = 0x240c; // FF
    t[0x64 - 0x20] = 0x240d; // CR
    t[0x65 - 0x20] = 0x240a; // LF
    t[0x66 - 0x20] = 0x00b0; // degree
    t[0x67 - 0x20] = 0x00b1; // plus/minus
    t[0x68 - 0x20] = 0x2424; // NL
    t[0x69 - 0x20] = 0x240b; // VT
    t[0x6a - 0x20] = 0x2518; // lower-right corner
    t[0x6b - 0x20] = 0x2510; // upper-right corner
    t[0x6c - 0x20] = 0x250c; // upper-left corner
    t[0x6d - 0x20] = 0x2514; // lower-left corner
    t[0x6e - 0x20] = 0x253c; // crossing lines
    t[0x6f - 0x20] = 0x23ba; // scan line 1
    t[0x70 - 0x20] = 0x23bb; // scan line 3
    t[0x71 - 0x20] = 0x2500; // horizontal line
    t[0x72 - 0x20] = 0x23bc; // scan line 7
    t[0x73 - 0x20] = 0x23bd; // scan line 9
    t[0x74 - 0x20] = 0x251c; // left tee
    t[0x75 - 0x20] = 0x2524; // right tee
    t[0x76 - 0x20] = 0x2534; // bottom tee
    t[0x77 - 0x20] = 0x252c; // top tee
    t[0x78 - 0x20] = 0x2502; // vertical line
    t[0x79 - 0x20] = 0x2264; // less than or equal
    t[0x7a - 0x20] = 0x2265; // greater than or equal
    t[0x7b - 0x20] = 0x03c0; // pi
    t[0x7c - 0x20] = 0x2260; // not equal
    t[0x7d - 0x20] = 0x00a3; // pound sign
    t[0x7e - 0x20] = 0x00b7; // centered dot
    t
}

/// GL positions map straight through.
pub static UNICODE_LOWER: Charset = identity(0x20);

/// GR positions (and the national-set alias target).
pub static UNICODE_UPPER: Charset = identity(0xa0);

pub static DEC_SPECIAL_GRAPHICS: Charset = dec_special();

/// DEC multinational supplemental; rendered with the Latin-1 block,
/// which is where practically all of it lives anyway.
pub static DEC_SUPPLEMENTAL_GRAPHICS: Charset = identity(0xa0);

lazy_static! {
    /// Final byte of a charset designation (after `( ) * +`) to table.
    /// National sets fall back to the upper table.
    pub static ref DESIGNATORS: HashMap<u8, &'static Charset> = {
        let mut map: HashMap<u8, &'static Charset> = HashMap::new();
        map.insert(b'B', &UNICODE_LOWER);
        map.insert(b'0', &DEC_SPECIAL_GRAPHICS);
        map.insert(b'<', &DEC_SUPPLEMENTAL_GRAPHICS);
        for &national in b"A4C5RQKYE6ZH7=" {
            map.insert(national, &UNICODE_UPPER);
        }
        map
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_drawing_positions() {
        assert_eq!(DEC_SPECIAL_GRAPHICS[(b'q' - 0x20) as usize], 0x2500);
        assert_eq!(DEC_SPECIAL_GRAPHICS[(b'x' - 0x20) as usize], 0x2502);
        assert_eq!(DEC_SPECIAL_GRAPHICS[(b'l' - 0x20) as usize], 0x250c);
        // letters outside the graphics block pass through
        assert_eq!(DEC_SPECIAL_GRAPHICS[(b'A' - 0x20) as usize], 'A' as u32);
    }

    #[test]
    fn designators_alias_nationals() {
        assert_eq!(DESIGNATORS[&b'B'][1], 0x21);
        assert_eq!(DESIGNATORS[&b'A'][1], 0xa1);
        assert_eq!(DESIGNATORS[&b'K'][1], 0xa1);
        assert!(DESIGNATORS.get(&b'X').is_none());
    }
}
