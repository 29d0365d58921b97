use super::TestTerm;
use k9::assert_equal as assert_eq;

use crate::cell::AttrFlags;

#[test]
fn truecolor_foreground() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[38;2;10;20;30mQ");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [10, 20, 30]);
}

#[test]
fn truecolor_background() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[48;2;7;8;9mQ");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.bg, [7, 8, 9]);
}

#[test]
fn indexed_256_cube_and_grey() {
    let mut t = TestTerm::new(8, 1);
    // 196 = 16 + 36*5 => pure red at cube level 5
    t.feed(b"\x1b[38;5;196mR");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [255, 0, 0]);

    t.feed(b"\x1b[38;5;244mG");
    let v = (244u32 - 232) as u8 * 10 + 8;
    assert_eq!(t.screen.cell_at(1, 0).unwrap().attr.fg, [v, v, v]);
}

#[test]
fn indexed_256_low_codes_use_palette() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[38;5;1mX");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [205, 0, 0]);
}

#[test]
fn basic_attributes_toggle() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[1;3;4;5;7;9mX\x1b[0mY");
    let x = t.screen.cell_at(0, 0).unwrap().attr;
    assert!(x.has(AttrFlags::BOLD));
    assert!(x.has(AttrFlags::ITALIC));
    assert!(x.has(AttrFlags::UNDERLINE));
    assert!(x.has(AttrFlags::BLINK));
    assert!(x.has(AttrFlags::INVERSE));
    assert!(x.has(AttrFlags::STRIKETHROUGH));

    let y = t.screen.cell_at(1, 0).unwrap().attr;
    assert_eq!(y.flags, AttrFlags::default());
}

#[test]
fn bold_promotes_dark_indexed_foreground() {
    let mut t = TestTerm::new(8, 1);
    // red (index 1) with bold renders as light red (index 9)
    t.feed(b"\x1b[31;1mX");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [255, 0, 0]);
}

#[test]
fn bold_leaves_truecolor_alone() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[38;2;10;10;10;1mX");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [10, 10, 10]);
}

#[test]
fn faint_halves_foreground() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[37;2mX");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [114, 114, 114]);
}

#[test]
fn default_fg_bg_restore() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[31;42mA\x1b[39mB\x1b[49mC");
    let b = t.screen.cell_at(1, 0).unwrap().attr;
    assert_eq!(b.fg, [229, 229, 229]);
    assert_eq!(b.bg, [0, 205, 0]);
    let c = t.screen.cell_at(2, 0).unwrap().attr;
    assert_eq!(c.bg, [0, 0, 0]);
}

#[test]
fn bright_family() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[94mX\x1b[104mY");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [92, 92, 255]);
    assert_eq!(t.screen.cell_at(1, 0).unwrap().attr.bg, [92, 92, 255]);
}

#[test]
fn bare_sgr_resets() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[31m\x1b[mX");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [229, 229, 229]);
}

#[test]
fn malformed_extended_color_is_ignored() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[38;9mX");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().attr.fg, [229, 229, 229]);
}

#[test]
fn protect_bit_survives_selective_erase() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"a\x1b[8mP\x1b[28mb");
    t.feed(b"\x1b[?2J");
    assert_eq!(t.row(0), "_P______");
}
