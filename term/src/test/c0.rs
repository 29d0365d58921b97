use super::TestTerm;
use k9::assert_equal as assert_eq;

#[test]
fn cr_lf_moves_cursor() {
    let mut t = TestTerm::new(8, 3);
    t.feed(b"ab\r\ncd");
    assert_eq!(t.row(0), "ab______");
    assert_eq!(t.row(1), "cd______");
    assert_eq!(t.cursor(), (2, 1));
}

#[test]
fn lf_alone_keeps_column() {
    let mut t = TestTerm::new(8, 3);
    t.feed(b"ab\ncd");
    assert_eq!(t.row(1), "__cd____");
}

#[test]
fn lf_in_newline_mode_implies_cr() {
    let mut t = TestTerm::new(8, 3);
    t.feed(b"\x1b[20h");
    t.feed(b"ab\ncd");
    assert_eq!(t.row(1), "cd______");
}

#[test]
fn backspace_steps_left() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"abc\x08\x08X");
    assert_eq!(t.row(0), "aXc_____");
}

#[test]
fn tab_advances_to_ruler_stop() {
    let mut t = TestTerm::new(20, 1);
    t.feed(b"a\tb");
    assert_eq!(t.screen.cell_at(8, 0).unwrap().ch, 'b' as u32);
}

#[test]
fn lf_at_bottom_scrolls() {
    let mut t = TestTerm::new(4, 2);
    t.screen.set_max_sb(4);
    t.feed(b"one\r\ntwo\r\nxyz");
    assert_eq!(t.row(0), "two_");
    assert_eq!(t.row(1), "xyz_");
    assert_eq!(t.screen.sb_depth(), 1);
}

#[test]
fn enq_answers_ack() {
    let mut t = TestTerm::new(4, 1);
    t.feed(b"\x05");
    assert_eq!(t.host.written, b"\x06");
}

#[test]
fn sub_aborts_sequence_with_error_symbol() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[3\x1aZ");
    assert_eq!(t.row(0), "\u{bf}Z______");
}

#[test]
fn c1_nel_is_cr_lf() {
    let mut t = TestTerm::new(8, 2);
    // NEL as a decoded C1 codepoint (Latin-1 mode makes it a raw byte)
    t.feed(b"\x1b[62p"); // 8-bit mode via DECSCL
    t.feed(b"ab\x85cd");
    assert_eq!(t.row(1), "cd______");
}

#[test]
fn ri_scrolls_down_at_top() {
    let mut t = TestTerm::new(4, 2);
    // cursor sits at the top margin, so RI scrolls the content down
    t.feed(b"ab\x1bM");
    assert_eq!(t.row(0), "____");
    assert_eq!(t.row(1), "ab__");
    assert_eq!(t.cursor(), (2, 0));
}
