use super::TestTerm;
use k9::assert_equal as assert_eq;

#[test]
fn dec_special_graphics_box_drawing() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b(0lqk\x1b(B");
    assert_eq!(t.row(0), "┌─┐_____");
}

#[test]
fn designation_is_per_slot() {
    let mut t = TestTerm::new(8, 1);
    // G1 gets the graphics set; GL still points at G0
    t.feed(b"\x1b)0q");
    assert_eq!(t.row(0), "q_______");
    // SO shifts G1 in, SI back out
    t.feed(b"\x0eq\x0fq");
    assert_eq!(t.row(0), "q─q_____");
}

#[test]
fn ss2_is_single_shot() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b*0");    // G2 = graphics
    t.feed(b"\x1bNqq");   // SS2 applies to the first q only
    assert_eq!(t.row(0), "─q______");
}

#[test]
fn national_designators_alias_to_upper() {
    let mut t = TestTerm::new(8, 1);
    // British set aliases to the GR identity table
    t.feed(b"\x1b(Aa");
    assert_eq!(t.screen.cell_at(0, 0).unwrap().ch, 0xa0 + ('a' as u32 - 0x20));
}

#[test]
fn space_and_del_never_remap() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b(0");
    t.feed(b"q q");
    assert_eq!(t.row(0), "─ ─_____");
}
