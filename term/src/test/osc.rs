use super::TestTerm;
use k9::assert_equal as assert_eq;

#[test]
fn title_via_bel() {
    let mut t = TestTerm::new(4, 1);
    t.feed(b"\x1b]0;hello world\x07");
    assert_eq!(t.host.title.as_deref(), Some("hello world"));
    assert!(t.host.osc.is_empty());
}

#[test]
fn title_via_st() {
    let mut t = TestTerm::new(4, 1);
    t.feed(b"\x1b]2;other\x1b\\");
    assert_eq!(t.host.title.as_deref(), Some("other"));
}

#[test]
fn unknown_kind_forwards_to_host() {
    let mut t = TestTerm::new(4, 1);
    t.feed(b"\x1b]52;c;aGVsbG8=\x07");
    assert_eq!(t.host.osc.len(), 1);
    assert_eq!(t.host.osc[0].0, b"52;c;aGVsbG8=".to_vec());
    assert!(!t.host.osc[0].1);
}

#[test]
fn oversized_osc_reports_truncation() {
    let mut t = TestTerm::new(4, 1);
    let mut seq = b"\x1b]52;".to_vec();
    seq.extend(std::iter::repeat(b'x').take(600));
    seq.push(0x07);
    t.feed(&seq);
    assert_eq!(t.host.osc.len(), 1);
    let (data, truncated) = &t.host.osc[0];
    assert!(truncated);
    assert_eq!(data.len(), 256);
}

#[test]
fn osc_does_not_disturb_screen() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"ab\x1b]0;t\x07cd");
    assert_eq!(t.row(0), "abcd____");
}

#[test]
fn empty_osc_is_silent() {
    let mut t = TestTerm::new(4, 1);
    t.feed(b"\x1b]\x07");
    assert!(t.host.osc.is_empty());
    assert_eq!(t.host.title, None);
}
