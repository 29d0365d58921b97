use super::TestTerm;
use k9::assert_equal as assert_eq;

use crate::vte::{KeyModifiers, Keysym};

#[test]
fn local_echo_off_by_default() {
    let mut t = TestTerm::new(8, 1);
    let TestTerm { screen, vte, host } = &mut t;
    vte.handle_keyboard(
        Keysym::Char('a'),
        KeyModifiers::default(),
        Some('a' as u32),
        screen,
        host,
    );
    assert_eq!(t.row(0), "________");
}

#[test]
fn srm_reset_echoes_keys_to_screen() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[12l");
    let TestTerm { screen, vte, host } = &mut t;
    vte.handle_keyboard(
        Keysym::Char('h'),
        KeyModifiers::default(),
        Some('h' as u32),
        screen,
        host,
    );
    vte.handle_keyboard(
        Keysym::Char('i'),
        KeyModifiers::default(),
        Some('i' as u32),
        screen,
        host,
    );
    assert_eq!(t.row(0), "hi______");
    assert_eq!(t.host.written, b"hi");
}

#[test]
fn echoed_alt_key_shows_escape_effect() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[12l");
    let TestTerm { screen, vte, host } = &mut t;
    // Alt+b sends ESC b; the echoed ESC starts a real sequence locally
    vte.handle_keyboard(
        Keysym::Char('b'),
        KeyModifiers::ALT,
        Some('b' as u32),
        screen,
        host,
    );
    assert_eq!(t.host.written, b"\x1bb");
    // ESC b is a completed escape dispatch, nothing printed
    assert_eq!(t.row(0), "________");
}

#[test]
fn replies_are_not_echoed_mid_parse() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[12l");
    // DSR runs inside the parser; its reply must not feed back into
    // the screen even with local echo enabled
    t.feed(b"\x1b[6n");
    assert_eq!(t.row(0), "________");
    assert_eq!(t.host.written, b"\x1b[1;1R");
}

#[test]
fn echo_order_is_trigger_then_reply() {
    let mut t = TestTerm::new(8, 1);
    t.feed(b"\x1b[12l");
    let TestTerm { screen, vte, host } = &mut t;
    vte.handle_keyboard(
        Keysym::Char('x'),
        KeyModifiers::default(),
        Some('x' as u32),
        screen,
        host,
    );
    vte.handle_keyboard(
        Keysym::Return,
        KeyModifiers::default(),
        None,
        screen,
        host,
    );
    assert_eq!(t.host.written, b"x\x0d");
}
