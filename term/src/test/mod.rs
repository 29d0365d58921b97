//! Behavioral tests driving the full byte-stream path: bytes in through
//! the vte, observable state out of the screen.

use crate::cell::CellAttributes;
use crate::color::Palette;
use crate::screen::Screen;
use crate::vte::{Vte, VteHost};

mod c0;
mod charset;
mod echo;
mod osc;
mod sgr;

pub(crate) struct TestHost {
    pub written: Vec<u8>,
    pub title: Option<String>,
    pub osc: Vec<(Vec<u8>, bool)>,
}

impl VteHost for TestHost {
    fn write(&mut self, data: &[u8]) {
        self.written.extend_from_slice(data);
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn osc_string(&mut self, data: &[u8], truncated: bool) {
        self.osc.push((data.to_vec(), truncated));
    }
}

/// A terminal wired to a capturing host.
pub(crate) struct TestTerm {
    pub screen: Screen,
    pub vte: Vte,
    pub host: TestHost,
}

impl TestTerm {
    pub fn new(cols: usize, rows: usize) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut screen = Screen::with_size(cols, rows, CellAttributes::default()).unwrap();
        let mut vte = Vte::new(Palette::named("default"));
        vte.reset(&mut screen);
        TestTerm {
            screen,
            vte,
            host: TestHost {
                written: Vec::new(),
                title: None,
                osc: Vec::new(),
            },
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.vte.input(bytes, &mut self.screen, &mut self.host);
    }

    /// Row content with `_` standing in for unset cells.
    pub fn row(&self, y: usize) -> String {
        (0..self.screen.width())
            .map(|x| {
                let cell = self.screen.cell_at(x, y).unwrap();
                if cell.ch == 0 {
                    '_'
                } else {
                    std::char::from_u32(cell.ch).unwrap_or('?')
                }
            })
            .collect()
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.screen.cursor()
    }
}

mod write {
    use super::TestTerm;
    use k9::assert_equal as assert_eq;

    #[test]
    fn plain_write_and_wrap() {
        let mut t = TestTerm::new(10, 2);
        t.feed(b"ABCDEFGHIJKL");
        assert_eq!(t.row(0), "ABCDEFGHIJ");
        assert_eq!(t.row(1), "KL________");
        assert_eq!(t.cursor(), (2, 1));
    }

    #[test]
    fn utf8_input_lands_as_codepoints() {
        let mut t = TestTerm::new(10, 1);
        t.feed("héllo".as_bytes());
        assert_eq!(t.row(0), "héllo_____");
    }

    #[test]
    fn invalid_utf8_becomes_replacement() {
        let mut t = TestTerm::new(6, 1);
        t.feed(&[0xc0, b'x']);
        assert_eq!(t.row(0), "\u{fffd}x____");
    }

    #[test]
    fn wide_glyph_occupies_two_columns() {
        let mut t = TestTerm::new(6, 1);
        t.feed("世y".as_bytes());
        assert_eq!(t.screen.cell_at(0, 0).unwrap().width, 2);
        assert_eq!(t.screen.cell_at(1, 0).unwrap().width, 0);
        assert_eq!(t.screen.cell_at(2, 0).unwrap().ch, 'y' as u32);
    }

    #[test]
    fn combining_mark_composes_with_previous_cell() {
        let mut t = TestTerm::new(6, 1);
        t.feed("e\u{0301}x".as_bytes());
        let cell = t.screen.cell_at(0, 0).unwrap();
        assert!(cell.ch > crate::symbols::UCS4_MAX);
        assert_eq!(
            t.screen.symbols().get(&cell.ch),
            &['e' as u32, 0x0301]
        );
        assert_eq!(t.screen.cell_at(1, 0).unwrap().ch, 'x' as u32);
    }

    #[test]
    fn scrollback_eviction_keeps_recent_ids() {
        let mut t = TestTerm::new(4, 2);
        t.screen.set_max_sb(3);
        for _ in 0..5 {
            t.screen.scroll_up(1);
        }
        assert_eq!(t.screen.sb_depth(), 3);
    }
}
