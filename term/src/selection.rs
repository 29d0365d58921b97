//! Mouse-driven selection over the visible grid and scrollback.
//!
//! The renderer calls [`Screen::selection_start`] on button-down and
//! [`Screen::selection_target`] while the button is held; both take
//! viewport coordinates.  The start endpoint cannot be repositioned by
//! the caller afterwards: scrolling and eviction move it along under
//! the hood, which is why endpoints anchor to arena handles instead of
//! row numbers once they leave the live grid.

use crate::screen::{Screen, SelectionPos, SELECTION_TOP};
use crate::utf8;

impl Screen {
    /// Map viewport coordinates onto an endpoint: rows covered by the
    /// history view anchor to their scrollback line, rows below that
    /// anchor to the live grid.
    fn selection_pos(&self, x: usize, y: usize) -> SelectionPos {
        let mut sel = SelectionPos {
            line: None,
            x,
            y: y as i32,
        };

        if let Some(pos) = self.sb.pos {
            let visible_sb = self.sb.len() - pos;
            if y < visible_sb {
                sel.line = self.sb.order.get(pos + y).copied();
                sel.y = 0;
            } else {
                sel.y = (y - visible_sb) as i32;
            }
        }

        sel
    }

    pub fn selection_reset(&mut self) {
        self.inc_age();
        self.age = self.age_cnt;
        self.sel_active = false;
    }

    pub fn selection_active(&self) -> bool {
        self.sel_active
    }

    pub fn selection_start(&mut self, x: usize, y: usize) {
        self.inc_age();
        self.age = self.age_cnt;

        self.sel_active = true;
        self.sel_start = self.selection_pos(x, y);
        self.sel_end = self.sel_start;
    }

    pub fn selection_target(&mut self, x: usize, y: usize) {
        if !self.sel_active {
            return;
        }
        self.inc_age();
        self.age = self.age_cnt;

        self.sel_end = self.selection_pos(x, y);
    }

    /// Order the two endpoints.  History lines order by `sb_id`, live
    /// positions by row then column; a dangling or TOP endpoint sorts
    /// before everything.
    fn ordered_endpoints(&self) -> (SelectionPos, SelectionPos) {
        let start = self.sel_start;
        let end = self.sel_end;

        let rank = |sel: &SelectionPos| -> (u8, u64, i64, i64) {
            match sel.line {
                Some(r) => match self.sb.sb_id(r) {
                    Some(id) => (1, id, 0, sel.x as i64),
                    None => (0, 0, 0, 0),
                },
                None => {
                    if sel.y == SELECTION_TOP {
                        (0, 0, 0, 0)
                    } else {
                        (2, 0, sel.y as i64, sel.x as i64)
                    }
                }
            }
        };

        if rank(&start) <= rank(&end) {
            (start, end)
        } else {
            (end, start)
        }
    }

    /// Copy the selected region as UTF-8, one `\n` between rows.  Blank
    /// cells inside the selection contribute spaces.
    pub fn selection_copy(&self) -> Option<String> {
        if !self.sel_active {
            return None;
        }

        let (start, end) = self.ordered_endpoints();

        // both endpoints above all history: nothing to copy
        if start.line.is_none()
            && start.y == SELECTION_TOP
            && end.line.is_none()
            && end.y == SELECTION_TOP
        {
            return Some(String::new());
        }

        let mut out = String::new();

        let copy_span = |out: &mut String, cells: &crate::line::Line, from: usize, to: usize| {
            let to = to.min(cells.len().saturating_sub(1));
            for x in from..=to {
                let cell = match cells.cell(x) {
                    Some(c) => c,
                    None => break,
                };
                if cell.width == 0 {
                    // continuation column of a wide glyph
                    continue;
                }
                if cell.ch == 0 {
                    out.push(' ');
                    continue;
                }
                for &cp in self.symbols.get(&cell.ch) {
                    let mut buf = [0u8; 4];
                    let len = utf8::encode(cp, &mut buf);
                    if len > 0 {
                        out.push_str(std::str::from_utf8(&buf[..len]).unwrap_or(" "));
                    }
                }
            }
        };

        // history portion: from the start line (or the very first line
        // when the start is above all history) up to the end anchor or
        // the live screen
        let start_idx = match start.line {
            Some(r) => self.sb.order.iter().position(|&o| o == r),
            None if start.y == SELECTION_TOP => {
                if self.sb.len() > 0 {
                    Some(0)
                } else {
                    None
                }
            }
            None => None,
        };

        let end_ref = end.line;
        let mut ended_in_sb = false;

        if let Some(first) = start_idx {
            for idx in first..self.sb.len() {
                let r = self.sb.order[idx];
                let line = match self.sb.arena.get(r) {
                    Some(line) => line,
                    None => continue,
                };

                let from = if Some(r) == start.line { start.x } else { 0 };
                let is_end = Some(r) == end_ref;
                let to = if is_end { end.x } else { line.len() - 1 };

                copy_span(&mut out, line, from, to);

                if is_end {
                    ended_in_sb = true;
                    break;
                }
                out.push('\n');
            }
        }

        // live portion
        if !ended_in_sb && end.line.is_none() && end.y >= 0 {
            let first_live = if start.line.is_some() || start.y == SELECTION_TOP {
                0
            } else {
                start.y as usize
            };

            for y in first_live..self.size_y {
                if y as i32 > end.y {
                    break;
                }
                let line = &self.lines()[y];
                let from = if start.line.is_none() && start.y == y as i32 {
                    start.x
                } else {
                    0
                };
                let to = if end.y == y as i32 {
                    end.x
                } else {
                    self.size_x - 1
                };

                copy_span(&mut out, line, from, to.min(self.size_x - 1));

                if end.y == y as i32 {
                    break;
                }
                out.push('\n');
            }
        }

        Some(out)
    }

    /// Expand from a cell to the surrounding word: contiguous non-blank,
    /// non-space symbols on the given live row.  Used for double-click
    /// selection.
    pub fn get_word(&self, x: usize, y: usize) -> Option<(usize, usize, usize, usize)> {
        if x >= self.size_x || y >= self.size_y {
            return None;
        }

        let line = &self.lines()[y];
        let is_word = |x: usize| -> bool {
            match line.cell(x) {
                Some(c) => c.width != 0 && c.ch != 0 && c.ch != b' ' as u32 && c.ch != 0xa0,
                None => false,
            }
        };

        if !is_word(x) {
            return None;
        }

        let mut sx = x;
        while sx > 0 && is_word(sx - 1) {
            sx -= 1;
        }
        let mut ex = x;
        while ex + 1 < self.size_x && is_word(ex + 1) {
            ex += 1;
        }

        Some((sx, y, ex, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellAttributes;
    use crate::screen::ScreenFlags;

    fn screen(cols: usize, rows: usize) -> Screen {
        let mut s = Screen::with_size(cols, rows, CellAttributes::default()).unwrap();
        s.set_flags(ScreenFlags::AUTO_WRAP);
        s
    }

    fn write_line(s: &mut Screen, text: &str) {
        let attr = s.def_attr();
        for c in text.chars() {
            s.write(c as u32, &attr);
        }
    }

    #[test]
    fn copy_within_one_row() {
        let mut s = screen(10, 2);
        write_line(&mut s, "hello there");
        s.selection_start(0, 0);
        s.selection_target(4, 0);
        assert_eq!(s.selection_copy().unwrap(), "hello");
    }

    #[test]
    fn copy_is_endpoint_order_independent() {
        let mut s = screen(10, 2);
        write_line(&mut s, "abcdef");
        s.selection_start(3, 0);
        s.selection_target(1, 0);
        assert_eq!(s.selection_copy().unwrap(), "bcd");
    }

    #[test]
    fn copy_spans_rows_with_newline() {
        let mut s = screen(4, 2);
        write_line(&mut s, "aaaabb");
        s.selection_start(2, 0);
        s.selection_target(1, 1);
        assert_eq!(s.selection_copy().unwrap(), "aa\nbb");
    }

    #[test]
    fn blank_cells_copy_as_spaces() {
        let mut s = screen(6, 1);
        write_line(&mut s, "a");
        s.move_to(3, 0);
        write_line(&mut s, "b");
        s.selection_start(0, 0);
        s.selection_target(3, 0);
        assert_eq!(s.selection_copy().unwrap(), "a  b");
    }

    #[test]
    fn selection_follows_line_into_scrollback() {
        let mut s = screen(4, 2);
        s.set_max_sb(10);
        write_line(&mut s, "sel!");
        s.selection_start(0, 0);
        s.selection_target(3, 0);
        // scroll the selected row into history
        s.scroll_up(1);
        assert_eq!(s.selection_copy().unwrap(), "sel!");
    }

    #[test]
    fn eviction_clears_dangling_endpoint() {
        let mut s = screen(4, 2);
        s.set_max_sb(1);
        write_line(&mut s, "one!");
        s.selection_start(0, 0);
        s.selection_target(3, 0);
        s.scroll_up(1); // "one!" now the only sb line
        s.scroll_up(1); // evicts it; endpoints fall back to TOP
        let copied = s.selection_copy().unwrap();
        // the anchor is gone; the copy starts from the top of history
        assert!(!copied.contains("one!"));
    }

    #[test]
    fn no_selection_copies_nothing() {
        let s = screen(4, 2);
        assert!(s.selection_copy().is_none());
    }

    #[test]
    fn word_expansion() {
        let mut s = screen(16, 1);
        write_line(&mut s, "one two three");
        assert_eq!(s.get_word(5, 0), Some((4, 0, 6, 0)));
        assert_eq!(s.get_word(3, 0), None);
        assert_eq!(s.get_word(0, 0), Some((0, 0, 2, 0)));
    }

    #[test]
    fn selection_reset_clears() {
        let mut s = screen(4, 1);
        write_line(&mut s, "abcd");
        s.selection_start(0, 0);
        s.selection_target(3, 0);
        s.selection_reset();
        assert!(!s.selection_active());
        assert!(s.selection_copy().is_none());
    }
}
