//! List view widget: menus, completion popups, pickers.

use crate::TuiContext;
use atui_term::cell::AttrFlags;
use atui_term::vte::{KeyModifiers, Keysym};

bitflags::bitflags! {
    #[derive(Default)]
    pub struct EntryFlags: u8 {
        /// Checkmark in the left gutter.
        const CHECKED   = 0x01;
        /// `>` marker in the right gutter: activating descends.
        const HAS_SUB   = 0x02;
        /// Group separator; label ignored, never selectable.
        const SEPARATOR = 0x04;
        /// Visible but not selectable.
        const PASSIVE   = 0x08;
        /// Non-selectable but rendered as a prominent heading.
        const LABEL     = 0x10;
        /// Skipped entirely until the next `dirty`.
        const HIDE      = 0x20;
    }
}

#[derive(Debug, Clone)]
pub struct ListEntry {
    pub label: String,
    /// Single-codepoint shortcut that activates the entry directly.
    pub shortcut: Option<char>,
    pub flags: EntryFlags,
    pub indent: u8,
    /// Caller reference carried back on activation.
    pub tag: u64,
}

impl ListEntry {
    pub fn new(label: &str, tag: u64) -> Self {
        ListEntry {
            label: label.to_string(),
            shortcut: None,
            flags: EntryFlags::default(),
            indent: 0,
            tag,
        }
    }

    fn selectable(&self) -> bool {
        !self
            .flags
            .intersects(EntryFlags::SEPARATOR | EntryFlags::PASSIVE | EntryFlags::LABEL | EntryFlags::HIDE)
    }

    fn visible(&self) -> bool {
        !self.flags.contains(EntryFlags::HIDE)
    }
}

/// Widget outcome, polled after each input pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStatus {
    Pending,
    /// Index into the entry slice of the activated item.
    Activated(usize),
    Cancelled,
}

pub struct ListWnd {
    entries: Vec<ListEntry>,
    /// Selected index into `entries`.
    pos: usize,
    /// First visible entry index (scroll state).
    offset: usize,
    status: ListStatus,
    dirty: bool,
}

impl ListWnd {
    pub fn new(entries: Vec<ListEntry>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        let mut wnd = ListWnd {
            entries,
            pos: 0,
            offset: 0,
            status: ListStatus::Pending,
            dirty: true,
        };
        // land on the first selectable entry
        if !wnd.entries[0].selectable() {
            wnd.step(1);
        }
        Some(wnd)
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [ListEntry] {
        &mut self.entries
    }

    /// Selected entry index.
    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        if pos < self.entries.len() && self.entries[pos].selectable() {
            self.pos = pos;
            self.dirty = true;
        }
    }

    /// Flag the list for re-rendering after entry mutation.
    pub fn dirty(&mut self) {
        self.dirty = true;
    }

    /// Read and clear the activation state.
    pub fn status(&mut self) -> ListStatus {
        std::mem::replace(&mut self.status, ListStatus::Pending)
    }

    /// Move the selection by whole selectable steps in `dir` (-1/1),
    /// skipping separators, labels and hidden entries.
    fn step(&mut self, dir: i32) {
        let len = self.entries.len() as i32;
        let mut candidate = self.pos as i32;

        loop {
            candidate += dir;
            if candidate < 0 || candidate >= len {
                return; // no wraparound, matches menu conventions
            }
            if self.entries[candidate as usize].selectable() {
                self.pos = candidate as usize;
                self.dirty = true;
                return;
            }
        }
    }

    fn page(&mut self, dir: i32, rows: usize) {
        for _ in 0..rows.max(1) {
            self.step(dir);
        }
    }

    fn first_selectable(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.selectable())
    }

    fn last_selectable(&self) -> Option<usize> {
        self.entries.iter().rposition(|e| e.selectable())
    }

    /// Route one key at the widget.  Returns true when consumed.
    pub fn input_key(&mut self, sym: Keysym, _mods: KeyModifiers, rows: usize) -> bool {
        match sym {
            Keysym::Up => {
                self.step(-1);
                true
            }
            Keysym::Down => {
                self.step(1);
                true
            }
            Keysym::PageUp => {
                self.page(-1, rows);
                true
            }
            Keysym::PageDown => {
                self.page(1, rows);
                true
            }
            Keysym::Home => {
                if let Some(first) = self.first_selectable() {
                    self.pos = first;
                    self.dirty = true;
                }
                true
            }
            Keysym::End => {
                if let Some(last) = self.last_selectable() {
                    self.pos = last;
                    self.dirty = true;
                }
                true
            }
            Keysym::Return | Keysym::KpEnter => {
                if self.entries[self.pos].selectable() {
                    self.status = ListStatus::Activated(self.pos);
                }
                true
            }
            Keysym::Escape => {
                self.status = ListStatus::Cancelled;
                true
            }
            Keysym::Char(c) => self.shortcut(c),
            _ => false,
        }
    }

    fn shortcut(&mut self, c: char) -> bool {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.selectable() && e.shortcut == Some(c))
        {
            self.pos = idx;
            self.status = ListStatus::Activated(idx);
            self.dirty = true;
            return true;
        }
        false
    }

    /// Mouse click in widget coordinates; row maps through the current
    /// scroll offset.  The offset counts visible entries, so hidden
    /// ones are filtered out before it applies.
    pub fn input_click(&mut self, row: usize) -> bool {
        let mut visible = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.visible())
            .skip(self.offset);

        if let Some((idx, entry)) = visible.nth(row) {
            if entry.selectable() {
                self.pos = idx;
                self.status = ListStatus::Activated(idx);
                self.dirty = true;
            }
            return true;
        }
        false
    }

    /// Render into the context if anything changed.  The selected row
    /// inverts; gutters carry the check and submenu markers.
    pub fn draw(&mut self, ctx: &mut TuiContext) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let rows = ctx.screen().height();
        let cols = ctx.screen().width();

        // keep the selection in the window
        let visible_before_pos = self.entries[..self.pos].iter().filter(|e| e.visible()).count();
        if visible_before_pos < self.offset {
            self.offset = visible_before_pos;
        } else if visible_before_pos >= self.offset + rows {
            self.offset = visible_before_pos + 1 - rows;
        }

        ctx.screen_mut().erase_screen(false);

        let base = ctx.screen().def_attr();
        let mut row = 0;
        for (idx, entry) in self.entries.iter().enumerate() {
            if !entry.visible() {
                continue;
            }
            let visible_idx = self.entries[..idx].iter().filter(|e| e.visible()).count();
            if visible_idx < self.offset {
                continue;
            }
            if row >= rows {
                break;
            }

            ctx.screen_mut().move_to(0, row);

            let mut attr = base;
            if idx == self.pos {
                attr.set(AttrFlags::INVERSE, true);
            }
            if entry.flags.contains(EntryFlags::LABEL) {
                attr.set(AttrFlags::BOLD, true);
            }

            let mut text = String::new();
            if entry.flags.contains(EntryFlags::SEPARATOR) {
                for _ in 0..cols {
                    text.push('─');
                }
            } else {
                text.push(if entry.flags.contains(EntryFlags::CHECKED) {
                    '✓'
                } else {
                    ' '
                });
                for _ in 0..entry.indent {
                    text.push(' ');
                }
                text.push_str(&entry.label);

                let used = text.chars().count();
                let tail = if entry.flags.contains(EntryFlags::HAS_SUB) {
                    '>'
                } else {
                    ' '
                };
                for _ in used..cols.saturating_sub(1) {
                    text.push(' ');
                }
                text.push(tail);
            }

            let clipped: String = text.chars().take(cols).collect();
            for c in clipped.chars() {
                ctx.screen_mut().write(c as u32, &attr);
            }

            row += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoHandlers, TuiConfig, TuiContext};

    fn entries() -> Vec<ListEntry> {
        let mut sep = ListEntry::new("", 0);
        sep.flags = EntryFlags::SEPARATOR;

        let mut quit = ListEntry::new("quit", 3);
        quit.shortcut = Some('q');

        vec![
            ListEntry::new("open", 1),
            ListEntry::new("save", 2),
            sep,
            quit,
        ]
    }

    #[test]
    fn navigation_skips_separators() {
        let mut wnd = ListWnd::new(entries()).unwrap();
        assert_eq!(wnd.tell(), 0);
        wnd.input_key(Keysym::Down, KeyModifiers::default(), 10);
        assert_eq!(wnd.tell(), 1);
        // stepping over the separator lands on "quit"
        wnd.input_key(Keysym::Down, KeyModifiers::default(), 10);
        assert_eq!(wnd.tell(), 3);
        // no wraparound at the end
        wnd.input_key(Keysym::Down, KeyModifiers::default(), 10);
        assert_eq!(wnd.tell(), 3);
    }

    #[test]
    fn return_activates() {
        let mut wnd = ListWnd::new(entries()).unwrap();
        wnd.input_key(Keysym::Return, KeyModifiers::default(), 10);
        assert_eq!(wnd.status(), ListStatus::Activated(0));
        // status is flushed by reading it
        assert_eq!(wnd.status(), ListStatus::Pending);
    }

    #[test]
    fn escape_cancels() {
        let mut wnd = ListWnd::new(entries()).unwrap();
        wnd.input_key(Keysym::Escape, KeyModifiers::default(), 10);
        assert_eq!(wnd.status(), ListStatus::Cancelled);
    }

    #[test]
    fn shortcut_jumps_and_activates() {
        let mut wnd = ListWnd::new(entries()).unwrap();
        assert!(wnd.input_key(Keysym::Char('q'), KeyModifiers::default(), 10));
        assert_eq!(wnd.status(), ListStatus::Activated(3));
        assert!(!wnd.input_key(Keysym::Char('z'), KeyModifiers::default(), 10));
    }

    #[test]
    fn hidden_entries_are_unreachable() {
        let mut list = entries();
        list[1].flags |= EntryFlags::HIDE;
        let mut wnd = ListWnd::new(list).unwrap();
        wnd.input_key(Keysym::Down, KeyModifiers::default(), 10);
        assert_eq!(wnd.tell(), 3);
    }

    #[test]
    fn draw_marks_selection() {
        let config = TuiConfig {
            cols: 12,
            rows: 6,
            ..TuiConfig::default()
        };
        let mut ctx = TuiContext::new(config, Box::new(NoHandlers)).unwrap();
        let mut wnd = ListWnd::new(entries()).unwrap();
        wnd.draw(&mut ctx);

        // row 0 selected: inverse attribute set on its cells
        let attr = ctx.screen().cell_at(1, 0).unwrap().attr;
        assert!(attr.has(AttrFlags::INVERSE));
        let attr = ctx.screen().cell_at(1, 1).unwrap().attr;
        assert!(!attr.has(AttrFlags::INVERSE));

        // separator row renders a rule
        assert_eq!(ctx.screen().cell_at(0, 2).unwrap().ch, '─' as u32);
    }

    #[test]
    fn click_activates_visible_row() {
        let mut wnd = ListWnd::new(entries()).unwrap();
        assert!(wnd.input_click(3));
        assert_eq!(wnd.status(), ListStatus::Activated(3));
    }

    #[test]
    fn click_respects_scroll_with_hidden_entries() {
        let mut hidden = ListEntry::new("gone", 0);
        hidden.flags = EntryFlags::HIDE;
        let list = vec![
            hidden,
            ListEntry::new("a", 1),
            ListEntry::new("b", 2),
            ListEntry::new("c", 3),
            ListEntry::new("d", 4),
        ];

        let config = TuiConfig {
            cols: 8,
            rows: 2,
            ..TuiConfig::default()
        };
        let mut ctx = TuiContext::new(config, Box::new(NoHandlers)).unwrap();

        let mut wnd = ListWnd::new(list).unwrap();
        // selecting the last entry scrolls the two-row window down
        wnd.set_pos(4);
        wnd.draw(&mut ctx);

        // top visible row is now "c"; a click there must not resolve
        // through the hidden entry's raw index
        assert!(wnd.input_click(0));
        assert_eq!(wnd.status(), ListStatus::Activated(3));
    }
}
