//! The screen: a grid of styled cells with margins, tab ruler, cursor,
//! alternate buffer, scrollback and damage ageing.
//!
//! Scrollback lines live in a generational arena and are referenced by
//! [`LineRef`] handles; eviction bumps the slot generation so a stale
//! handle (held by a selection endpoint) can never dereference another
//! line's storage.  Order within the scrollback is a deque of handles,
//! oldest first.

use crate::cell::{AttrFlags, Cell, CellAttributes};
use crate::line::Line;
use crate::symbols::{Symbol, SymbolTable};
use crate::{Age, Result, TermError};
use std::collections::VecDeque;

bitflags! {
    #[derive(Default)]
    pub struct ScreenFlags: u32 {
        /// Printing past the right edge wraps to the next row.
        const AUTO_WRAP   = 0x01;
        /// Cursor addressing is relative to the scroll margin.
        const REL_ORIGIN  = 0x02;
        /// Whole-screen video inversion (DECSCNM).
        const INVERSE     = 0x04;
        /// Writes shift the remainder of the row right.
        const INSERT_MODE = 0x08;
        /// Keep the scrollback view glued to its line during eviction.
        const FIXED_POS   = 0x10;
        /// The alternate buffer is displayed.
        const ALTERNATE   = 0x20;
    }
}

/// Selection endpoint ordinate meaning "above all visible history".
pub const SELECTION_TOP: i32 = -1;

/// Handle to a scrollback line.  Valid while the slot generation
/// matches; evicting the line invalidates every outstanding handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LineRef {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    line: Option<Line>,
}

#[derive(Debug, Default)]
pub(crate) struct LineArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl LineArena {
    fn alloc(&mut self, line: Line) -> LineRef {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.line = Some(line);
            return LineRef {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            line: Some(line),
        });
        LineRef {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Free the slot, invalidating all handles to it.
    fn release(&mut self, r: LineRef) {
        if let Some(slot) = self.slots.get_mut(r.index) {
            if slot.generation == r.generation && slot.line.is_some() {
                slot.line = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(r.index);
            }
        }
    }

    pub(crate) fn get(&self, r: LineRef) -> Option<&Line> {
        let slot = self.slots.get(r.index)?;
        if slot.generation != r.generation {
            return None;
        }
        slot.line.as_ref()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

/// History ring: handle deque plus the arena holding the line storage.
#[derive(Debug, Default)]
pub(crate) struct Scrollback {
    pub(crate) arena: LineArena,
    /// Eviction order, oldest first.  `sb_id` is strictly ascending.
    pub(crate) order: VecDeque<LineRef>,
    pub(crate) max: usize,
    /// Review position: index into `order` of the topmost visible
    /// history line, `None` when the live screen is shown.
    pub(crate) pos: Option<usize>,
    last_id: u64,
}

impl Scrollback {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn line(&self, idx: usize) -> Option<&Line> {
        self.order.get(idx).and_then(|r| self.arena.get(*r))
    }

    pub(crate) fn sb_id(&self, r: LineRef) -> Option<u64> {
        self.arena.get(r).map(|l| l.sb_id)
    }
}

/// One selection endpoint: anchored either to a scrollback line (which
/// it follows through further scrolling) or to a row of the live grid;
/// `y == SELECTION_TOP` with no line means "above all history".
#[derive(Debug, Copy, Clone, Default)]
pub struct SelectionPos {
    pub(crate) line: Option<LineRef>,
    pub(crate) x: usize,
    pub(crate) y: i32,
}

/// After `num` lines scrolled off the top, retarget a visible-anchored
/// endpoint: either it is still on screen (ordinate shifted) or it now
/// lives on one of the freshly promoted history lines.
fn anchor_sel_after_scroll(sel: &mut SelectionPos, num: usize, order: &VecDeque<LineRef>) {
    if sel.line.is_some() || sel.y < 0 {
        return;
    }
    sel.y -= num as i32;
    if sel.y >= 0 {
        return;
    }
    let steps = (-sel.y - 1) as usize;
    let len = order.len();
    sel.line = if steps < len {
        order.get(len - 1 - steps).copied()
    } else {
        None
    };
    sel.y = SELECTION_TOP;
}

/// Everything a renderer needs for one cell during a draw walk.
#[derive(Debug)]
pub struct DrawCell<'a> {
    pub ch: Symbol,
    /// Expanded codepoints; empty for blank cells so renderers can skip
    /// glyph lookup.
    pub chars: &'a [u32],
    pub width: u8,
    pub x: usize,
    pub y: usize,
    pub attr: CellAttributes,
    pub age: Age,
}

pub struct Screen {
    pub(crate) flags: ScreenFlags,
    pub(crate) def_attr: CellAttributes,

    pub(crate) age_cnt: Age,
    pub(crate) age_reset: bool,
    /// Whole-screen damage stamp.
    pub(crate) age: Age,

    pub(crate) size_x: usize,
    pub(crate) size_y: usize,
    pub(crate) margin_top: usize,
    pub(crate) margin_bottom: usize,

    pub(crate) main_lines: Vec<Line>,
    pub(crate) alt_lines: Vec<Line>,

    /// Highest row that has seen content; vertical shrink scrolls
    /// everything above this into history instead of dropping it.
    pub(crate) vanguard: i32,

    pub(crate) sb: Scrollback,

    pub(crate) cursor_x: usize,
    pub(crate) cursor_y: usize,

    pub(crate) tab_ruler: Vec<bool>,

    pub(crate) sel_active: bool,
    pub(crate) sel_start: SelectionPos,
    pub(crate) sel_end: SelectionPos,

    pub(crate) symbols: SymbolTable,
}

impl Screen {
    pub fn new(def_attr: CellAttributes) -> Self {
        Screen::with_size(80, 24, def_attr).expect("default geometry is valid")
    }

    pub fn with_size(cols: usize, rows: usize, def_attr: CellAttributes) -> Result<Self> {
        let mut screen = Screen {
            flags: ScreenFlags::default(),
            def_attr,
            age_cnt: 1,
            age_reset: false,
            age: 1,
            size_x: 0,
            size_y: 0,
            margin_top: 0,
            margin_bottom: 0,
            main_lines: Vec::new(),
            alt_lines: Vec::new(),
            vanguard: 0,
            sb: Scrollback::default(),
            cursor_x: 0,
            cursor_y: 0,
            tab_ruler: Vec::new(),
            sel_active: false,
            sel_start: SelectionPos::default(),
            sel_end: SelectionPos::default(),
            symbols: SymbolTable::new(),
        };
        screen.resize(cols, rows)?;
        Ok(screen)
    }

    /* ---- ageing ---- */

    #[inline]
    pub fn inc_age(&mut self) {
        self.age_cnt = self.age_cnt.wrapping_add(1);
        if self.age_cnt == 0 {
            self.age_reset = true;
            self.age_cnt = 1;
        }
    }

    pub fn age(&self) -> Age {
        self.age_cnt
    }

    /* ---- geometry accessors ---- */

    pub fn width(&self) -> usize {
        self.size_x
    }

    pub fn height(&self) -> usize {
        self.size_y
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_x, self.cursor_y)
    }

    pub fn margins(&self) -> (usize, usize) {
        (self.margin_top, self.margin_bottom)
    }

    pub fn flags(&self) -> ScreenFlags {
        self.flags
    }

    pub fn def_attr(&self) -> CellAttributes {
        self.def_attr
    }

    pub fn set_def_attr(&mut self, attr: &CellAttributes) {
        self.def_attr = *attr;
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Cell under the cursor (clamped into the grid).
    pub fn cursor_cell(&self) -> &Cell {
        let x = self.cursor_x.min(self.size_x - 1);
        let y = self.cursor_y.min(self.size_y - 1);
        &self.lines()[y].cells[x]
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Option<&Cell> {
        self.lines().get(y).and_then(|l| l.cell(x))
    }

    #[inline]
    pub(crate) fn lines(&self) -> &[Line] {
        if self.flags.contains(ScreenFlags::ALTERNATE) {
            &self.alt_lines
        } else {
            &self.main_lines
        }
    }

    #[inline]
    fn lines_vec_mut(&mut self) -> &mut Vec<Line> {
        if self.flags.contains(ScreenFlags::ALTERNATE) {
            &mut self.alt_lines
        } else {
            &mut self.main_lines
        }
    }

    #[inline]
    fn move_cursor(&mut self, x: usize, y: usize) {
        self.cursor_x = x;
        self.cursor_y = y;
    }

    fn blank_line(&self) -> Line {
        Line::new(self.size_x, &self.def_attr, self.age_cnt)
    }

    /// Clear a cell only when it differs from the blank state, so a
    /// redundant erase does not age it.
    fn cell_init_chg(cell: &mut Cell, def_attr: &CellAttributes, age: Age) {
        if cell.ch == 0 && cell.attr == *def_attr {
            return;
        }
        cell.init(def_attr, age);
    }

    /* ---- flags ---- */

    pub fn set_flags(&mut self, flags: ScreenFlags) {
        if flags.is_empty() {
            return;
        }
        self.inc_age();

        let old = self.flags;
        self.flags |= flags;

        if !old.contains(ScreenFlags::ALTERNATE) && flags.contains(ScreenFlags::ALTERNATE) {
            self.age = self.age_cnt;
        }
        if !old.contains(ScreenFlags::INVERSE) && flags.contains(ScreenFlags::INVERSE) {
            self.age = self.age_cnt;
        }
    }

    pub fn reset_flags(&mut self, flags: ScreenFlags) {
        if flags.is_empty() {
            return;
        }
        self.inc_age();

        let old = self.flags;
        self.flags &= !flags;

        if old.contains(ScreenFlags::ALTERNATE) && flags.contains(ScreenFlags::ALTERNATE) {
            self.age = self.age_cnt;
        }
        if old.contains(ScreenFlags::INVERSE) && flags.contains(ScreenFlags::INVERSE) {
            self.age = self.age_cnt;
        }
    }

    /* ---- margins and tabs ---- */

    /// 1-based inclusive bounds in DECSTBM convention; degenerate or
    /// out-of-range arguments select the full screen.
    pub fn set_margins(&mut self, top: usize, bottom: usize) {
        let top = if top == 0 { 1 } else { top };

        if bottom <= top || bottom > self.size_y {
            self.margin_top = 0;
            self.margin_bottom = self.size_y - 1;
        } else {
            self.margin_top = top - 1;
            self.margin_bottom = bottom - 1;
        }
    }

    pub fn set_tabstop(&mut self) {
        if self.cursor_x < self.size_x {
            self.tab_ruler[self.cursor_x] = true;
        }
    }

    pub fn reset_tabstop(&mut self) {
        if self.cursor_x < self.size_x {
            self.tab_ruler[self.cursor_x] = false;
        }
    }

    pub fn reset_all_tabstops(&mut self) {
        for stop in &mut self.tab_ruler {
            *stop = false;
        }
    }

    fn rebuild_tab_ruler(&mut self) {
        self.tab_ruler = (0..self.size_x).map(|i| i % 8 == 0).collect();
    }

    /* ---- scrollback ring ---- */

    pub fn sb_depth(&self) -> usize {
        self.sb.len()
    }

    pub fn sb_max(&self) -> usize {
        self.sb.max
    }

    /// Scrollback review offset in lines (0 = live view).
    pub fn sb_offset(&self) -> usize {
        match self.sb.pos {
            Some(p) => self.sb.len() - p,
            None => 0,
        }
    }

    fn drop_selection_ref(&mut self, r: LineRef) {
        if self.sel_active {
            if self.sel_start.line == Some(r) {
                self.sel_start.line = None;
                self.sel_start.y = SELECTION_TOP;
            }
            if self.sel_end.line == Some(r) {
                self.sel_end.line = None;
                self.sel_end.y = SELECTION_TOP;
            }
        }
    }

    /// Push a line that scrolled off the top into the ring, evicting the
    /// oldest line when the cap is reached.  The review position and
    /// selection endpoints are maintained so the visible content does
    /// not jump.
    fn sb_link(&mut self, mut line: Line) {
        self.age = self.age_cnt;

        if self.sb.max == 0 {
            return;
        }

        if self.sb.len() >= self.sb.max {
            if let Some(evicted) = self.sb.order.pop_front() {
                // The view either follows content (advance one line) or,
                // with FIXED_POS, stays glued to the same line.  An
                // unchanged index is "advance": everything shifted down
                // by one and the replacement line lands at the back
                // right after this.
                if let Some(p) = self.sb.pos {
                    self.sb.pos = if self.flags.contains(ScreenFlags::FIXED_POS) && p > 0 {
                        Some(p - 1)
                    } else {
                        Some(p)
                    };
                }
                self.drop_selection_ref(evicted);
                self.sb.arena.release(evicted);
            }
        }

        self.sb.last_id += 1;
        line.sb_id = self.sb.last_id;
        let r = self.sb.arena.alloc(line);
        self.sb.order.push_back(r);
    }

    pub fn set_max_sb(&mut self, max: usize) {
        self.inc_age();
        self.age = self.age_cnt;

        while self.sb.len() > max {
            if let Some(evicted) = self.sb.order.pop_front() {
                if let Some(p) = self.sb.pos {
                    self.sb.pos = Some(p.saturating_sub(1));
                }
                self.drop_selection_ref(evicted);
                self.sb.arena.release(evicted);
            }
        }

        self.sb.max = max;
    }

    pub fn clear_sb(&mut self) {
        self.inc_age();
        self.age = self.age_cnt;

        self.sb.order.clear();
        self.sb.arena.clear();
        self.sb.pos = None;

        if self.sel_active {
            if self.sel_start.line.is_some() {
                self.sel_start.line = None;
                self.sel_start.y = SELECTION_TOP;
            }
            if self.sel_end.line.is_some() {
                self.sel_end.line = None;
                self.sel_end.y = SELECTION_TOP;
            }
        }
    }

    /// Move the review position towards older history.  Returns the
    /// number of lines actually moved.
    pub fn sb_up(&mut self, num: usize) -> usize {
        if num == 0 || self.sb.len() == 0 {
            return 0;
        }
        self.inc_age();
        self.age = self.age_cnt;

        let mut moved = 0;
        for _ in 0..num {
            match self.sb.pos {
                Some(0) => break,
                Some(p) => self.sb.pos = Some(p - 1),
                None => self.sb.pos = Some(self.sb.len() - 1),
            }
            moved += 1;
        }
        moved
    }

    /// Move the review position towards the live screen.
    pub fn sb_down(&mut self, num: usize) -> usize {
        if num == 0 {
            return 0;
        }
        self.inc_age();
        self.age = self.age_cnt;

        let mut moved = 0;
        for _ in 0..num {
            match self.sb.pos {
                None => break,
                Some(p) if p + 1 >= self.sb.len() => self.sb.pos = None,
                Some(p) => self.sb.pos = Some(p + 1),
            }
            moved += 1;
        }
        moved
    }

    pub fn sb_page_up(&mut self, pages: usize) -> usize {
        self.sb_up(pages * self.size_y)
    }

    pub fn sb_page_down(&mut self, pages: usize) -> usize {
        self.sb_down(pages * self.size_y)
    }

    pub fn sb_reset(&mut self) {
        if self.sb.pos.is_none() {
            return;
        }
        self.inc_age();
        self.age = self.age_cnt;
        self.sb.pos = None;
    }

    /* ---- scrolling ---- */

    fn region_height(&self) -> usize {
        self.margin_bottom + 1 - self.margin_top
    }

    fn full_region(&self) -> bool {
        self.margin_top == 0 && self.margin_bottom == self.size_y - 1
    }

    /// Scroll the margin region up.  Lines leaving a full-screen region
    /// of the main buffer are promoted to scrollback; anything else is
    /// recycled in place.
    fn scroll_up_inner(&mut self, num: usize) -> usize {
        if num == 0 {
            return 0;
        }

        self.age = self.age_cnt;

        let max = self.region_height();
        let num = num.min(max);

        let promote = self.full_region() && !self.flags.contains(ScreenFlags::ALTERNATE);
        let top = self.margin_top;
        let bottom = self.margin_bottom;

        for _ in 0..num {
            if promote {
                let line = {
                    let lines = self.lines_vec_mut();
                    lines.remove(top)
                };
                self.sb_link(line);
                let blank = self.blank_line();
                self.lines_vec_mut().insert(bottom, blank);
            } else {
                let def_attr = self.def_attr;
                let age = self.age_cnt;
                let lines = self.lines_vec_mut();
                lines[top..=bottom].rotate_left(1);
                let recycled = &mut lines[bottom];
                recycled.age = age;
                for cell in recycled.cells.iter_mut() {
                    cell.init(&def_attr, age);
                }
            }
            self.vanguard -= 1;
        }

        if self.vanguard < 0 {
            self.vanguard = 0;
        }

        // Visible-anchored selection endpoints follow the content.
        if self.sel_active {
            anchor_sel_after_scroll(&mut self.sel_start, num, &self.sb.order);
            anchor_sel_after_scroll(&mut self.sel_end, num, &self.sb.order);
        }

        num
    }

    /// Mirror of `scroll_up_inner`; never promotes to scrollback.
    fn scroll_down_inner(&mut self, num: usize) -> usize {
        if num == 0 {
            return 0;
        }

        self.age = self.age_cnt;

        let max = self.region_height();
        let num = num.min(max);
        let top = self.margin_top;
        let bottom = self.margin_bottom;

        let def_attr = self.def_attr;
        let age = self.age_cnt;
        {
            let lines = self.lines_vec_mut();
            for _ in 0..num {
                lines[top..=bottom].rotate_right(1);
                let recycled = &mut lines[top];
                recycled.age = age;
                for cell in recycled.cells.iter_mut() {
                    cell.init(&def_attr, age);
                }
            }
        }

        self.vanguard += num as i32;
        if self.vanguard >= self.size_y as i32 {
            self.vanguard = self.size_y as i32 - 1;
        }

        if self.sel_active {
            if self.sel_start.line.is_none() && self.sel_start.y >= 0 {
                self.sel_start.y += num as i32;
            }
            if self.sel_end.line.is_none() && self.sel_end.y >= 0 {
                self.sel_end.y += num as i32;
            }
        }

        num
    }

    pub fn scroll_up(&mut self, num: usize) -> usize {
        if num == 0 {
            return 0;
        }
        self.inc_age();
        self.scroll_up_inner(num)
    }

    pub fn scroll_down(&mut self, num: usize) -> usize {
        if num == 0 {
            return 0;
        }
        self.inc_age();
        self.scroll_down_inner(num)
    }

    /* ---- resize ---- */

    /// Grow or shrink to `x` by `y` cells.  Content is never reflowed;
    /// shrinking below the written watermark scrolls the excess into
    /// history, and margins reset to the full screen like xterm.
    pub fn resize(&mut self, x: usize, y: usize) -> Result<()> {
        if x == 0 || y == 0 {
            return Err(TermError::InvalidArgument("zero screen dimension"));
        }

        self.inc_age();

        if self.size_x == x && self.size_y == y {
            return Ok(());
        }

        let def_attr = self.def_attr;
        let age = self.age_cnt;

        // allocate rows; new lines are wide enough for old and new width
        let width = x.max(self.size_x);
        while self.main_lines.len() < y {
            self.main_lines.push(Line::new(width, &def_attr, age));
        }
        while self.alt_lines.len() < y {
            self.alt_lines.push(Line::new(width, &def_attr, age));
        }

        // widen every line so resize never leaves a short row behind
        if x > self.size_x {
            for line in self.main_lines.iter_mut().chain(self.alt_lines.iter_mut()) {
                line.grow(x, &def_attr, age);
            }
        }

        // clear the expansion area: main rows may scroll into history so
        // their full tail is cleared, alt rows only the visible part
        let start = x.min(self.size_x);
        for (j, line) in self.main_lines.iter_mut().enumerate() {
            let from = if j < self.size_y { start } else { 0 };
            for cell in line.cells.iter_mut().skip(from) {
                cell.init(&def_attr, age);
            }
        }
        let old_x = self.size_x;
        for (j, line) in self.alt_lines.iter_mut().enumerate() {
            let from = if j < self.size_y { old_x } else { 0 };
            for cell in line.cells.iter_mut().take(x).skip(from) {
                cell.init(&def_attr, age);
            }
        }

        // xterm destroys margins on resize, so do we
        self.margin_top = 0;
        self.margin_bottom = if self.size_y > 0 { self.size_y - 1 } else { 0 };

        self.size_x = x;
        self.rebuild_tab_ruler();
        if self.cursor_x >= self.size_x {
            self.move_cursor(self.size_x - 1, self.cursor_y);
        }

        // scroll the written excess into history when shrinking
        if self.size_y > 0 {
            let diff = self.vanguard + 1 - y as i32;
            if diff > 0 {
                let diff = diff as usize;
                self.scroll_up_inner(diff);
                let cy = self.cursor_y;
                if cy > diff {
                    self.move_cursor(self.cursor_x, cy - diff);
                } else {
                    self.move_cursor(self.cursor_x, 0);
                }
            }
        }

        self.size_y = y;
        self.margin_bottom = y - 1;
        if self.cursor_y >= self.size_y {
            self.move_cursor(self.cursor_x, self.size_y - 1);
        }

        Ok(())
    }

    /* ---- writing ---- */

    fn write_cell(&mut self, x: usize, y: usize, ch: Symbol, len: usize, attr: &CellAttributes) {
        if len == 0 || x >= self.size_x || y >= self.size_y {
            return;
        }

        let age = self.age_cnt;
        let size_x = self.size_x;
        let insert = self.flags.contains(ScreenFlags::INSERT_MODE);
        if y as i32 > self.vanguard {
            self.vanguard = y as i32;
        }

        let line = &mut self.lines_vec_mut()[y];

        if insert && x + len < size_x {
            line.age = age;
            line.cells.copy_within(x..size_x - len, x + len);
        }

        let cell = &mut line.cells[x];
        cell.age = age;
        cell.ch = ch;
        cell.draw_ch = ch;
        cell.width = len as u8;
        cell.attr = *attr;

        for i in 1..len {
            if x + i >= size_x {
                break;
            }
            let cont = &mut line.cells[x + i];
            cont.age = age;
            cont.width = 0;
        }
    }

    /// Print one symbol at the cursor with the usual wrap handling: in
    /// pending-wrap with auto-wrap on, a CR+LF (scrolling if needed)
    /// precedes the write.
    pub fn write(&mut self, ch: Symbol, attr: &CellAttributes) {
        let len = self.symbols.width(ch);
        if len == 0 {
            return;
        }

        self.inc_age();

        let last = if self.cursor_y <= self.margin_bottom || self.cursor_y >= self.size_y {
            self.margin_bottom
        } else {
            self.size_y - 1
        };

        if self.cursor_x >= self.size_x {
            if self.flags.contains(ScreenFlags::AUTO_WRAP) {
                self.move_cursor(0, self.cursor_y + 1);
            } else {
                self.move_cursor(self.size_x - 1, self.cursor_y);
            }
        }

        if self.cursor_y > last {
            self.move_cursor(self.cursor_x, last);
            self.scroll_up_inner(1);
        }

        let attr = *attr;
        self.write_cell(self.cursor_x, self.cursor_y, ch, len, &attr);
        self.move_cursor(self.cursor_x + len, self.cursor_y);
    }

    /// Compose a zero-width mark onto the most recently written cell
    /// (the one left of the cursor, skipping a wide glyph's
    /// continuation column).  A mark with nothing to attach to is
    /// dropped.
    pub fn append_combining(&mut self, cp: u32) {
        if self.cursor_x == 0 || self.cursor_y >= self.size_y {
            return;
        }

        let mut x = self.cursor_x.min(self.size_x) - 1;
        let y = self.cursor_y;

        if self.lines()[y].cells[x].width == 0 {
            if x == 0 {
                return;
            }
            x -= 1;
        }

        self.inc_age();
        let age = self.age_cnt;

        let base = self.lines()[y].cells[x].ch;
        if base == 0 {
            return;
        }
        let composed = self.symbols.append(base, cp);

        let cell = &mut self.lines_vec_mut()[y].cells[x];
        cell.ch = composed;
        cell.draw_ch = composed;
        cell.age = age;
    }

    /// Overwrite the attributes of one cell, leaving its content alone.
    pub fn set_attr_at(&mut self, attr: &CellAttributes, x: usize, y: usize) {
        self.inc_age();
        if x >= self.size_x || y >= self.size_y {
            return;
        }
        let age = self.age_cnt;
        let cell = &mut self.lines_vec_mut()[y].cells[x];
        cell.age = age;
        cell.attr = *attr;
    }

    pub fn newline(&mut self) {
        self.inc_age();
        self.move_down(1, true);
        self.move_line_home();
    }

    /* ---- cursor movement ---- */

    pub fn move_to(&mut self, x: usize, y: usize) {
        self.inc_age();

        let last = if self.flags.contains(ScreenFlags::REL_ORIGIN) {
            self.margin_bottom
        } else {
            self.size_y - 1
        };

        let x = x.min(self.size_x - 1);
        let y = if self.flags.contains(ScreenFlags::REL_ORIGIN) {
            self.margin_top + y
        } else {
            y
        };
        let y = y.min(last);

        self.move_cursor(x, y);
    }

    pub fn move_up(&mut self, num: usize, scroll: bool) {
        if num == 0 {
            return;
        }
        self.inc_age();

        let limit = if self.cursor_y >= self.margin_top {
            self.margin_top
        } else {
            0
        };

        let diff = self.cursor_y - limit;
        if num > diff {
            if scroll {
                self.scroll_down_inner(num - diff);
            }
            self.move_cursor(self.cursor_x, limit);
        } else {
            self.move_cursor(self.cursor_x, self.cursor_y - num);
        }
    }

    pub fn move_down(&mut self, num: usize, scroll: bool) {
        if num == 0 {
            return;
        }
        self.inc_age();

        let limit = if self.cursor_y <= self.margin_bottom {
            self.margin_bottom + 1
        } else {
            self.size_y
        };

        let diff = limit - self.cursor_y - 1;
        if num > diff {
            if scroll {
                self.scroll_up_inner(num - diff);
            }
            self.move_cursor(self.cursor_x, limit - 1);
        } else {
            self.move_cursor(self.cursor_x, self.cursor_y + num);
        }
    }

    pub fn move_left(&mut self, num: usize) {
        if num == 0 {
            return;
        }
        self.inc_age();

        let num = num.min(self.size_x);
        let x = self.cursor_x.min(self.size_x - 1);
        if num > x {
            self.move_cursor(0, self.cursor_y);
        } else {
            self.move_cursor(x - num, self.cursor_y);
        }
    }

    pub fn move_right(&mut self, num: usize) {
        if num == 0 {
            return;
        }
        self.inc_age();

        let num = num.min(self.size_x);
        if num + self.cursor_x >= self.size_x {
            self.move_cursor(self.size_x - 1, self.cursor_y);
        } else {
            self.move_cursor(self.cursor_x + num, self.cursor_y);
        }
    }

    pub fn move_line_home(&mut self) {
        self.inc_age();
        self.move_cursor(0, self.cursor_y);
    }

    pub fn move_line_end(&mut self) {
        self.inc_age();
        self.move_cursor(self.size_x - 1, self.cursor_y);
    }

    /// Forward to the next tab stop; tabs never cause a pending wrap.
    pub fn tab_right(&mut self, num: usize) {
        if num == 0 {
            return;
        }
        self.inc_age();

        let mut x = self.cursor_x;
        for _ in 0..num {
            let mut j = x + 1;
            while j < self.size_x {
                if self.tab_ruler[j] {
                    break;
                }
                j += 1;
            }
            x = j;
            if x + 1 >= self.size_x {
                break;
            }
        }

        if x >= self.size_x {
            x = self.size_x - 1;
        }
        self.move_cursor(x, self.cursor_y);
    }

    pub fn tab_left(&mut self, num: usize) {
        if num == 0 {
            return;
        }
        self.inc_age();

        let mut x = self.cursor_x as i32;
        for _ in 0..num {
            let mut j = x - 1;
            while j > 0 {
                if self.tab_ruler[j as usize] {
                    break;
                }
                j -= 1;
            }
            if j <= 0 {
                x = 0;
                break;
            }
            x = j;
        }
        self.move_cursor(x as usize, self.cursor_y);
    }

    /* ---- insert/delete ---- */

    pub fn insert_lines(&mut self, num: usize) {
        if num == 0 {
            return;
        }
        if self.cursor_y < self.margin_top || self.cursor_y > self.margin_bottom {
            return;
        }
        self.inc_age();
        self.age = self.age_cnt;

        let max = self.margin_bottom - self.cursor_y + 1;
        let num = num.min(max);

        let def_attr = self.def_attr;
        let age = self.age_cnt;
        let top = self.cursor_y;
        let bottom = self.margin_bottom;
        let vanguard_bump = (self.cursor_y as i32) < self.vanguard;
        {
            let lines = self.lines_vec_mut();
            for _ in 0..num {
                lines[top..=bottom].rotate_right(1);
                let fresh = &mut lines[top];
                fresh.age = age;
                for cell in fresh.cells.iter_mut() {
                    cell.init(&def_attr, age);
                }
            }
        }
        if vanguard_bump {
            self.vanguard = (self.vanguard + num as i32).min(self.size_y as i32 - 1);
        }

        self.cursor_x = 0;
    }

    pub fn delete_lines(&mut self, num: usize) {
        if num == 0 {
            return;
        }
        if self.cursor_y < self.margin_top || self.cursor_y > self.margin_bottom {
            return;
        }
        self.inc_age();
        self.age = self.age_cnt;

        let max = self.margin_bottom - self.cursor_y + 1;
        let num = num.min(max);

        let def_attr = self.def_attr;
        let age = self.age_cnt;
        let top = self.cursor_y;
        let bottom = self.margin_bottom;
        let vanguard_drop = (self.cursor_y as i32) <= self.vanguard;
        {
            let lines = self.lines_vec_mut();
            for _ in 0..num {
                lines[top..=bottom].rotate_left(1);
                let recycled = &mut lines[bottom];
                recycled.age = age;
                for cell in recycled.cells.iter_mut() {
                    cell.init(&def_attr, age);
                }
            }
        }
        if vanguard_drop {
            self.vanguard = (self.vanguard - num as i32).max(0);
        }

        self.cursor_x = 0;
    }

    pub fn insert_chars(&mut self, num: usize) {
        if num == 0 || self.size_x == 0 || self.size_y == 0 {
            return;
        }
        self.inc_age();
        self.age = self.age_cnt;

        self.cursor_x = self.cursor_x.min(self.size_x - 1);
        self.cursor_y = self.cursor_y.min(self.size_y - 1);

        let max = self.size_x - self.cursor_x;
        let num = num.min(max);
        let mv = max - num;

        let def_attr = self.def_attr;
        let age = self.age_cnt;
        let x = self.cursor_x;
        let y = self.cursor_y;
        let line = &mut self.lines_vec_mut()[y];
        if mv > 0 {
            line.cells.copy_within(x..x + mv, x + num);
        }
        for cell in line.cells[x..x + num].iter_mut() {
            cell.init(&def_attr, age);
        }
    }

    pub fn delete_chars(&mut self, num: usize) {
        if num == 0 || self.size_x == 0 || self.size_y == 0 {
            return;
        }
        self.inc_age();
        self.age = self.age_cnt;

        self.cursor_x = self.cursor_x.min(self.size_x - 1);
        self.cursor_y = self.cursor_y.min(self.size_y - 1);

        let max = self.size_x - self.cursor_x;
        let num = num.min(max);
        let mv = max - num;

        let def_attr = self.def_attr;
        let age = self.age_cnt;
        let x = self.cursor_x;
        let y = self.cursor_y;
        let line = &mut self.lines_vec_mut()[y];
        if mv > 0 {
            line.cells.copy_within(x + num..x + num + mv, x);
        }
        for cell in line.cells[x + mv..x + num + mv].iter_mut() {
            cell.init(&def_attr, age);
        }
    }

    /* ---- erase ---- */

    /// Erase a rectangle-spanning range in row-major order.  Cells whose
    /// attributes carry the protect bit survive when `protect` is set;
    /// everything erased takes the current default attributes.
    pub fn erase_region(
        &mut self,
        x_from: usize,
        y_from: usize,
        x_to: usize,
        y_to: usize,
        protect: bool,
    ) {
        self.inc_age();
        self.age = self.age_cnt;

        let y_to = y_to.min(self.size_y - 1);
        let x_to = x_to.min(self.size_x - 1);
        let size_x = self.size_x;

        let def_attr = self.def_attr;
        let age = self.age_cnt;

        let mut x_from = x_from;
        for y in y_from..=y_to {
            let line = match self.lines_vec_mut().get_mut(y) {
                Some(line) => line,
                None => break,
            };
            let to = if y == y_to { x_to } else { size_x - 1 };
            for x in x_from..=to {
                let cell = &mut line.cells[x];
                if protect && cell.attr.has(AttrFlags::PROTECT) {
                    continue;
                }
                Screen::cell_init_chg(cell, &def_attr, age);
            }
            x_from = 0;
        }
    }

    pub fn erase_cursor(&mut self) {
        let x = self.cursor_x.min(self.size_x - 1);
        self.erase_region(x, self.cursor_y, x, self.cursor_y, false);
    }

    pub fn erase_chars(&mut self, num: usize) {
        if num == 0 {
            return;
        }
        let x = self.cursor_x.min(self.size_x - 1);
        self.erase_region(x, self.cursor_y, x + num - 1, self.cursor_y, false);
    }

    pub fn erase_cursor_to_end(&mut self, protect: bool) {
        let x = self.cursor_x.min(self.size_x - 1);
        self.erase_region(x, self.cursor_y, self.size_x - 1, self.cursor_y, protect);
    }

    pub fn erase_home_to_cursor(&mut self, protect: bool) {
        self.erase_region(0, self.cursor_y, self.cursor_x, self.cursor_y, protect);
    }

    pub fn erase_current_line(&mut self, protect: bool) {
        self.erase_region(0, self.cursor_y, self.size_x - 1, self.cursor_y, protect);
        if self.cursor_y as i32 == self.vanguard {
            self.vanguard -= 1;
            if self.vanguard < 0 {
                self.vanguard = 0;
            }
        }
    }

    pub fn erase_screen_to_cursor(&mut self, protect: bool) {
        self.erase_region(0, 0, self.cursor_x, self.cursor_y, protect);
        if self.cursor_y as i32 > self.vanguard {
            self.vanguard = 0;
        }
    }

    pub fn erase_cursor_to_screen(&mut self, protect: bool) {
        let x = self.cursor_x.min(self.size_x - 1);
        self.erase_region(x, self.cursor_y, self.size_x - 1, self.size_y - 1, protect);
    }

    pub fn erase_screen(&mut self, protect: bool) {
        self.erase_region(0, 0, self.size_x - 1, self.size_y - 1, protect);
        self.vanguard = 0;
    }

    /* ---- reset ---- */

    /// Back to power-on screen state: flags cleared (which also selects
    /// the main buffer), margins full, default tab ruler.  Content and
    /// scrollback stay.
    pub fn reset(&mut self) {
        self.inc_age();
        self.age = self.age_cnt;

        self.flags = ScreenFlags::default();
        self.margin_top = 0;
        self.margin_bottom = self.size_y - 1;
        self.rebuild_tab_ruler();
    }

    /* ---- draw ---- */

    /// Walk every visible cell (history view included) and hand it to
    /// the renderer with its effective age.  Returns the age stamp the
    /// renderer should remember, or 0 when the age counter was reset and
    /// everything must repaint.
    pub fn draw<F>(&mut self, mut cb: F) -> Age
    where
        F: FnMut(&DrawCell),
    {
        let empty = Cell::blank(self.def_attr, self.age_cnt);

        let mut in_sel = false;
        let mut was_sel = false;

        // how many history lines are above the first visible one
        let sb_start = self.sb.pos;

        if self.sel_active {
            let top_id = sb_start
                .and_then(|p| self.sb.order.get(p).copied())
                .and_then(|r| self.sb.sb_id(r));

            let endpoints = [self.sel_start, self.sel_end];
            for sel in endpoints.iter() {
                if sel.line.is_none() && sel.y == SELECTION_TOP {
                    in_sel = !in_sel;
                } else if let Some(r) = sel.line {
                    if let Some(id) = self.sb.sb_id(r) {
                        if top_id.map(|t| id < t).unwrap_or(true) {
                            in_sel = !in_sel;
                        }
                    }
                }
            }
        }

        enum Row {
            Sb(LineRef),
            Live(usize),
        }

        let mut sb_idx = sb_start;
        let mut live_row = 0usize;

        for i in 0..self.size_y {
            let row = match sb_idx {
                Some(p) if p < self.sb.len() => {
                    let r = self.sb.order[p];
                    sb_idx = if p + 1 < self.sb.len() {
                        Some(p + 1)
                    } else {
                        None
                    };
                    Row::Sb(r)
                }
                _ => {
                    sb_idx = None;
                    let k = live_row;
                    live_row += 1;
                    Row::Live(k)
                }
            };

            let (line, line_ref): (&Line, Option<LineRef>) = match row {
                Row::Sb(r) => match self.sb.arena.get(r) {
                    Some(line) => (line, Some(r)),
                    None => continue,
                },
                Row::Live(k) => (&self.lines()[k], None),
            };

            let (mut sel_start_row, mut sel_end_row) = (false, false);
            if self.sel_active {
                let row_matches = |sel: &SelectionPos| match (sel.line, line_ref) {
                    (Some(a), Some(b)) => a == b,
                    (None, None) => sel.y >= 0 && sel.y as usize + 1 == live_row,
                    _ => false,
                };
                sel_start_row = row_matches(&self.sel_start);
                sel_end_row = row_matches(&self.sel_end);
                was_sel = false;
            }

            for j in 0..self.size_x {
                let cell = line.cell(j).unwrap_or(&empty);
                let mut attr = cell.attr;

                if self.sel_active {
                    if sel_start_row && j == self.sel_start.x {
                        was_sel = in_sel;
                        in_sel = !in_sel;
                    }
                    if sel_end_row && j == self.sel_end.x {
                        was_sel = in_sel;
                        in_sel = !in_sel;
                    }
                }

                if self.flags.contains(ScreenFlags::INVERSE) {
                    attr.flags.toggle(AttrFlags::INVERSE);
                }
                if in_sel || was_sel {
                    was_sel = false;
                    attr.flags.toggle(AttrFlags::INVERSE);
                }

                let age = if self.age_reset {
                    0
                } else {
                    cell.age.max(line.age).max(self.age)
                };

                let chars: &[u32] =
                    if cell.draw_ch == b' ' as u32 || cell.draw_ch == 0 || cell.draw_ch == 0xa0 {
                        &[]
                    } else {
                        self.symbols.get(&cell.draw_ch)
                    };

                cb(&DrawCell {
                    ch: cell.ch,
                    chars,
                    width: cell.width,
                    x: j,
                    y: i,
                    attr,
                    age,
                });
            }
        }

        if self.age_reset {
            self.age_reset = false;
            0
        } else {
            self.age_cnt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(cols: usize, rows: usize) -> Screen {
        let mut s = Screen::with_size(cols, rows, CellAttributes::default()).unwrap();
        s.set_flags(ScreenFlags::AUTO_WRAP);
        s
    }

    fn row_text(s: &Screen, y: usize) -> String {
        (0..s.width())
            .map(|x| {
                let cell = s.cell_at(x, y).unwrap();
                if cell.ch == 0 {
                    '_'
                } else {
                    std::char::from_u32(cell.ch).unwrap()
                }
            })
            .collect()
    }

    fn write_str(s: &mut Screen, text: &str) {
        let attr = s.def_attr();
        for c in text.chars() {
            s.write(c as u32, &attr);
        }
    }

    #[test]
    fn write_wraps_at_margin() {
        let mut s = screen(10, 2);
        write_str(&mut s, "ABCDEFGHIJKL");
        assert_eq!(row_text(&s, 0), "ABCDEFGHIJ");
        assert_eq!(row_text(&s, 1), "KL________");
        assert_eq!(s.cursor(), (2, 1));
    }

    #[test]
    fn wrap_at_bottom_scrolls_once() {
        let mut s = screen(4, 2);
        s.set_max_sb(10);
        write_str(&mut s, "aaaabbbbc");
        assert_eq!(row_text(&s, 0), "bbbb");
        assert_eq!(row_text(&s, 1), "c___");
        assert_eq!(s.sb_depth(), 1);
    }

    #[test]
    fn no_wrap_without_flag() {
        let mut s = Screen::with_size(4, 2, CellAttributes::default()).unwrap();
        write_str(&mut s, "abcdef");
        assert_eq!(row_text(&s, 0), "abcf");
        assert_eq!(s.cursor(), (4, 0));
    }

    #[test]
    fn wide_symbol_continuation_cell() {
        let mut s = screen(6, 2);
        let attr = s.def_attr();
        s.write(0x4e16, &attr);
        assert_eq!(s.cell_at(0, 0).unwrap().width, 2);
        assert_eq!(s.cell_at(1, 0).unwrap().width, 0);
        assert_eq!(s.cursor(), (2, 0));
    }

    #[test]
    fn insert_mode_shifts_right() {
        let mut s = screen(6, 1);
        write_str(&mut s, "abc");
        s.move_to(0, 0);
        s.set_flags(ScreenFlags::INSERT_MODE);
        write_str(&mut s, "X");
        assert_eq!(row_text(&s, 0), "Xabc__");
    }

    #[test]
    fn ages_are_monotonic() {
        let mut s = screen(4, 2);
        let before = s.cell_at(0, 0).unwrap().age;
        write_str(&mut s, "x");
        let after = s.cell_at(0, 0).unwrap().age;
        assert!(after >= before);
    }

    #[test]
    fn scrollback_eviction_keeps_newest() {
        let mut s = screen(4, 2);
        s.set_max_sb(3);
        for _ in 0..5 {
            s.scroll_up(1);
        }
        assert_eq!(s.sb_depth(), 3);
        let ids: Vec<u64> = (0..3).map(|i| s.sb.line(i).unwrap().sb_id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn scrollback_order_is_strictly_ascending() {
        let mut s = screen(4, 2);
        s.set_max_sb(8);
        for _ in 0..6 {
            s.scroll_up(1);
        }
        let mut last = 0;
        for i in 0..s.sb_depth() {
            let id = s.sb.line(i).unwrap().sb_id;
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn alternate_screen_never_promotes() {
        let mut s = screen(4, 2);
        s.set_max_sb(10);
        s.set_flags(ScreenFlags::ALTERNATE);
        s.scroll_up(3);
        assert_eq!(s.sb_depth(), 0);
        s.reset_flags(ScreenFlags::ALTERNATE);
        s.scroll_up(1);
        assert_eq!(s.sb_depth(), 1);
    }

    #[test]
    fn partial_region_never_promotes() {
        let mut s = screen(4, 4);
        s.set_max_sb(10);
        s.set_margins(2, 3);
        s.scroll_up(1);
        assert_eq!(s.sb_depth(), 0);
    }

    #[test]
    fn region_scroll_clamps_count() {
        let mut s = screen(4, 4);
        s.set_margins(2, 3);
        write_str(&mut s, "top!");
        // way more than the region height; must not touch row 0
        s.scroll_up(100);
        assert_eq!(row_text(&s, 0), "top!");
    }

    #[test]
    fn margins_degenerate_to_full() {
        let mut s = screen(10, 5);
        s.set_margins(4, 2);
        assert_eq!(s.margins(), (0, 4));
        s.set_margins(0, 99);
        assert_eq!(s.margins(), (0, 4));
        s.set_margins(2, 4);
        assert_eq!(s.margins(), (1, 3));
    }

    #[test]
    fn resize_resets_margins_and_tabs() {
        let mut s = screen(20, 10);
        s.set_margins(2, 5);
        s.resize(30, 12).unwrap();
        assert_eq!(s.margins(), (0, 11));
        assert!(s.tab_ruler[0] && s.tab_ruler[8] && s.tab_ruler[16]);
        assert!(!s.tab_ruler[9]);
    }

    #[test]
    fn resize_shrink_scrolls_written_rows_into_history() {
        let mut s = screen(4, 4);
        s.set_max_sb(10);
        write_str(&mut s, "1111");
        s.newline();
        write_str(&mut s, "2222");
        s.newline();
        write_str(&mut s, "3333");
        // rows 0..2 written; shrinking to 2 rows pushes one line out
        s.resize(4, 2).unwrap();
        assert_eq!(s.sb_depth(), 1);
        assert_eq!(row_text(&s, 0), "2222");
        assert_eq!(row_text(&s, 1), "3333");
    }

    #[test]
    fn resize_rejects_zero() {
        let mut s = screen(4, 4);
        assert!(s.resize(0, 4).is_err());
        assert!(s.resize(4, 0).is_err());
        assert_eq!(s.width(), 4);
    }

    #[test]
    fn erase_respects_protect() {
        let mut s = screen(4, 1);
        let mut attr = s.def_attr();
        write_str(&mut s, "ab");
        attr.set(AttrFlags::PROTECT, true);
        s.write('P' as u32, &attr);
        s.erase_screen(true);
        assert_eq!(row_text(&s, 0), "__P_");
        s.erase_screen(false);
        assert_eq!(row_text(&s, 0), "____");
    }

    #[test]
    fn redundant_erase_does_not_age() {
        let mut s = screen(4, 1);
        s.erase_screen(false);
        let age = s.cell_at(3, 0).unwrap().age;
        s.erase_screen(false);
        assert_eq!(s.cell_at(3, 0).unwrap().age, age);
    }

    #[test]
    fn insert_delete_lines_respect_region() {
        let mut s = screen(4, 4);
        write_str(&mut s, "aaaa");
        s.newline();
        write_str(&mut s, "bbbb");
        s.newline();
        write_str(&mut s, "cccc");
        s.set_margins(1, 3);
        s.move_to(0, 1);
        s.insert_lines(1);
        assert_eq!(row_text(&s, 0), "aaaa");
        assert_eq!(row_text(&s, 1), "____");
        assert_eq!(row_text(&s, 2), "bbbb");
        s.delete_lines(1);
        assert_eq!(row_text(&s, 1), "bbbb");
    }

    #[test]
    fn insert_delete_chars() {
        let mut s = screen(6, 1);
        write_str(&mut s, "abcdef");
        s.move_to(1, 0);
        s.delete_chars(2);
        assert_eq!(row_text(&s, 0), "adef__");
        s.insert_chars(1);
        assert_eq!(row_text(&s, 0), "a_def_");
    }

    #[test]
    fn tab_movement() {
        let mut s = screen(20, 1);
        s.tab_right(1);
        assert_eq!(s.cursor().0, 8);
        s.tab_right(1);
        assert_eq!(s.cursor().0, 16);
        s.tab_left(1);
        assert_eq!(s.cursor().0, 8);
        s.tab_left(5);
        assert_eq!(s.cursor().0, 0);
    }

    #[test]
    fn sb_review_position_tracks_eviction() {
        let mut s = screen(4, 2);
        s.set_max_sb(3);
        for _ in 0..3 {
            s.scroll_up(1);
        }
        assert_eq!(s.sb_up(2), 2);
        assert_eq!(s.sb_offset(), 2);
        // eviction advances an unfixed view
        s.scroll_up(1);
        assert_eq!(s.sb_offset(), 2);
        s.sb_reset();
        assert_eq!(s.sb_offset(), 0);
    }

    #[test]
    fn sb_up_stops_at_oldest() {
        let mut s = screen(4, 2);
        s.set_max_sb(10);
        s.scroll_up(2);
        assert_eq!(s.sb_up(100), 2);
        assert_eq!(s.sb_down(100), 2);
        assert_eq!(s.sb_down(1), 0);
    }

    #[test]
    fn draw_reports_zero_after_age_overflow() {
        let mut s = screen(2, 1);
        s.age_cnt = u32::MAX;
        s.inc_age();
        assert!(s.age_reset);
        let age = s.draw(|_| {});
        assert_eq!(age, 0);
        let age = s.draw(|_| {});
        assert!(age > 0);
    }

    #[test]
    fn draw_visits_every_visible_cell() {
        let mut s = screen(3, 2);
        let mut seen = Vec::new();
        s.draw(|c| seen.push((c.x, c.y)));
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], (0, 0));
        assert_eq!(seen[5], (2, 1));
    }

    #[test]
    fn draw_skips_glyphs_for_blank_cells() {
        let mut s = screen(2, 1);
        write_str(&mut s, "A ");
        let mut lens = Vec::new();
        s.draw(|c| lens.push(c.chars.len()));
        assert_eq!(lens, vec![1, 0]);
    }

    #[test]
    fn inverse_flag_toggles_attrs_in_draw() {
        let mut s = screen(1, 1);
        s.set_flags(ScreenFlags::INVERSE);
        let mut inverted = false;
        s.draw(|c| inverted = c.attr.has(AttrFlags::INVERSE));
        assert!(inverted);
    }
}
