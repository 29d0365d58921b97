//! Line input widget: prompt, editing, history and completion hooks.

use crate::TuiContext;
use atui_term::vte::{KeyModifiers, Keysym};

/// Caller-side policy hooks.  Everything defaults to permissive.
#[allow(unused_variables)]
pub trait ReadlineHooks {
    /// Gate a codepoint before it enters the buffer (input masks,
    /// length limits).
    fn filter_character(&mut self, cp: char, current_len: usize) -> bool {
        true
    }

    /// Validate the whole line on commit.  Return the char offset of
    /// the first bad position to refuse, `None` to accept.
    fn verify(&mut self, line: &str) -> Option<usize> {
        None
    }

    /// Offer a completion for the current line, triggered by Tab.
    fn autocomplete(&mut self, line: &str) -> Option<String> {
        None
    }
}

/// Permissive default hooks.
pub struct NoHooks;

impl ReadlineHooks for NoHooks {}

#[derive(Debug, Clone)]
pub struct ReadlineOpts {
    /// Row the input line renders on: negative counts from the bottom
    /// of the context, zero or positive from the top.
    pub anchor_row: isize,
    pub margin_left: usize,
    pub margin_right: usize,
    /// Escape (and clicks outside the region) cancel the line.
    pub allow_exit: bool,
    /// Draw this instead of buffer content (password prompts).
    pub mask_character: Option<char>,
    /// Accept line feeds into the buffer instead of committing.
    pub multiline: bool,
}

impl Default for ReadlineOpts {
    fn default() -> Self {
        ReadlineOpts {
            anchor_row: -1,
            margin_left: 0,
            margin_right: 0,
            allow_exit: true,
            mask_character: None,
            multiline: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadlineStatus {
    /// Still editing.
    Edited,
    /// Committed; fetch the line with [`Readline::take_line`].
    Done,
    Cancelled,
    /// EOF-style termination (C-d on an empty line).
    Terminate,
}

pub struct Readline {
    opts: ReadlineOpts,
    prompt: String,

    /// Edit buffer as codepoints; cursor is an index into it.
    buffer: Vec<char>,
    cursor: usize,

    history: Vec<String>,
    /// Present position while browsing history; the in-progress line
    /// is stashed so walking back down restores it.
    history_pos: Option<usize>,
    stash: Vec<char>,

    status: ReadlineStatus,
    /// Verification failure offset from the last commit attempt.
    bad_offset: Option<usize>,
    dirty: bool,
}

impl Readline {
    pub fn new(opts: ReadlineOpts) -> Self {
        Readline {
            opts,
            prompt: String::new(),
            buffer: Vec::new(),
            cursor: 0,
            history: Vec::new(),
            history_pos: None,
            stash: Vec::new(),
            status: ReadlineStatus::Edited,
            bad_offset: None,
            dirty: true,
        }
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
        self.dirty = true;
    }

    /// Replace the history set; newest entry last.
    pub fn set_history(&mut self, entries: &[&str]) {
        self.history = entries.iter().map(|s| s.to_string()).collect();
        self.history_pos = None;
    }

    pub fn line(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Poll the commit state.  `Done`/`Cancelled`/`Terminate` are
    /// sticky until [`Readline::reset`].
    pub fn status(&self) -> ReadlineStatus {
        self.status
    }

    /// Char offset of the verification failure from the last rejected
    /// commit, for error highlighting.
    pub fn bad_offset(&self) -> Option<usize> {
        self.bad_offset
    }

    /// Take the committed line and rearm for the next one.
    pub fn take_line(&mut self) -> String {
        let line = self.line();
        self.reset();
        line
    }

    /// Clear buffer and state (C-l).
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_pos = None;
        self.stash.clear();
        self.status = ReadlineStatus::Edited;
        self.bad_offset = None;
        self.dirty = true;
    }

    fn insert(&mut self, c: char, hooks: &mut dyn ReadlineHooks) {
        if !hooks.filter_character(c, self.buffer.len()) {
            return;
        }
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
        self.bad_offset = None;
        self.dirty = true;
    }

    fn kill_to_end(&mut self) {
        self.buffer.truncate(self.cursor);
        self.dirty = true;
    }

    fn kill_line(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.dirty = true;
    }

    fn rubout_word(&mut self) {
        let mut at = self.cursor;
        while at > 0 && self.buffer[at - 1].is_whitespace() {
            at -= 1;
        }
        while at > 0 && !self.buffer[at - 1].is_whitespace() {
            at -= 1;
        }
        self.buffer.drain(at..self.cursor);
        self.cursor = at;
        self.dirty = true;
    }

    fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_pos {
            None => {
                self.stash = self.buffer.clone();
                self.history.len() - 1
            }
            Some(0) => return,
            Some(p) => p - 1,
        };
        self.history_pos = Some(next);
        self.buffer = self.history[next].chars().collect();
        self.cursor = self.buffer.len();
        self.dirty = true;
    }

    fn history_down(&mut self) {
        let pos = match self.history_pos {
            None => return,
            Some(p) => p,
        };
        if pos + 1 < self.history.len() {
            self.history_pos = Some(pos + 1);
            self.buffer = self.history[pos + 1].chars().collect();
        } else {
            self.history_pos = None;
            self.buffer = std::mem::take(&mut self.stash);
        }
        self.cursor = self.buffer.len();
        self.dirty = true;
    }

    fn commit(&mut self, hooks: &mut dyn ReadlineHooks) {
        let line = self.line();
        match hooks.verify(&line) {
            None => {
                self.status = ReadlineStatus::Done;
                self.dirty = true;
            }
            Some(offset) => {
                self.bad_offset = Some(offset);
                self.dirty = true;
            }
        }
    }

    /// Route one key event.  Returns true when consumed; the widget
    /// consumes essentially all keys while active.
    pub fn input_key(
        &mut self,
        sym: Keysym,
        mods: KeyModifiers,
        cp: Option<u32>,
        hooks: &mut dyn ReadlineHooks,
    ) -> bool {
        if self.status != ReadlineStatus::Edited {
            return false;
        }

        if mods.contains(KeyModifiers::CTRL) {
            match sym {
                Keysym::Char('a') => self.cursor = 0,
                Keysym::Char('e') => self.cursor = self.buffer.len(),
                Keysym::Char('k') => self.kill_to_end(),
                Keysym::Char('u') => self.kill_line(),
                Keysym::Char('w') => self.rubout_word(),
                Keysym::Char('l') => self.reset(),
                Keysym::Char('c') => self.status = ReadlineStatus::Cancelled,
                Keysym::Char('d') => {
                    if self.buffer.is_empty() {
                        self.status = ReadlineStatus::Terminate;
                    }
                }
                _ => return false,
            }
            self.dirty = true;
            return true;
        }

        match sym {
            Keysym::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            Keysym::Right => {
                if self.cursor < self.buffer.len() {
                    self.cursor += 1;
                }
            }
            Keysym::Home => self.cursor = 0,
            Keysym::End => self.cursor = self.buffer.len(),
            Keysym::Up => self.history_up(),
            Keysym::Down => self.history_down(),
            Keysym::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.buffer.remove(self.cursor);
                    self.bad_offset = None;
                }
            }
            Keysym::Delete => {
                if self.cursor < self.buffer.len() {
                    self.buffer.remove(self.cursor);
                    self.bad_offset = None;
                }
            }
            Keysym::Tab => {
                let line = self.line();
                if let Some(completed) = hooks.autocomplete(&line) {
                    self.buffer = completed.chars().collect();
                    self.cursor = self.buffer.len();
                }
            }
            Keysym::Return | Keysym::KpEnter => {
                if self.opts.multiline && mods.contains(KeyModifiers::SHIFT) {
                    self.insert('\n', hooks);
                } else {
                    self.commit(hooks);
                }
            }
            Keysym::Escape => {
                if self.opts.allow_exit {
                    self.status = ReadlineStatus::Cancelled;
                }
            }
            Keysym::Char(c) => {
                self.insert(c, hooks);
            }
            _ => match cp.and_then(std::char::from_u32) {
                Some(c) if !c.is_control() => self.insert(c, hooks),
                _ => return false,
            },
        }

        self.dirty = true;
        true
    }

    fn anchor(&self, rows: usize) -> usize {
        if self.opts.anchor_row < 0 {
            rows.saturating_sub(self.opts.anchor_row.unsigned_abs())
        } else {
            (self.opts.anchor_row as usize).min(rows.saturating_sub(1))
        }
    }

    /// Render prompt and buffer on the anchor row and park the screen
    /// cursor at the edit position.
    pub fn draw(&mut self, ctx: &mut TuiContext) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let rows = ctx.screen().height();
        let cols = ctx.screen().width();
        let row = self.anchor(rows);

        let left = self.opts.margin_left.min(cols.saturating_sub(1));
        let width = cols - left - self.opts.margin_right.min(cols - left);

        ctx.screen_mut().move_to(0, row);
        ctx.screen_mut().erase_current_line(false);
        ctx.screen_mut().move_to(left, row);

        let attr = ctx.screen().def_attr();

        let shown: String = match self.opts.mask_character {
            Some(mask) => std::iter::repeat(mask).take(self.buffer.len()).collect(),
            None => self.line(),
        };

        // scroll the visible window so the cursor always fits
        let prompt_len = self.prompt.chars().count();
        let avail = width.saturating_sub(prompt_len).max(1);
        let start = if self.cursor >= avail { self.cursor + 1 - avail } else { 0 };

        for c in self.prompt.chars().take(width) {
            ctx.screen_mut().write(c as u32, &attr);
        }
        for c in shown.chars().skip(start).take(avail) {
            ctx.screen_mut().write(c as u32, &attr);
        }

        let cursor_col = left + prompt_len.min(width) + (self.cursor - start);
        ctx.screen_mut().move_to(cursor_col.min(cols - 1), row);
    }
}
