//! Text UI context: the stable contract renderers and widgets build
//! against.
//!
//! A [`TuiContext`] bundles the screen model, the escape dispatcher and
//! (optionally) a pty-bridged child process.  The embedder owns the
//! event loop: it polls the fds, queues [`Event`]s with
//! [`TuiContext::queue_event`], then alternates [`TuiContext::process`]
//! (drain events and pty, fire handlers) and [`TuiContext::refresh`]
//! (walk the grid, emit age-filtered draw calls).
//!
//! Handlers never receive the context itself, so they cannot re-enter
//! `process` on the same context; scheduling work on another context
//! from a handler is fine.

#[macro_use]
extern crate log;

pub mod args;
pub mod handlers;
pub mod labels;
#[cfg(any(feature = "widget-listwnd", feature = "widget-readline"))]
pub mod widgets;

pub use crate::args::{ArgMap, CursorStyle, FontHint, TuiConfig};
pub use crate::handlers::{Event, ExecState, NoHandlers, ResetLevel, SubwindowType, TuiHandlers};
pub use crate::labels::{LabelHint, BUILTIN_LABELS};

use atui_pty::{CommandBuilder, Dispatch, ExitStatus, Pty, PtySize};
use atui_term::cell::CellAttributes;
use atui_term::color::Palette;
use atui_term::screen::{DrawCell, Screen};
use atui_term::vte::{Vte, VteHost};
use atui_term::{Age, TermError};
use std::collections::VecDeque;
use std::io;

/// Outcome of one `process` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Everything drained; sleep in poll until the next edge.
    Idle,
    /// The pty still has queued data; call `process` again before
    /// sleeping.
    MorePending,
    /// The child is gone.  The context is still valid for drawing the
    /// final screen, but no further I/O will happen.
    Exited(Option<ExitStatus>),
}

/// An unanswered sub-window request, surfaced to the embedder so it can
/// forward it across its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubwindowRequest {
    pub kind: SubwindowType,
    pub id: u32,
}

/// Capture sink for the vte's host-side effects during one input pass.
struct HostSink<'a> {
    pty: Option<&'a mut Pty>,
    title: &'a mut Option<String>,
    osc: &'a mut VecDeque<(Vec<u8>, bool)>,
}

impl VteHost for HostSink<'_> {
    fn write(&mut self, data: &[u8]) {
        if let Some(pty) = self.pty.as_mut() {
            pty.write(data);
        }
    }

    fn set_title(&mut self, title: &str) {
        *self.title = Some(title.to_string());
    }

    fn osc_string(&mut self, data: &[u8], truncated: bool) {
        self.osc.push_back((data.to_vec(), truncated));
    }
}

pub struct TuiContext {
    screen: Screen,
    vte: Vte,
    pty: Option<Pty>,
    handlers: Box<dyn TuiHandlers>,
    events: VecDeque<Event>,

    config: TuiConfig,
    title: Option<String>,
    osc_strings: VecDeque<(Vec<u8>, bool)>,
    copy_buffer: Option<String>,
    last_words: Option<String>,

    subwindow_requests: Vec<SubwindowRequest>,
    next_subwindow_id: u32,

    scroll_lock: bool,
    mouse_forward: bool,
    exited: Option<ExitStatus>,
}

impl TuiContext {
    /// A context without a child process; bytes are fed manually via
    /// [`TuiContext::feed`] (widget surfaces, replay, tests).
    pub fn new(config: TuiConfig, handlers: Box<dyn TuiHandlers>) -> atui_term::Result<Self> {
        let palette = match &config.palette {
            Some(name) => Palette::named(name),
            None => Palette::named("default"),
        };

        let mut screen = Screen::with_size(config.cols, config.rows, CellAttributes::default())?;
        let mut vte = Vte::new(palette);
        vte.reset(&mut screen);

        // explicit fg/bg overrides win over the palette defaults
        if let Some(fg) = config.fg {
            vte.set_color(atui_term::color::ColorIndex::Foreground as usize, fg);
        }
        if let Some(bg) = config.bg {
            vte.set_color(atui_term::color::ColorIndex::Background as usize, bg);
        }
        if config.fg.is_some() || config.bg.is_some() {
            screen.set_def_attr(&vte.default_attr());
        }

        Ok(TuiContext {
            screen,
            vte,
            pty: None,
            handlers,
            events: VecDeque::new(),
            config,
            title: None,
            osc_strings: VecDeque::new(),
            copy_buffer: None,
            last_words: None,
            subwindow_requests: Vec::new(),
            next_subwindow_id: 1,
            scroll_lock: false,
            mouse_forward: true,
            exited: None,
        })
    }

    /// A context driving a child process under a pty.  The command
    /// picks up the login environment when the config asks for it.
    pub fn spawn(
        config: TuiConfig,
        handlers: Box<dyn TuiHandlers>,
        mut command: CommandBuilder,
    ) -> anyhow::Result<Self> {
        if let Some(user) = &config.login {
            command.login(user.as_deref());
        }

        let size = PtySize {
            rows: config.rows as u16,
            cols: config.cols as u16,
            ..PtySize::default()
        };

        let pty = Pty::spawn(&command, size)?;
        let mut ctx = TuiContext::new(config, handlers)?;
        ctx.pty = Some(pty);
        Ok(ctx)
    }

    /* ---- accessors ---- */

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn vte(&self) -> &Vte {
        &self.vte
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn config(&self) -> &TuiConfig {
        &self.config
    }

    /// Fd to include in the embedder's poll set, if a child is wired.
    pub fn pty_fd(&self) -> Option<std::os::unix::io::RawFd> {
        self.pty.as_ref().and_then(|p| p.as_raw_fd())
    }

    /// Latest text captured by a COPY_* label or selection release.
    pub fn take_copy_buffer(&mut self) -> Option<String> {
        self.copy_buffer.take()
    }

    /// OSC strings the core did not interpret, oldest first.
    pub fn take_osc_string(&mut self) -> Option<(Vec<u8>, bool)> {
        self.osc_strings.pop_front()
    }

    /// Short diagnostic for the host to show when the context dies.
    pub fn set_last_words(&mut self, msg: &str) {
        self.last_words = Some(msg.to_string());
    }

    pub fn last_words(&self) -> Option<&str> {
        self.last_words.as_deref()
    }

    /// Built-in labels plus whatever the handler table announces.
    pub fn announce_labels(&mut self) -> Vec<LabelHint> {
        let mut out: Vec<LabelHint> = BUILTIN_LABELS.to_vec();
        let mut index = 0;
        while let Some(hint) = self.handlers.query_label(index) {
            out.push(hint);
            index += 1;
        }
        out
    }

    /// Scrollback depth and current review offset, for scrollbar-style
    /// content hints: (offset-from-live, total-history).
    pub fn content_hint(&self) -> (usize, usize) {
        (self.screen.sb_offset(), self.screen.sb_depth())
    }

    /* ---- façade screen operations ---- */

    /// Write text at the cursor with the given attributes (current pen
    /// when `None`), composing combining marks onto their base cells.
    pub fn write_str(&mut self, text: &str, attr: Option<&CellAttributes>) {
        let attr = attr.copied().unwrap_or_else(|| self.vte.pen());
        for c in text.chars() {
            if atui_term::symbols::ucs4_width(c as u32) == 0 {
                self.screen.append_combining(c as u32);
            } else {
                self.screen.write(c as u32, &attr);
            }
        }
    }

    /// Queue a sub-window request.  The embedder forwards it and later
    /// answers with [`Event::Subwindow`]; a refusal ends up as a no-op
    /// in the handler table, never an error.
    pub fn request_subwindow(&mut self, kind: SubwindowType) -> u32 {
        let id = self.next_subwindow_id;
        self.next_subwindow_id += 1;
        self.subwindow_requests.push(SubwindowRequest { kind, id });
        id
    }

    pub fn take_subwindow_requests(&mut self) -> Vec<SubwindowRequest> {
        std::mem::take(&mut self.subwindow_requests)
    }

    /// Resize grid and child in one go.  An invalid geometry leaves
    /// the context untouched.
    pub fn resize(&mut self, cols: usize, rows: usize) -> atui_term::Result<()> {
        self.screen.resize(cols, rows)?;
        self.config.cols = cols;
        self.config.rows = rows;

        if let Some(pty) = self.pty.as_mut() {
            let size = PtySize {
                rows: rows as u16,
                cols: cols as u16,
                ..PtySize::default()
            };
            if let Err(err) = pty.resize(size) {
                warn!("pty resize failed: {:#}", err);
            }
        }

        self.handlers.resized(cols, rows);
        Ok(())
    }

    /// Feed raw bytes as if they arrived from the child.
    pub fn feed(&mut self, data: &[u8]) {
        let mut sink = HostSink {
            pty: self.pty.as_mut(),
            title: &mut self.title,
            osc: &mut self.osc_strings,
        };
        self.vte.input(data, &mut self.screen, &mut sink);
    }

    /// Queue a host event for the next `process` pass.
    pub fn queue_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /* ---- event dispatch ---- */

    fn builtin_label(&mut self, label: &str) {
        match label {
            "LINE_UP" => {
                self.screen.sb_up(1);
            }
            "LINE_DOWN" => {
                self.screen.sb_down(1);
            }
            "PAGE_UP" => {
                self.screen.sb_page_up(1);
            }
            "PAGE_DOWN" => {
                self.screen.sb_page_down(1);
            }
            "COPY_AT" => {
                let (x, y) = self.screen.cursor();
                if let Some((sx, sy, ex, ey)) = self.screen.get_word(x, y) {
                    self.screen.selection_start(sx, sy);
                    self.screen.selection_target(ex, ey);
                    self.copy_buffer = self.screen.selection_copy();
                    self.screen.selection_reset();
                }
            }
            "COPY_ROW" => {
                let (_, y) = self.screen.cursor();
                self.screen.selection_start(0, y);
                self.screen.selection_target(self.screen.width() - 1, y);
                self.copy_buffer = self.screen.selection_copy();
                self.screen.selection_reset();
            }
            "COPY_WND" => {
                self.screen.selection_start(0, 0);
                self.screen
                    .selection_target(self.screen.width() - 1, self.screen.height() - 1);
                self.copy_buffer = self.screen.selection_copy();
                self.screen.selection_reset();
            }
            "SCROLL_LOCK" => {
                self.scroll_lock = !self.scroll_lock;
                if !self.scroll_lock {
                    self.screen.sb_reset();
                }
            }
            "MOUSE_FORWARD" => self.mouse_forward = !self.mouse_forward,
            other => debug!("unknown label {}", other),
        }
    }

    fn dispatch_event(&mut self, event: Event) {
        match event {
            Event::Key {
                sym,
                mods,
                codepoint,
            } => {
                if self.handlers.input_key(sym, mods, codepoint) {
                    return;
                }
                // typing snaps the view back to the live screen
                if !self.scroll_lock {
                    self.screen.sb_reset();
                }
                let mut sink = HostSink {
                    pty: self.pty.as_mut(),
                    title: &mut self.title,
                    osc: &mut self.osc_strings,
                };
                self.vte
                    .handle_keyboard(sym, mods, codepoint, &mut self.screen, &mut sink);
            }
            Event::Utf8(text) => {
                if self.handlers.input_utf8(&text) {
                    return;
                }
                if let Some(pty) = self.pty.as_mut() {
                    pty.write(&text);
                }
            }
            Event::MouseMotion { x, y, mods } => {
                self.handlers.input_mouse_motion(x, y, mods);
                let forward = self.mouse_forward && !self.vte.mouse_state().is_empty();
                if forward {
                    let mut sink = HostSink {
                        pty: self.pty.as_mut(),
                        title: &mut self.title,
                        osc: &mut self.osc_strings,
                    };
                    self.vte
                        .mouse_motion(x, y, mods, &mut self.screen, &mut sink);
                } else if self.screen.selection_active() {
                    self.screen.selection_target(x, y);
                }
            }
            Event::MouseButton {
                index,
                press,
                x,
                y,
                mods,
            } => {
                self.handlers.input_mouse_button(x, y, index, press, mods);
                let forward = self.mouse_forward && !self.vte.mouse_state().is_empty();
                if forward {
                    let mut sink = HostSink {
                        pty: self.pty.as_mut(),
                        title: &mut self.title,
                        osc: &mut self.osc_strings,
                    };
                    self.vte
                        .mouse_motion(x, y, mods, &mut self.screen, &mut sink);
                    self.vte
                        .mouse_button(index, press, mods, &mut self.screen, &mut sink);
                    return;
                }

                match index {
                    1 if press => self.screen.selection_start(x, y),
                    1 => {
                        self.screen.selection_target(x, y);
                        self.copy_buffer = self.screen.selection_copy();
                    }
                    4 if press => {
                        self.screen.sb_up(1);
                    }
                    5 if press => {
                        self.screen.sb_down(1);
                    }
                    _ => {}
                }
            }
            Event::Label { label, active } => {
                if self.handlers.input_label(&label, active) {
                    return;
                }
                if active {
                    self.builtin_label(&label);
                }
            }
            Event::Resize { cols, rows } => {
                if let Err(err) = self.resize(cols, rows) {
                    warn!("ignoring resize to {}x{}: {}", cols, rows, err);
                }
            }
            Event::Paste(data) => {
                let mut sink = HostSink {
                    pty: self.pty.as_mut(),
                    title: &mut self.title,
                    osc: &mut self.osc_strings,
                };
                self.vte.paste(&data, &mut self.screen, &mut sink);
            }
            Event::Reset(level) => {
                match level {
                    ResetLevel::Soft => self.vte.reset(&mut self.screen),
                    ResetLevel::Hard => self.vte.hard_reset(&mut self.screen),
                }
                self.handlers.reset(level);
            }
            Event::Geohint(lat, long, elev) => self.handlers.geohint(lat, long, elev),
            Event::State { input, fd } => self.handlers.state(input, fd),
            Event::Bchunk {
                input,
                extension,
                fd,
            } => self.handlers.bchunk(input, &extension, fd),
            Event::Subwindow { kind, id, accepted } => {
                self.handlers.subwindow(kind, id, accepted)
            }
            Event::Visibility { visible, focused } => {
                self.handlers.visibility(visible, focused)
            }
            Event::ExecState(state) => self.handlers.exec_state(state),
            Event::CliCommand(args) => self.handlers.cli_command(&args),
        }
    }

    /* ---- the loop ---- */

    /// Drain queued host events, then the pty.  Bytes from the child
    /// apply to the screen strictly in arrival order; handler
    /// callbacks run inline.
    ///
    /// A dead child is terminal for I/O but not for the context: the
    /// final screen remains drawable and the exit status is reported
    /// once.
    pub fn process(&mut self) -> Result<ProcessOutcome, TermError> {
        while let Some(event) = self.events.pop_front() {
            self.dispatch_event(event);
        }

        self.handlers.tick();

        if let Some(status) = self.exited {
            return Ok(ProcessOutcome::Exited(Some(status)));
        }

        let mut pty = match self.pty.take() {
            Some(pty) => pty,
            None => return Ok(ProcessOutcome::Idle),
        };

        let mut incoming: Vec<u8> = Vec::new();
        let outcome = pty.dispatch(&mut |data| incoming.extend_from_slice(data));

        match outcome {
            Ok(dispatch) => {
                self.pty = Some(pty);
                if !incoming.is_empty() {
                    self.feed(&incoming);
                    // anything the parse wrote back is flushed on the
                    // next dispatch; try once opportunistically
                    if let Some(pty) = self.pty.as_mut() {
                        let _ = pty.flush_writes();
                    }
                }
                match dispatch {
                    Dispatch::MorePending => Ok(ProcessOutcome::MorePending),
                    Dispatch::Drained => Ok(ProcessOutcome::Idle),
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::BrokenPipe => {
                if !incoming.is_empty() {
                    self.feed(&incoming);
                }
                let status = pty.wait().ok();
                self.exited = status;
                pty.close();
                self.pty = None;
                if status.is_none() {
                    self.set_last_words("child vanished without a status");
                }
                Ok(ProcessOutcome::Exited(status))
            }
            Err(e) => {
                pty.close();
                self.pty = None;
                self.set_last_words(&format!("pty i/o failed: {}", e));
                Err(TermError::BrokenConnection)
            }
        }
    }

    /// Walk the visible grid and emit draw calls.  Returns the age the
    /// renderer should store for filtering; 0 demands a full repaint.
    /// Cells whose effective age is not newer than the renderer's
    /// stored value can be skipped.
    pub fn refresh<F>(&mut self, cb: F) -> Age
    where
        F: FnMut(&DrawCell),
    {
        self.screen.inc_age();
        self.screen.draw(cb)
    }

    /// Tear the context down: close the pty, release handler table.
    /// In-flight handler invocations have already returned by the time
    /// this can be called (single-threaded contract), so this is
    /// immediate.
    pub fn destroy(&mut self) {
        if let Some(mut pty) = self.pty.take() {
            pty.close();
        }
        self.handlers = Box::new(NoHandlers);
        self.events.clear();
    }
}

impl Drop for TuiContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Best-effort capability reduction after the child is spawned and all
/// fds are in place.  Advisory: platforms without a pledge-style
/// facility get a no-op.
pub fn sandbox() {
    #[cfg(target_os = "openbsd")]
    unsafe {
        let promises = std::ffi::CString::new("stdio tty proc").expect("static promise string");
        if libc::pledge(promises.as_ptr(), std::ptr::null()) != 0 {
            warn!("pledge failed: {}", std::io::Error::last_os_error());
        }
    }

    #[cfg(not(target_os = "openbsd"))]
    debug!("no sandbox facility on this platform");
}
