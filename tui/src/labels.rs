//! Input label announcement: named, rebindable actions the host can
//! attach to whatever input devices it likes.

/// One announced binding.
#[derive(Debug, Clone)]
pub struct LabelHint {
    pub label: &'static str,
    pub description: &'static str,
    /// Suggested glyph for menus, when one exists.
    pub vsym: Option<char>,
}

/// Built-in labels every terminal context announces; handled
/// internally when the client's handler table declines them.
pub const BUILTIN_LABELS: &[LabelHint] = &[
    LabelHint {
        label: "LINE_UP",
        description: "Scroll one row up",
        vsym: Some('\u{21e1}'),
    },
    LabelHint {
        label: "LINE_DOWN",
        description: "Scroll one row down",
        vsym: Some('\u{21e3}'),
    },
    LabelHint {
        label: "PAGE_UP",
        description: "Scroll one page up",
        vsym: Some('\u{21de}'),
    },
    LabelHint {
        label: "PAGE_DOWN",
        description: "Scroll one page down",
        vsym: Some('\u{21df}'),
    },
    LabelHint {
        label: "COPY_AT",
        description: "Copy word at cursor",
        vsym: None,
    },
    LabelHint {
        label: "COPY_ROW",
        description: "Copy cursor row",
        vsym: None,
    },
    LabelHint {
        label: "COPY_WND",
        description: "Copy window",
        vsym: None,
    },
    LabelHint {
        label: "SCROLL_LOCK",
        description: "Lock the view against following output",
        vsym: None,
    },
    LabelHint {
        label: "MOUSE_FORWARD",
        description: "Toggle mouse forwarding to the client",
        vsym: None,
    },
];
