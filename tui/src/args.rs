//! Packed `key=value:key=value` argument strings, as handed over on
//! the connection command line.  `\:` escapes a literal colon inside a
//! value.  Unknown keys are ignored so older cores keep working with
//! newer launchers.

use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct ArgMap {
    /// Key to values, in order of appearance (keys may repeat).
    entries: BTreeMap<String, Vec<String>>,
}

impl ArgMap {
    /// Split a packed string.  Pairs without `=` become bare flags
    /// with an empty value.
    pub fn parse(packed: &str) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();

        let mut field = String::new();
        let mut fields = Vec::new();
        let mut chars = packed.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(':') => field.push(':'),
                    Some(other) => {
                        field.push('\\');
                        field.push(other);
                    }
                    None => field.push('\\'),
                },
                ':' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
        fields.push(field);

        for field in fields {
            if field.is_empty() {
                continue;
            }
            let (key, value) = match field.find('=') {
                Some(at) => (field[..at].to_string(), field[at + 1..].to_string()),
                None => (field, String::new()),
            };
            entries.entry(key).or_default().push(value);
        }

        ArgMap { entries }
    }

    /// nth value for a key, mirroring repeated-key lookups.
    pub fn lookup(&self, key: &str, index: usize) -> Option<&str> {
        self.entries.get(key)?.get(index).map(|s| s.as_str())
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.lookup(key, 0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn number<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.value(key)?.parse().ok()
    }
}

/// Cursor styles a renderer can draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorStyle {
    Block,
    HalfBlock,
    Frame,
    VLine,
    ULine,
}

impl Default for CursorStyle {
    fn default() -> Self {
        CursorStyle::Block
    }
}

/// Font hinting requests forwarded to the renderer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FontHint {
    Light,
    Mono,
    Normal,
    Subpixel,
}

/// The subset of the connection arguments the core inspects.  Every
/// field keeps its default when the corresponding key is missing or
/// fails to parse.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    pub rows: usize,
    pub cols: usize,
    pub ppcm: Option<f32>,
    pub bg: Option<[u8; 3]>,
    pub fg: Option<[u8; 3]>,
    pub bg_alpha: u8,
    /// Cursor color override.
    pub cc: Option<[u8; 3]>,
    /// Locked-cursor color override.
    pub cl: Option<[u8; 3]>,
    pub cursor: CursorStyle,
    pub login: Option<Option<String>>,
    pub palette: Option<String>,
    pub font: Option<String>,
    pub font_fallback: Option<String>,
    pub font_size: Option<f32>,
    pub font_hint: Option<FontHint>,
}

impl Default for TuiConfig {
    fn default() -> Self {
        TuiConfig {
            rows: 24,
            cols: 80,
            ppcm: None,
            bg: None,
            fg: None,
            bg_alpha: 0xff,
            cc: None,
            cl: None,
            cursor: CursorStyle::default(),
            login: None,
            palette: None,
            font: None,
            font_fallback: None,
            font_size: None,
            font_hint: None,
        }
    }
}

fn rgb_triple(args: &ArgMap, r: &str, g: &str, b: &str) -> Option<[u8; 3]> {
    Some([
        args.value(r)?.parse().ok()?,
        args.value(g)?.parse().ok()?,
        args.value(b)?.parse().ok()?,
    ])
}

impl TuiConfig {
    pub fn from_packed(packed: &str) -> Self {
        let args = ArgMap::parse(packed);
        TuiConfig::from_args(&args)
    }

    pub fn from_args(args: &ArgMap) -> Self {
        let mut cfg = TuiConfig::default();

        if let Some(rows) = args.number("rows") {
            if rows > 0 {
                cfg.rows = rows;
            }
        }
        if let Some(cols) = args.number("cols") {
            if cols > 0 {
                cfg.cols = cols;
            }
        }
        cfg.ppcm = args.number("ppcm").filter(|v: &f32| *v > 0.0);

        cfg.bg = rgb_triple(args, "bgr", "bgg", "bgb");
        cfg.fg = rgb_triple(args, "fgr", "fgg", "fgb");
        cfg.cc = rgb_triple(args, "ccr", "ccg", "ccb");
        cfg.cl = rgb_triple(args, "clr", "clg", "clb");

        if let Some(alpha) = args.number("bgalpha") {
            cfg.bg_alpha = alpha;
        }

        if let Some(style) = args.value("cursor") {
            cfg.cursor = match style {
                "block" => CursorStyle::Block,
                "halfblock" => CursorStyle::HalfBlock,
                "frame" => CursorStyle::Frame,
                "vline" => CursorStyle::VLine,
                "uline" => CursorStyle::ULine,
                _ => cfg.cursor,
            };
        }

        if args.contains("login") {
            let user = args.value("login").filter(|v| !v.is_empty());
            cfg.login = Some(user.map(|u| u.to_string()));
        }

        cfg.palette = args.value("palette").map(|p| p.to_string());
        cfg.font = args.value("font").map(|f| f.to_string());
        cfg.font_fallback = args.value("font_fb").map(|f| f.to_string());
        cfg.font_size = args.number("font_sz").filter(|v: &f32| *v > 0.0);

        cfg.font_hint = match args.value("font_hint") {
            Some("light") => Some(FontHint::Light),
            Some("mono") => Some(FontHint::Mono),
            Some("normal") => Some(FontHint::Normal),
            Some("subpixel") => Some(FontHint::Subpixel),
            _ => None,
        };

        cfg
    }
}
