// crates/show_block_start/src/config.rs

use std::env;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Environment variable consulted when no `--color` is given.
pub const COLOR_ENV: &str = "BLOCK_HIGHLIGHT_COLOR";

pub const DEFAULT_COLOR: &str = "#BABABA";

static COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-F]{6}$").unwrap());

/// A validated `#RRGGBB` background color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightColor {
    hex: String,
    rgb: (u8, u8, u8),
}

impl HighlightColor {
    /// Accepts upper-case `#RRGGBB` only.
    pub fn parse(value: &str) -> Option<Self> {
        if !COLOR_RE.is_match(value) {
            return None;
        }
        let channel = |at: usize| u8::from_str_radix(&value[at..at + 2], 16).ok();
        Some(Self {
            hex: value.to_string(),
            rgb: (channel(1)?, channel(3)?, channel(5)?),
        })
    }

    /// Parses `value`, falling back to [`DEFAULT_COLOR`] when it is absent or
    /// malformed.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.and_then(Self::parse) {
            Some(color) => color,
            None => {
                if let Some(rejected) = value {
                    log::debug!("ignoring highlight color {rejected:?}, using {DEFAULT_COLOR}");
                }
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        self.rgb
    }
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self {
            hex: DEFAULT_COLOR.to_string(),
            rgb: (0xBA, 0xBA, 0xBA),
        }
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Runtime configuration composed from CLI + environment.
#[derive(Clone, Debug, Default)]
pub struct HighlightConfig {
    pub color: HighlightColor,
}

impl HighlightConfig {
    /// The `--color` value wins; otherwise [`COLOR_ENV`] is read.
    pub fn from_args(color_arg: Option<&str>) -> Self {
        let from_env = env::var(COLOR_ENV).ok();
        Self::compose(color_arg, from_env.as_deref())
    }

    fn compose(color_arg: Option<&str>, color_env: Option<&str>) -> Self {
        Self { color: HighlightColor::parse_or_default(color_arg.or(color_env)) }
    }
}
