//! One stylesheet rule reduced to the background properties we sprite.
//!
//! Parsing is tolerant: properties are read in document order and the last
//! occurrence wins, so a `background` shorthand can be refined by later
//! longhands (`background-repeat`, `background-position`, ...).

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

use super::position::{Offset, Position};
use crate::image::sprite::SpritePlacement;

/// `url(...)` with optional quoting; group 2 is the raw url.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(['"]?)([^'")]*)(['"]?)\s*\)"#).unwrap()
});

/// Any css function call, stripped before tokenizing a shorthand.
static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z-]+\([^)]*\)").unwrap());

/// Block comment; an unterminated one runs to the end of the text.
pub(super) static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?(?:\*/|$)").unwrap());

/// Whole-pixel dimension, unit optional.
static DIMENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)(?:px)?$").unwrap());

/// Why a rule could not be turned into a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("rule has no background image")]
    MissingImage,

    #[error("inline data image cannot be sprited")]
    InlineImage,
}

/// How the background image tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repeat {
    #[default]
    Repeat,
    NoRepeat,
    RepeatX,
    RepeatY,
}

impl Repeat {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "repeat" => Some(Self::Repeat),
            "no-repeat" => Some(Self::NoRepeat),
            "repeat-x" | "x-repeat" => Some(Self::RepeatX),
            "repeat-y" | "y-repeat" => Some(Self::RepeatY),
            _ => None,
        }
    }
}

/// Background properties of a single rule block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundDeclaration {
    /// Exact rule text as found in the stylesheet.
    original: String,
    /// Byte offset of `original` in its stylesheet.
    offset: usize,
    /// Url of the stylesheet the rule came from.
    base_url: String,
    /// Image url as written in the rule.
    raw_image: String,
    /// Image url resolved against `base_url`.
    image_url: String,
    repeat: Repeat,
    width: Option<u32>,
    height: Option<u32>,
    position: Position,
}

impl BackgroundDeclaration {
    /// Parse a rule block (`selector { ... }`) from the stylesheet at `base_url`.
    pub fn parse(rule: &str, base_url: &str) -> Result<Self, ParseError> {
        let mut decl = Self {
            original: rule.to_string(),
            offset: 0,
            base_url: base_url.to_string(),
            raw_image: String::new(),
            image_url: String::new(),
            repeat: Repeat::default(),
            width: None,
            height: None,
            position: Position::default(),
        };

        let body = COMMENT_RE.replace_all(rule_body(rule), "");
        let mut image = None;

        for (property, value) in properties(&body) {
            match property.as_str() {
                "background" | "background-image" => {
                    // A later value without a url (`#fff`, `none`) drops the image.
                    image = extract_url(value);
                    decl.apply_shorthand(value);
                }
                "background-repeat" => {
                    let keyword = value.to_ascii_lowercase();
                    if let Some(repeat) = keyword.split_whitespace().find_map(Repeat::parse) {
                        decl.repeat = repeat;
                    }
                }
                "background-position" => {
                    let value = value.to_ascii_lowercase();
                    let tokens: Vec<&str> = value.split_whitespace().collect();
                    decl.position.apply(&tokens);
                }
                "width" | "max-width" => decl.width = parse_dimension(value),
                "height" | "max-height" => decl.height = parse_dimension(value),
                _ => {}
            }
        }

        let raw = image.ok_or(ParseError::MissingImage)?;
        if raw.is_empty() {
            return Err(ParseError::MissingImage);
        }
        if raw.to_ascii_lowercase().starts_with("data:") {
            return Err(ParseError::InlineImage);
        }

        decl.image_url = resolve_url(base_url, &raw);
        decl.raw_image = raw;
        Ok(decl)
    }

    /// Pick repeat keywords and position tokens out of a shorthand value.
    fn apply_shorthand(&mut self, value: &str) {
        let stripped = FUNCTION_RE
            .replace_all(value, " ")
            .to_ascii_lowercase()
            .replace('/', " / ");
        let mut tokens = Vec::new();
        // Lengths after `/` are the background size, not the position.
        let mut in_size = false;
        for token in stripped.split_whitespace() {
            if token == "/" {
                in_size = true;
            } else if Offset::is_position_token(token) {
                if !in_size {
                    tokens.push(token);
                }
            } else {
                in_size = false;
                if let Some(repeat) = Repeat::parse(token) {
                    self.repeat = repeat;
                }
            }
        }
        self.position.apply(&tokens);
    }

    /// Rewrite the rule to show `placement` out of its sprite sheet.
    ///
    /// The selector is lower-cased, the image url swapped for the sheet url,
    /// and a position/no-repeat pair appended before the closing brace.
    pub fn render(&self, placement: &SpritePlacement) -> String {
        let (selector, rest) = match self.original.find('{') {
            Some(idx) => self.original.split_at(idx),
            None => ("", self.original.as_str()),
        };

        let mut rest = rest.to_string();
        let image_range = URL_RE
            .captures_iter(&rest)
            .filter(|caps| caps[2].trim() == self.raw_image)
            .last()
            .and_then(|caps| caps.get(0))
            .map(|m| m.range());
        if let Some(range) = image_range {
            rest.replace_range(range, &format!("url(\"{}\")", placement.url));
        }
        if let Some(idx) = rest.rfind('}') {
            rest.truncate(idx);
        }

        format!(
            "{}{};background-position: {} {};background-repeat: no-repeat;}}",
            selector.to_lowercase(),
            rest,
            self.position.x.render(placement.x),
            self.position.y.render(placement.y),
        )
    }

    /// Record where the rule starts in its stylesheet.
    pub(super) fn at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Byte range of the rule in the stylesheet it was extracted from.
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.original.len()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn x_offset(&self) -> Offset {
        self.position.x
    }

    pub fn y_offset(&self) -> Offset {
        self.position.y
    }
}

/// Text between the first `{` and the last `}`.
fn rule_body(rule: &str) -> &str {
    let start = rule.find('{').map_or(0, |i| i + 1);
    let end = rule.rfind('}').filter(|&i| i >= start).unwrap_or(rule.len());
    &rule[start..end]
}

/// `property: value` pairs in order; property names lower-cased.
fn properties(body: &str) -> impl Iterator<Item = (String, &str)> {
    body.split(';').filter_map(|decl| {
        let (property, value) = decl.split_once(':')?;
        Some((property.trim().to_ascii_lowercase(), value.trim()))
    })
}

fn extract_url(value: &str) -> Option<String> {
    URL_RE
        .captures(value)
        .map(|caps| caps[2].trim().to_string())
}

fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim_end_matches("!important").trim();
    DIMENSION_RE
        .captures(value)
        .and_then(|caps| caps[1].parse().ok())
}

/// Resolve `raw` against the stylesheet url; absolute urls are kept verbatim.
fn resolve_url(base_url: &str, raw: &str) -> String {
    if Url::parse(raw).is_ok() {
        return raw.to_string();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(raw))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| raw.to_string())
}
