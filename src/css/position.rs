//! Background position model.
//!
//! Each axis is a tagged [`Offset`]. Two-token positions are disambiguated by
//! keyword: `top`/`bottom` pin the vertical axis, `left`/`right` pin the
//! horizontal one, and `center` falls on whichever axis is left over.

use regex::Regex;
use std::sync::LazyLock;

/// Pixel offsets (`50`, `-50`, `50px`, `1.5px`).
static UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d+(?:\.\d+)?)(?:px)?$").unwrap());

/// Percentage offsets (`50%`, `12.5%`).
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d+(?:\.\d+)?)%$").unwrap());

/// Anything number-shaped, including relative units we cannot honor (`2em`).
static LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d+)?(?:[a-z]+|%)?$").unwrap());

/// Position keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
    Center,
}

impl Direction {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "center" => Some(Self::Center),
            _ => None,
        }
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Offset along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Offset {
    Direction(Direction),
    Percent(i32),
    /// Absolute pixels.
    Unit(i32),
}

impl Default for Offset {
    fn default() -> Self {
        Self::Percent(0)
    }
}

impl Offset {
    /// Parse a lower-cased position token.
    ///
    /// Fractions round to the nearest whole value. Lengths in units other
    /// than `px` fall back to the default offset.
    pub fn parse(token: &str) -> Self {
        if let Some(direction) = Direction::parse(token) {
            return Self::Direction(direction);
        }
        if let Some(n) = UNIT_RE.captures(token).and_then(|caps| whole(&caps[1])) {
            return Self::Unit(n);
        }
        if let Some(n) = PERCENT_RE.captures(token).and_then(|caps| whole(&caps[1])) {
            return Self::Percent(n);
        }
        Self::default()
    }

    /// Whether a lower-cased token belongs to a position list.
    pub fn is_position_token(token: &str) -> bool {
        Direction::parse(token).is_some() || LENGTH_RE.is_match(token)
    }

    #[inline]
    fn is_vertical_keyword(token: &str) -> bool {
        Direction::parse(token).is_some_and(Direction::is_vertical)
    }

    #[inline]
    fn is_horizontal_keyword(token: &str) -> bool {
        Direction::parse(token).is_some_and(Direction::is_horizontal)
    }

    /// Render this offset for a region packed `packed` pixels into a sheet.
    pub fn render(self, packed: u32) -> String {
        match self {
            Self::Unit(n) => format!("{}px", i64::from(n) - i64::from(packed)),
            // Relative placement has no meaning inside a sheet; pin to the region origin.
            Self::Percent(_) | Self::Direction(_) => format!("-{packed}px"),
        }
    }
}

/// Parse a decimal and round it to a whole number.
fn whole(number: &str) -> Option<i32> {
    let n: f64 = number.parse().ok()?;
    let n = n.round();
    (f64::from(i32::MIN)..=f64::from(i32::MAX))
        .contains(&n)
        .then_some(n as i32)
}

/// Both axes of a background position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: Offset,
    pub y: Offset,
}

impl Position {
    /// Apply a list of lower-cased position tokens on top of the current value.
    ///
    /// A single token only touches the axis it names. With two tokens the pair
    /// is read as `y x` when the first pins the vertical axis or the second pins
    /// the horizontal one, and as `x y` otherwise. Three- and four-value
    /// positions (`right 10px top 5px`) are edge offsets we do not model; they
    /// leave the position unchanged.
    pub fn apply(&mut self, tokens: &[&str]) {
        match tokens {
            [] | [_, _, _, ..] => {}
            [only] => {
                if Offset::is_vertical_keyword(only) {
                    self.y = Offset::parse(only);
                } else {
                    self.x = Offset::parse(only);
                }
            }
            [first, second] => {
                if Offset::is_vertical_keyword(first) || Offset::is_horizontal_keyword(second) {
                    self.y = Offset::parse(first);
                    self.x = Offset::parse(second);
                } else {
                    self.x = Offset::parse(first);
                    self.y = Offset::parse(second);
                }
            }
        }
    }
}
