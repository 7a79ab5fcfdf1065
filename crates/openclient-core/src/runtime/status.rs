//! Status-code patterns such as `200`, `4xx` and `default`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A response key, matched against actual status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusPattern {
    /// Inclusive range; an exact code has `min == max`
    Range { min: u16, max: u16 },
    /// Fallback used only when no range matches
    Default,
}

impl StatusPattern {
    pub const fn exact(code: u16) -> Self {
        Self::Range {
            min: code,
            max: code,
        }
    }

    /// Whether `status` falls in this pattern's range. `default` contains nothing.
    pub fn contains(&self, status: u16) -> bool {
        match self {
            Self::Range { min, max } => (*min..=*max).contains(&status),
            Self::Default => false,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Index of the pattern that handles `status`.
    ///
    /// The first range in declaration order wins; `default` is considered
    /// only when no range matches.
    pub fn select<'a, I>(patterns: I, status: u16) -> Option<usize>
    where
        I: IntoIterator<Item = &'a StatusPattern>,
    {
        let mut fallback = None;
        for (index, pattern) in patterns.into_iter().enumerate() {
            if pattern.contains(status) {
                return Some(index);
            }
            if pattern.is_default() && fallback.is_none() {
                fallback = Some(index);
            }
        }
        fallback
    }
}

impl FromStr for StatusPattern {
    type Err = Error;

    /// Parse `default` or three characters of `[0-9x]`; `X` is read as `x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(Self::Default);
        }
        let invalid = || Error::InvalidStatusPattern(s.to_string());
        if s.len() != 3 {
            return Err(invalid());
        }

        let (mut min, mut max) = (0u16, 0u16);
        for c in s.chars() {
            let (low, high) = match c {
                'x' | 'X' => (0, 9),
                '0'..='9' => {
                    let digit = c.to_digit(10).ok_or_else(invalid)? as u16;
                    (digit, digit)
                }
                _ => return Err(invalid()),
            };
            min = min * 10 + low;
            max = max * 10 + high;
        }
        Ok(Self::Range { min, max })
    }
}

impl fmt::Display for StatusPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { min, max } if min == max => write!(f, "{min}"),
            Self::Range { min, max } => write!(f, "{min}-{max}"),
            Self::Default => f.write_str("default"),
        }
    }
}
