//! Hemisphere selection and two-sided results.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;

/// Brain hemisphere. Left copies carry negative ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Left,
    Right,
}

impl FromStr for Hemisphere {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(AtlasError::InvalidHemisphere(s.to_string())),
        }
    }
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Result of a hemisphere-filtered lookup.
///
/// `Both` keeps left-hemisphere values first, matching the store layout
/// convention of reporting the negative-id side before the positive one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lateral<T> {
    Single(Vec<T>),
    Both { left: Vec<T>, right: Vec<T> },
}

impl<T> Lateral<T> {
    /// Flatten, left values first.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Single(v) => v,
            Self::Both { mut left, right } => {
                left.extend(right);
                left
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(v) => v.len(),
            Self::Both { left, right } => left.len() + right.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn map<U>(self, mut f: impl FnMut(T) -> U) -> Lateral<U> {
        match self {
            Self::Single(v) => Lateral::Single(v.into_iter().map(&mut f).collect()),
            Self::Both { left, right } => Lateral::Both {
                left: left.into_iter().map(&mut f).collect(),
                right: right.into_iter().map(&mut f).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Left".parse::<Hemisphere>().unwrap(), Hemisphere::Left);
        assert_eq!("right".parse::<Hemisphere>().unwrap(), Hemisphere::Right);
        assert!(matches!(
            "both".parse::<Hemisphere>(),
            Err(AtlasError::InvalidHemisphere(_))
        ));
    }

    #[test]
    fn both_flattens_left_first() {
        let l = Lateral::Both {
            left: vec![-1, -2],
            right: vec![1, 2],
        };
        assert_eq!(l.len(), 4);
        assert_eq!(l.into_vec(), vec![-1, -2, 1, 2]);
    }
}
