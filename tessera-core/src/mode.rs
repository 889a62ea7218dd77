//! Cache population mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Population strategy, fixed when a cache is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// The map mirrors the entire store from construction onward.
    Eager,
    /// Entries are fetched from the store on first access.
    #[default]
    Lazy,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Eager => "eager",
            CacheMode::Lazy => "lazy",
        }
    }

    pub fn is_eager(&self) -> bool {
        matches!(self, CacheMode::Eager)
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, CacheMode::Lazy)
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = CacheModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eager" => Ok(CacheMode::Eager),
            "lazy" => Ok(CacheMode::Lazy),
            _ => Err(CacheModeParseError(s.to_string())),
        }
    }
}

/// Error when parsing an unknown cache mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid cache mode: {0} (expected \"eager\" or \"lazy\")")]
pub struct CacheModeParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("EAGER".parse::<CacheMode>().unwrap(), CacheMode::Eager);
        assert_eq!(" lazy ".parse::<CacheMode>().unwrap(), CacheMode::Lazy);
        assert!("sometimes".parse::<CacheMode>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for mode in [CacheMode::Eager, CacheMode::Lazy] {
            assert_eq!(mode.to_string().parse::<CacheMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_default_is_lazy() {
        assert!(CacheMode::default().is_lazy());
        assert!(!CacheMode::default().is_eager());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any casing and surrounding whitespace parses to the same mode.
            #[test]
            fn parse_ignores_case_and_padding(
                eager in any::<bool>(),
                upper in prop::collection::vec(any::<bool>(), 5),
                pad in "[ \t]{0,3}",
            ) {
                let mode = if eager { CacheMode::Eager } else { CacheMode::Lazy };
                let cased: String = mode
                    .as_str()
                    .chars()
                    .zip(upper.iter().cycle())
                    .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
                    .collect();
                let input = format!("{}{}{}", pad, cased, pad);
                prop_assert_eq!(input.parse::<CacheMode>().unwrap(), mode);
            }

            /// Anything that is not a mode name is rejected.
            #[test]
            fn parse_rejects_other_words(word in "[a-z]{1,10}") {
                prop_assume!(word != "eager" && word != "lazy");
                prop_assert!(word.parse::<CacheMode>().is_err());
            }
        }
    }
}
