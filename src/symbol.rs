use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

/// End-of-input marker. Never part of a grammar's declared alphabet.
pub const END: &str = "$";

/// Empty-string marker, used in FIRST sets to signal nullability.
pub const EPSILON: &str = "ε";

/// Symbol emitted by the scanner when no lexical rule matches.
pub const ERROR: &str = "ERR";

/// A grammar symbol.
///
/// Whether a symbol is a terminal or a nonterminal is not a property of the
/// symbol itself; it is decided by the grammar that declares it (every LHS is
/// a nonterminal, everything else on a RHS is a terminal).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `$` end-of-input marker.
    pub fn end() -> Self {
        Self(END.to_string())
    }

    /// The `ε` empty-string marker.
    pub fn epsilon() -> Self {
        Self(EPSILON.to_string())
    }

    /// The `ERR` scanner-failure marker.
    pub fn error() -> Self {
        Self(ERROR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline(always)]
    pub fn is_end(&self) -> bool {
        self.0 == END
    }

    #[inline(always)]
    pub fn is_epsilon(&self) -> bool {
        self.0 == EPSILON
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Symbol {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
