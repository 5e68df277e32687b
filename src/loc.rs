// Copyright (c) 2019-2021 The pisim developers

//! Source locations carried through tokens and processes for diagnostics.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A location in a source file.
///
/// Locations produced by rewrite expansions and synthesized wrappers have no
/// path and print as `<internal>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Loc {
    /// Path of the containing file, if any.
    pub path: Option<Arc<str>>,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub col: usize,
}

impl Loc {
    /// Create a location at the start of a file.
    pub fn file(path: &str) -> Loc {
        Loc {
            path: Some(Arc::from(path)),
            line: 1,
            col: 1,
        }
    }

    /// The location of synthesized constructs.
    pub fn internal() -> Loc {
        Default::default()
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.path {
            Some(ref path) => {
                let base = Path::new(path.as_ref())
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.as_ref().to_owned());
                write!(f, "{}:{}:{}", base, self.line, self.col)
            }
            None => write!(f, "<internal>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(format!("{}", Loc::internal()), "<internal>");
        let mut loc = Loc::file("progs/echo.pi");
        loc.line = 4;
        loc.col = 7;
        assert_eq!(format!("{}", loc), "echo.pi:4:7");
    }
}
