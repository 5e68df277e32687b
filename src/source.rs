// Copyright (c) 2019-2021 The pisim developers

//! Loading the closure of source text.
//!
//! A source file may begin with header lines of the form `#KEY:VALUE`,
//! terminated by the first line that is neither a directive, blank, nor a
//! comment. `#attach:RELPATH` queues another file for inclusion, resolved
//! against the directory of the containing file and deduplicated across the
//! whole closure. `#global:NAME` declares a channel every file can use; the
//! program is wrapped in `+NAME; …` for each global, outside one parallel
//! group containing all file bodies, so the wrapping happens on the token
//! stream before parsing and the names are lexically visible everywhere.

use crate::lexer::{Lexer, Token};
use crate::loc::Loc;
use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Split the leading directives off a source text. Returns the attach
/// paths, the global names, the 0-based line the body starts at, and the
/// body itself.
pub fn extract_directives(source: &str) -> (Vec<String>, Vec<String>, usize, String) {
    let directive = Regex::new("^#([^:]+):([^!]*)").expect("directive pattern");
    let mut attach = Vec::new();
    let mut global = Vec::new();
    let lines: Vec<&str> = source.split('\n').collect();
    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if let Some(caps) = directive.captures(line) {
            let value = caps[2].trim().to_string();
            match &caps[1] {
                "attach" => attach.push(value),
                "global" => global.push(value),
                _ => {}
            }
        } else if line.is_empty() || line.starts_with('!') {
            // Blank lines and comments are allowed between directives.
            continue;
        } else {
            return (attach, global, i, lines[i..].join("\n"));
        }
    }
    (attach, global, lines.len(), String::new())
}

/// Tokenize the transitive closure of the given files and assemble the
/// program token stream, with every `#global` binding wrapped around one
/// group holding all file bodies.
pub fn load_program(lexer: &Lexer, paths: &[PathBuf]) -> Result<Vec<Token>> {
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    for path in paths {
        if seen.insert(dedup_key(path)) {
            queue.push_back(path.clone());
        }
    }

    let mut globals = Vec::new();
    let mut body_tokens = Vec::new();
    while let Some(path) = queue.pop_front() {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let (attach, global, body_line, body) = extract_directives(&source);

        for rel in attach {
            let target = path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(rel.trim());
            if seen.insert(dedup_key(&target)) {
                debug!("attaching {}", target.display());
                queue.push_back(target);
            }
        }
        globals.extend(global);

        let start = Loc {
            path: Some(path.display().to_string().into()),
            line: body_line + 1,
            col: 1,
        };
        body_tokens.extend(lexer.tokenize(&body, &start, true));
    }

    let loc = Loc::internal();
    let mut tokens = Vec::new();
    for name in globals.into_iter().unique() {
        tokens.push(Token::new(loc.clone(), format!("+{}", name)));
        tokens.push(Token::new(loc.clone(), ";"));
    }
    tokens.push(Token::new(loc.clone(), "("));
    tokens.extend(body_tokens);
    tokens.push(Token::new(loc, ")"));
    Ok(tokens)
}

/// Inclusion is deduplicated on canonical paths where possible, so the same
/// file attached through different relative routes is read once.
fn dedup_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_stop_at_the_first_code_line() {
        let source = "#attach:lib.pi\n! comment\n\n#global:bus\n+x;x->x.\n";
        let (attach, global, line, body) = extract_directives(source);
        assert_eq!(attach, vec!["lib.pi"]);
        assert_eq!(global, vec!["bus"]);
        assert_eq!(line, 4);
        assert_eq!(body, "+x;x->x.\n");
    }

    #[test]
    fn directive_values_strip_comments() {
        let (attach, _, _, _) = extract_directives("#attach: lib.pi ! the library\n+x.\n");
        assert_eq!(attach, vec!["lib.pi"]);
    }

    #[test]
    fn directives_only_at_the_top() {
        let (attach, global, line, body) = extract_directives("+x.\n#global:bus\n");
        assert!(attach.is_empty());
        assert!(global.is_empty());
        assert_eq!(line, 0);
        assert_eq!(body, "+x.\n#global:bus\n");
    }
}
