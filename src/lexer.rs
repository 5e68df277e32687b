// Copyright (c) 2019-2021 The pisim developers

//! Tokenization and normalization.
//!
//! The lexer splits source text into control characters (`(`, `)`, `;`, `.`)
//! and action chunks. A fixed table of rewrite rules, anchored at the start
//! of the remaining input, desugars the extended syntax; every replacement is
//! re-tokenized, so rules may expand into forms that other rules handle.
//! After normalization each action token matches one of the core forms `+n`,
//! `n<-n`, `n<<n`, `n->n`.
//!
//! Each rule introduces helper bindings under its own synthetic name (`@1`,
//! `@2`, ...). Names are per rule, so expansions of different rules never
//! capture each other's helpers, and sequential expansions of the same rule
//! shadow lexically.
//!
//! A chunk that matches no rule is emitted as-is; the parser reports it.

use crate::loc::Loc;
use regex::Regex;

/// The characters that structure a program.
const CONTROL: &str = "(;.)";

/// An intermediate normal form piece: a core action string or one control
/// character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub loc: Loc,
    pub content: String,
}

impl Token {
    pub fn new(loc: Loc, content: impl Into<String>) -> Token {
        Token {
            loc,
            content: content.into(),
        }
    }
}

/// A rewrite from an extended form to its core expansion.
struct Rule {
    pattern: Regex,
    template: &'static str,
}

/// Operand class for a single name.
const NAME: &str = "\\s*([a-zA-Z0-9_@]+)\\s*";
/// Operand class for comma lists, as used by the variadic rules.
const ARG: &str = "([\\sa-zA-Z0-9_,@]*)";

/// The tokenizer, holding the compiled rewrite table.
pub struct Lexer {
    rules: Vec<Rule>,
}

impl Lexer {
    pub fn new() -> Lexer {
        let rule = |format: &str, template: &'static str, classes: &[&str]| {
            let mut pattern = format!("^{}", format);
            for class in classes {
                pattern = pattern.replacen("%v", class, 1);
            }
            Rule {
                pattern: Regex::new(&pattern).expect("rewrite pattern"),
                template,
            }
        };
        Lexer {
            rules: vec![
                // Comments run to the end of the line.
                rule("!.*", "", &[]),
                // The variadic rules come first: their operands may be empty,
                // so forms like `->b,c` must not be clipped by the short
                // rules further down.
                // Variadic create: +a,b
                rule("\\+%v,%v", "+$1;+$2", &[ARG, ARG]),
                // Variadic receive: a,b<-x
                rule("%v,%v<-%v", "$1<-$3;$2<-$3", &[ARG, ARG, NAME]),
                // Variadic send: a,b->x
                rule("%v,%v->%v", "$1->$3;$2->$3", &[ARG, ARG, NAME]),
                // Variadic send target: a->b,c
                rule("%v->%v,%v", "$1->$2;$1->$3", &[ARG, ARG, ARG]),
                // Create and announce: +y->x
                rule("\\+%v->%v", "+$1;$1->$2", &[NAME, NAME]),
                // Wait for a trigger: <-x
                rule("<-%v", "@1<-$1", &[NAME]),
                // Receive all triggers: <<x
                rule("<<%v", "@2<<$1", &[NAME]),
                // Trigger once: ->x
                rule("->%v", "+@3;@3->$1", &[NAME]),
                // Trigger and wait: <>x
                rule("<>%v", "+@4;@4->$1;<-@4", &[NAME]),
                // Forward channel: x>>y
                rule("%v>>%v", "@5<<$1;@5->$2", &[NAME, NAME]),
                // Tunnel: y>->x
                rule("%v>->%v", "+@6a;@6a->$2;@6b<-@6a;$1->@6b", &[NAME, NAME]),
                // Request: y<-<x
                rule("%v<-<%v", "+@7;@7->$2;$1<-@7", &[NAME, NAME]),
                // Serve one request: y<<-x
                rule("%v<<-%v", "@8a<-$2;+@8b->@8a;$1<-@8b", &[NAME, NAME]),
                // Serve all requests: y<<<x
                rule("%v<<<%v", "@9a<<$2;+@9b->@9a;$1<-@9b", &[NAME, NAME]),
            ],
        }
    }

    /// Tokenize a program. The result is normalized.
    ///
    /// With `relative` set, token locations are derived from `start` plus the
    /// position within `source`; rewrite expansions are re-tokenized without
    /// it so that every produced token keeps the location of the original
    /// extended form.
    pub fn tokenize(&self, source: &str, start: &Loc, relative: bool) -> Vec<Token> {
        let mut tokens = Vec::new();

        // Read line by line for easier location tracking.
        for (ln, line) in source.split('\n').enumerate() {
            let line_len = line.len();
            let mut rest = line;
            while !rest.is_empty() {
                rest = rest.trim_start();
                if rest.is_empty() {
                    break;
                }

                let loc = if relative {
                    Loc {
                        path: start.path.clone(),
                        line: start.line + ln,
                        col: line_len - rest.len() + 1,
                    }
                } else {
                    start.clone()
                };

                // Control characters are single tokens.
                let first = rest.chars().next().unwrap();
                if CONTROL.contains(first) {
                    tokens.push(Token::new(loc, first.to_string()));
                    rest = &rest[first.len_utf8()..];
                    continue;
                }

                // Fire the first matching rewrite rule and re-tokenize its
                // expansion in place.
                if let Some((end, replacement)) = self.rewrite(rest) {
                    tokens.extend(self.tokenize(&replacement, &loc, false));
                    rest = &rest[end..];
                    continue;
                }

                // Otherwise take everything up to the next control character
                // as one action chunk.
                let end = rest
                    .find(|c| CONTROL.contains(c))
                    .unwrap_or_else(|| rest.len());
                let chunk = rest[..end].trim_end();
                if !chunk.is_empty() {
                    tokens.push(Token::new(loc, chunk));
                }
                rest = &rest[end..];
            }
        }

        tokens
    }

    fn rewrite(&self, input: &str) -> Option<(usize, String)> {
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(input) {
                let mut replacement = String::new();
                caps.expand(rule.template, &mut replacement);
                return Some((caps.get(0).unwrap().end(), replacement));
            }
        }
        None
    }
}

impl Default for Lexer {
    fn default() -> Lexer {
        Lexer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(source: &str) -> Vec<String> {
        let lexer = Lexer::new();
        lexer
            .tokenize(source, &Loc::internal(), true)
            .into_iter()
            .map(|t| t.content)
            .collect()
    }

    fn check(source: &str, expected: &[&str]) {
        assert_eq!(contents(source), expected, "tokenizing {:?}", source);
    }

    #[test]
    fn core_forms_pass_through() {
        check(
            "+x;m<-x;n<<x;m->n.",
            &["+x", ";", "m<-x", ";", "n<<x", ";", "m->n", "."],
        );
    }

    #[test]
    fn groups_and_whitespace() {
        check(
            "+x;( m<-x.  n<<x. )",
            &["+x", ";", "(", "m<-x", ".", "n<<x", ".", ")"],
        );
    }

    #[test]
    fn comments() {
        check("! a comment\n+x. ! trailing\n", &["+x", "."]);
    }

    #[test]
    fn create_and_announce() {
        check("+y->x.", &["+y", ";", "y->x", "."]);
    }

    #[test]
    fn wait_and_receive_all() {
        check("<-x.", &["@1<-x", "."]);
        check("<<x.", &["@2<<x", "."]);
    }

    #[test]
    fn trigger_once() {
        check("->x.", &["+@3", ";", "@3->x", "."]);
    }

    #[test]
    fn trigger_and_wait() {
        // The expansion's own `<-@4` is rewritten again.
        check(
            "<>x;m->x.",
            &["+@4", ";", "@4->x", ";", "@1<-@4", ";", "m->x", "."],
        );
    }

    #[test]
    fn forward() {
        check("x>>y.", &["@5<<x", ";", "@5->y", "."]);
    }

    #[test]
    fn variadic_create() {
        check("+a,b.", &["+a", ";", "+b", "."]);
        check("+a,b,c.", &["+a", ";", "+b", ";", "+c", "."]);
    }

    #[test]
    fn variadic_receive_and_send() {
        check("a,b<-x.", &["a<-x", ";", "b<-x", "."]);
        check("a,b->x.", &["a->x", ";", "b->x", "."]);
        check("a->b,c.", &["a->b", ";", "a->c", "."]);
    }

    #[test]
    fn variadic_forms_compose_with_empty_operands() {
        // Multicast trigger: the empty left operand desugars per target.
        check(
            "->b,c.",
            &["+@3", ";", "@3->b", ";", "+@3", ";", "@3->c", "."],
        );
        // A comma list may carry an empty slot that desugars further.
        check("m,<-x.", &["m<-x", ";", "@1<-x", "."]);
    }

    #[test]
    fn tunnel_and_requests() {
        check(
            "y>->x.",
            &["+@6a", ";", "@6a->x", ";", "@6b<-@6a", ";", "y->@6b", "."],
        );
        check("y<-<x.", &["+@7", ";", "@7->x", ";", "y<-@7", "."]);
        // The serve rules re-enter the create-and-announce rule.
        check(
            "y<<-x.",
            &["@8a<-x", ";", "+@8b", ";", "@8b->@8a", ";", "y<-@8b", "."],
        );
        check(
            "y<<<x.",
            &["@9a<<x", ";", "+@9b", ";", "@9b->@9a", ";", "y<-@9b", "."],
        );
    }

    #[test]
    fn stalled_chunks_are_opaque() {
        check("x<*y.", &["x<*y", "."]);
    }

    #[test]
    fn locations_are_tracked() {
        let lexer = Lexer::new();
        let tokens = lexer.tokenize("+x;\n  m<-x.", &Loc::file("t.pi"), true);
        assert_eq!(tokens[0].loc.line, 1);
        assert_eq!(tokens[0].loc.col, 1);
        assert_eq!(tokens[2].loc.line, 2);
        assert_eq!(tokens[2].loc.col, 3);
    }

    #[test]
    fn expansions_keep_the_original_location() {
        let lexer = Lexer::new();
        let tokens = lexer.tokenize("\n  ->x.", &Loc::file("t.pi"), true);
        assert_eq!(tokens[0].content, "+@3");
        assert_eq!(tokens[0].loc.line, 2);
        assert_eq!(tokens[0].loc.col, 3);
        assert_eq!(tokens[2].loc, tokens[0].loc);
    }
}
