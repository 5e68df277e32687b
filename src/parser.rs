// Copyright (c) 2019-2021 The pisim developers

//! Parsing of normalized tokens into core processes.
//!
//! The parser is a small recursive loop over the token stream. Errors do not
//! abort it: they accumulate in an error list while parsing continues
//! best-effort, so a source file reports as many problems as possible in one
//! pass.
//!
//! Name resolution works on a binding map from name to reference index. The
//! map and the reference counter are both passed by value into every group
//! member, which gives `(` ... `)` groups lexical scope and keeps reference
//! indices dense along every ancestor chain. The counter starts at
//! `RESERVED`, mirroring the reserved identity prefix every node carries at
//! run time.

use crate::lexer::Token;
use crate::loc::Loc;
use crate::proc::{Action, Proc, Ref};
use crate::reserved::{Resolver, RESERVED};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

/// A single parse diagnostic.
#[derive(Clone, Debug)]
pub struct ParseError {
    pub loc: Loc,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}; {}", self.loc, self.message)
    }
}

/// The diagnostics accumulated over one parse.
#[derive(Debug, Default)]
pub struct ParseErrors(pub Vec<ParseError>);

impl Deref for ParseErrors {
    type Target = Vec<ParseError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for err in self.iter() {
            writeln!(f, "- {}", err)?;
        }
        Ok(())
    }
}

/// Parse a token stream into a list of core processes.
///
/// Returns the processes alongside the error list; callers decide whether a
/// non-empty list aborts the run.
pub fn parse(tokens: &[Token]) -> (Vec<Proc>, ParseErrors) {
    let mut parser = Parser::new(tokens);
    let bound = HashMap::new();
    let mut procs = Vec::new();
    loop {
        match parser.peek() {
            None => break,
            Some(tok) if tok.content == ")" => {
                let remaining = tokens.len() - parser.pos;
                let loc = tok.loc.clone();
                parser.error(loc, format!("{} unparsed tokens remain", remaining));
                break;
            }
            Some(_) => procs.extend(parser.parse_proc(bound.clone(), RESERVED)),
        }
    }
    (procs, ParseErrors(parser.errors))
}

type Bindings = HashMap<String, usize>;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<ParseError>,
    reserved: Resolver,
    new_ref: Regex,
    subs_one: Regex,
    subs_all: Regex,
    send: Regex,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Parser<'a> {
        let name = "([a-zA-Z0-9_@]+)";
        let form = |f: &str| Regex::new(&f.replace("%v", name)).expect("core pattern");
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
            reserved: Resolver::new(),
            new_ref: form("^\\+%v$"),
            subs_one: form("^%v<-%v$"),
            subs_all: form("^%v<<%v$"),
            send: form("^%v->%v$"),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn error(&mut self, loc: Loc, message: impl Into<String>) {
        self.errors.push(ParseError {
            loc,
            message: message.into(),
        });
    }

    /// Parse one process. Returns a list because a parenthesized group stands
    /// for all of its members.
    fn parse_proc(&mut self, mut bound: Bindings, counter: usize) -> Vec<Proc> {
        loop {
            let tok = match self.peek() {
                Some(tok) => tok.clone(),
                None => return vec![],
            };
            match tok.content.as_str() {
                "(" => return self.parse_group(tok.loc, bound, counter),
                ")" => {
                    self.error(tok.loc, "expected a process");
                    return vec![];
                }
                _ => {}
            }

            // Channel creation.
            if let Some(caps) = self.new_ref.captures(&tok.content) {
                let index = counter;
                bound.insert(caps[1].to_string(), index);
                self.pos += 1;
                let children = self.finish(bound, counter + 1);
                return vec![Proc::new(tok.loc, Action::NewRef(index), children)];
            }

            // Subscriptions. The channel (use position) resolves before the
            // message binding is introduced, so `x<-x` targets the outer `x`.
            let subs = self
                .subs_one
                .captures(&tok.content)
                .map(|caps| (caps, false))
                .or_else(|| self.subs_all.captures(&tok.content).map(|caps| (caps, true)));
            if let Some((caps, all)) = subs {
                let channel = self.resolve(&caps[2], &bound, &tok.loc);
                let index = counter;
                bound.insert(caps[1].to_string(), index);
                self.pos += 1;
                let children = self.finish(bound, counter + 1);
                let action = if all {
                    Action::SubsAll(channel, index)
                } else {
                    Action::SubsOne(channel, index)
                };
                return vec![Proc::new(tok.loc, action, children)];
            }

            // Sends.
            if let Some(caps) = self.send.captures(&tok.content) {
                let message = self.resolve(&caps[1], &bound, &tok.loc);
                let channel = self.resolve(&caps[2], &bound, &tok.loc);
                self.pos += 1;
                let children = self.finish(bound, counter);
                return vec![Proc::new(tok.loc, Action::Send(channel, message), children)];
            }

            // Not an action; report, skip one token and try again.
            self.error(tok.loc, format!("\"{}\" cannot be parsed", tok.content));
            self.pos += 1;
        }
    }

    /// Parse the members of a `(` ... `)` group. Each member sees a copy of
    /// the binding map and the same reference counter.
    fn parse_group(&mut self, open: Loc, bound: Bindings, counter: usize) -> Vec<Proc> {
        self.pos += 1;
        let mut procs = Vec::new();
        loop {
            match self.peek() {
                None => {
                    self.error(open, "missing closing parenthesis");
                    return procs;
                }
                Some(tok) if tok.content == ")" => {
                    self.pos += 1;
                    return procs;
                }
                Some(_) => procs.extend(self.parse_proc(bound.clone(), counter)),
            }
        }
    }

    /// Parse the terminator after an action: `;` followed by the
    /// continuation, or `.` for none.
    fn finish(&mut self, bound: Bindings, counter: usize) -> Vec<Proc> {
        match self.peek() {
            Some(tok) if tok.content == ";" => {
                self.pos += 1;
                self.parse_proc(bound, counter)
            }
            Some(tok) if tok.content == "." => {
                self.pos += 1;
                vec![]
            }
            Some(tok) => {
                // Leave the offending token in place; it may start a valid
                // sibling.
                let loc = tok.loc.clone();
                self.error(loc, "expected semicolon or period");
                vec![]
            }
            None => {
                let loc = self
                    .tokens
                    .last()
                    .map(|t| t.loc.clone())
                    .unwrap_or_default();
                self.error(loc, "expected semicolon or period");
                vec![]
            }
        }
    }

    /// Resolve a name in use position: bound names first, then the reserved
    /// channel patterns, then an error with raw id 0 substituted.
    fn resolve(&mut self, name: &str, bound: &Bindings, loc: &Loc) -> Ref {
        if let Some(&index) = bound.get(name) {
            return Ref::Bound(index);
        }
        if let Some(id) = self.reserved.resolve(name) {
            return Ref::Raw(id);
        }
        self.error(loc.clone(), format!("unbound variable \"{}\"", name));
        Ref::Raw(0)
    }
}
