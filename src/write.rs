// Copyright (c) 2019-2021 The pisim developers

//! Emitting core-form text.
//!
//! Serializes process trees into the textual core form: `+c`, `m<-c`,
//! `m<<c`, `m->c` and `~i`, followed by `;` and a single child, `;(c1 c2 …)`
//! for several children, or `.` for none. Bound references print their
//! index; raw references print their reserved channel name, so for core-only
//! programs the output tokenizes and parses back to the same tree.

use crate::proc::{Action, Proc, Ref};
use crate::reserved;
use std::fmt;
use std::io::{Result, Write};

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Ref::Bound(index) => write!(f, "{}", index),
            Ref::Raw(id) => write!(f, "{}", reserved::name(id)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Action::NewRef(index) => write!(f, "+{}", index),
            Action::Deref(index) => write!(f, "~{}", index),
            Action::SubsOne(channel, message) => write!(f, "{}<-{}", message, channel),
            Action::SubsAll(channel, message) => write!(f, "{}<<{}", message, channel),
            Action::Send(channel, message) => write!(f, "{}->{}", message, channel),
        }
    }
}

/// Temporary object to emit core-form text.
pub struct Writer<T> {
    sink: T,
}

impl<T: Write> Writer<T> {
    /// Create a new core-form writer.
    pub fn new(sink: T) -> Self {
        Self { sink }
    }

    /// Emit a program, one top-level process per line.
    pub fn write_procs(&mut self, procs: &[Proc]) -> Result<()> {
        for proc in procs {
            self.write_proc(proc)?;
            writeln!(self.sink)?;
        }
        Ok(())
    }

    /// Emit a single process tree.
    pub fn write_proc(&mut self, proc: &Proc) -> Result<()> {
        write!(self.sink, "{}", proc.action)?;
        match proc.children.len() {
            0 => write!(self.sink, "."),
            1 => {
                write!(self.sink, ";")?;
                self.write_proc(&proc.children[0])
            }
            _ => {
                write!(self.sink, ";(")?;
                let mut space = false;
                for child in &proc.children {
                    if space {
                        write!(self.sink, " ")?;
                    }
                    space = true;
                    self.write_proc(child)?;
                }
                write!(self.sink, ")")
            }
        }
    }
}

/// Serialize a program to a string. Handy in tests and for diffing trees.
pub fn procs_to_string(procs: &[Proc]) -> String {
    let mut buffer = Vec::new();
    Writer::new(&mut buffer)
        .write_procs(procs)
        .expect("write to vec");
    String::from_utf8(buffer).expect("core form is ascii")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::Loc;

    fn proc(action: Action, children: Vec<Proc>) -> Proc {
        Proc::new(Loc::internal(), action, children)
    }

    #[test]
    fn leaf_and_chain() {
        let p = proc(
            Action::NewRef(515),
            vec![proc(
                Action::SubsOne(Ref::Bound(515), 516),
                vec![proc(Action::Send(Ref::Bound(515), Ref::Bound(516)), vec![])],
            )],
        );
        assert_eq!(procs_to_string(&[p]), "+515;516<-515;516->515.\n");
    }

    #[test]
    fn groups_and_raw_references() {
        let p = proc(
            Action::NewRef(515),
            vec![
                proc(Action::Send(Ref::Raw(512), Ref::Bound(515)), vec![]),
                proc(Action::Send(Ref::Raw(256 + 0x41), Ref::Raw(514)), vec![]),
            ],
        );
        assert_eq!(
            procs_to_string(&[p]),
            "+515;(515->stdin_read. DEBUG->stdout_41.)\n"
        );
    }

    #[test]
    fn deref_markers() {
        let p = proc(Action::Deref(3), vec![proc(Action::NewRef(4), vec![])]);
        assert_eq!(procs_to_string(&[p]), "~3;+4.\n");
    }
}
