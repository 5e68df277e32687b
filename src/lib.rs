// Copyright (c) 2019-2021 The pisim developers

//! An interpreter for a small concurrent programming language based on the
//! π-calculus. Programs are trees of processes that communicate by sending
//! channel names over channels; a handful of reserved channels bridge to
//! standard input, standard output and a debug sink.
//!
//! The pipeline: [`lexer`] tokenizes and desugars source, [`parser`] builds
//! the core process tree, [`pass::DeadRefElim`] optionally drops dead
//! references, and [`sim`] reduces the tree until no work remains.

#[macro_use]
extern crate log;

pub mod lexer;
pub mod loc;
pub mod parser;
pub mod pass;
pub mod proc;
pub mod reserved;
pub mod sim;
pub mod source;
pub mod write;

pub use crate::lexer::{Lexer, Token};
pub use crate::loc::Loc;
pub use crate::parser::{parse, ParseError, ParseErrors};
pub use crate::pass::DeadRefElim;
pub use crate::proc::{Action, Proc, Ref};
pub use crate::sim::{simulate, ByteSink, ByteSource, Engine, State};
pub use crate::source::load_program;
pub use crate::write::{procs_to_string, Writer};
