// Copyright (c) 2019-2021 The pisim developers

//! The simulator.
//!
//! Everything lives in an explicit [`State`] object driven by an [`Engine`],
//! so tests can run independent instances side by side; there is no hidden
//! global. π-calculus parallelism is encoded entirely in the process queue:
//! the engine is one sequential loop with no threads and no locks.

pub mod engine;
pub mod io;
pub mod state;

pub use engine::Engine;
pub use io::{ByteSink, ByteSource};
pub use state::{Channel, ChannelId, ChannelTable, Message, Node, State};

use crate::proc::Proc;

/// Run a program to completion against the given byte streams.
pub fn simulate(
    program: &[Proc],
    input: &mut dyn ByteSource,
    output: &mut dyn ByteSink,
    debug: &mut dyn std::io::Write,
) -> std::io::Result<()> {
    let mut state = State::new(program);
    Engine::new(&mut state, input, output, debug).run()
}
