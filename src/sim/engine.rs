// Copyright (c) 2019-2021 The pisim developers

//! Simulation execution engine.
//!
//! The engine alternates two phases until no work remains: it drains the
//! ready queue, dispatching every node on its action, then advances one
//! delivery cycle over a snapshot of the ether. A channel delivers at most
//! one message per cycle; messages finding their channel already served are
//! pushed back, which guarantees that every ready node runs between two
//! deliveries on the same channel.
//!
//! Run-time inconsistencies (a reference vector whose length disagrees with
//! a binder's index, a reference out of bounds) are compiler bugs, not
//! program errors, and fail hard.

use crate::proc::Action;
use crate::reserved::{DEBUG, STDIN_EOF, STDIN_READ, STDOUT_OFFSET};
use crate::sim::io::{ByteSink, ByteSource};
use crate::sim::state::{ChannelId, Message, Node, State};
use std::io::{Result, Write};
use std::mem;

/// The execution engine driving one simulation state.
pub struct Engine<'e, 'p> {
    state: &'e mut State<'p>,
    input: &'e mut dyn ByteSource,
    output: &'e mut dyn ByteSink,
    debug: &'e mut dyn Write,
}

impl<'e, 'p> Engine<'e, 'p> {
    /// Create a new engine to advance some simulation state.
    pub fn new(
        state: &'e mut State<'p>,
        input: &'e mut dyn ByteSource,
        output: &'e mut dyn ByteSink,
        debug: &'e mut dyn Write,
    ) -> Engine<'e, 'p> {
        Engine {
            state,
            input,
            output,
            debug,
        }
    }

    /// Run the simulation until the queue and the ether are both empty.
    pub fn run(&mut self) -> Result<()> {
        self.run_until(None)
    }

    /// Run the simulation, stopping early once the given number of delivery
    /// cycles has elapsed. Programs that never terminate on their own can be
    /// cut off this way.
    pub fn run_until(&mut self, max_cycles: Option<u64>) -> Result<()> {
        while !self.state.is_done() {
            if let Some(limit) = max_cycles {
                if self.state.cycle >= limit {
                    info!("stopping after {} cycles", limit);
                    return Ok(());
                }
            }
            self.drain()?;
            self.deliver()?;
        }
        info!("halted after {} cycles", self.state.cycle);
        Ok(())
    }

    /// Dispatch ready nodes until the queue is empty.
    fn drain(&mut self) -> Result<()> {
        while let Some(node) = self.state.queue.pop_front() {
            self.dispatch(node)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, mut node: Node<'p>) -> Result<()> {
        let proc = node.proc;
        match proc.action {
            Action::NewRef(index) => {
                assert_eq!(
                    node.refs.len(),
                    index,
                    "reference count mismatch at {}",
                    proc.loc
                );
                let id = self.state.channels.alloc();
                trace!("{}: +{}", proc.loc, id);
                node.refs.push(id);
                node.seqs.push(0);
                self.state.schedule(&proc.children, node.refs, node.seqs);
            }

            Action::Deref(index) => {
                node.refs.remove(index);
                node.seqs.remove(index);
                self.state.schedule(&proc.children, node.refs, node.seqs);
            }

            Action::SubsOne(channel, index) | Action::SubsAll(channel, index) => {
                assert_eq!(
                    node.refs.len(),
                    index,
                    "reference count mismatch at {}",
                    proc.loc
                );
                let channel_id = node.resolve(channel);
                trace!("{}: park on {}", proc.loc, channel_id);
                self.state.channels[channel_id].listeners.push(node);
            }

            Action::Send(channel, message) => {
                let channel_id = node.resolve(channel);
                let content_id = node.resolve(message);
                // The debug channel is served right away; waiting a cycle
                // would let the listener lists change under us.
                if channel_id.index() == DEBUG {
                    self.print_debug(content_id)?;
                    self.state.schedule(&proc.children, node.refs, node.seqs);
                } else {
                    let record = &mut self.state.channels[channel_id];
                    record.seq += 1;
                    let seq = record.seq;
                    trace!("{}: {} -> {} seq {}", proc.loc, content_id, channel_id, seq);
                    self.state.ether.push_back(Message {
                        channel: channel_id,
                        content: content_id,
                        seq,
                    });
                    // Children inherit the sender-view sequence on the
                    // channel just used; raw channels track no sequence.
                    if let Some(index) = channel.bound_index() {
                        node.seqs[index] = seq;
                    }
                    self.state.schedule(&proc.children, node.refs, node.seqs);
                }
            }
        }
        Ok(())
    }

    /// Advance one cycle: snapshot the ether and deliver each message, at
    /// most one per channel.
    fn deliver(&mut self) -> Result<()> {
        self.state.cycle += 1;
        let cycle = self.state.cycle;
        debug!("cycle {}: {} messages", cycle, self.state.ether.len());

        let snapshot: Vec<Message> = self.state.ether.drain(..).collect();
        for message in snapshot {
            let listeners = {
                let state = &mut *self.state;
                let record = &mut state.channels[message.channel];
                if record.last_cycle == cycle {
                    // This channel already delivered in this cycle.
                    state.ether.push_back(message);
                    continue;
                }
                record.last_cycle = cycle;
                mem::take(&mut record.listeners)
            };

            let mut kept = Vec::with_capacity(listeners.len());
            for node in listeners {
                let (channel, renew) = match node.proc.action {
                    Action::SubsOne(channel, _) => (channel, false),
                    Action::SubsAll(channel, _) => (channel, true),
                    _ => unreachable!("only subscriptions are parked"),
                };
                // A message that predates the listener's own send on this
                // channel is not for it.
                if let Some(index) = channel.bound_index() {
                    if message.seq <= node.seqs[index] {
                        kept.push(node);
                        continue;
                    }
                }
                trace!("{}: deliver {} seq {}", node.proc.loc, message.content, message.seq);
                let mut refs = node.refs.clone();
                let mut seqs = node.seqs.clone();
                refs.push(message.content);
                seqs.push(0);
                self.state.schedule(&node.proc.children, refs, seqs);
                if renew {
                    kept.push(node);
                }
            }
            self.state.channels[message.channel].listeners = kept;

            self.bridge(&message)?;
        }
        Ok(())
    }

    /// Produce the follow-up of a message delivered to a reserved channel.
    /// Replies are appended to the ether, so they are considered from the
    /// next cycle onward.
    fn bridge(&mut self, message: &Message) -> Result<()> {
        let id = message.channel.index();
        if id == STDIN_READ {
            // The only operation that may block on an external resource.
            match self.input.read_byte()? {
                Some(byte) => {
                    debug!("read byte 0x{:02X}", byte);
                    self.state.ether.push_back(Message {
                        channel: ChannelId::new(byte as usize),
                        content: message.content,
                        seq: 0,
                    });
                }
                None => {
                    debug!("read hit end of input");
                    self.state.ether.push_back(Message {
                        channel: ChannelId::new(STDIN_EOF),
                        content: message.content,
                        seq: 0,
                    });
                }
            }
        } else if (STDOUT_OFFSET..STDIN_READ).contains(&id) {
            self.output.write_byte((id - STDOUT_OFFSET) as u8)?;
        }
        Ok(())
    }

    /// Print the listeners of the content channel to the debug sink.
    fn print_debug(&mut self, id: ChannelId) -> Result<()> {
        let record = &self.state.channels[id];
        writeln!(self.debug, "--- DEBUG ---")?;
        writeln!(self.debug, "channel: {}", id)?;
        for node in &record.listeners {
            writeln!(self.debug, "+ {}", node.proc.loc)?;
        }
        writeln!(self.debug, "-------------")?;
        Ok(())
    }
}
