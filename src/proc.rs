// Copyright (c) 2019-2021 The pisim developers

//! The core process tree.
//!
//! A program is a forest of [`Proc`] nodes. Each node performs one action and
//! then schedules its children as parallel continuations. The five actions
//! form a closed tagged union; the simulator dispatches on the tag and
//! nothing is ever subclassed or dynamically dispatched.

use crate::loc::Loc;

/// A reference to a channel, as seen from a process.
///
/// Bound references index into the reference vector of the node executing the
/// process. Raw references name a reserved I/O channel directly and need no
/// binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ref {
    /// An index into the node's reference vector.
    Bound(usize),
    /// A reserved channel id, `0..RESERVED`.
    Raw(usize),
}

impl Ref {
    /// The reference vector index, if this reference is bound.
    pub fn bound_index(self) -> Option<usize> {
        match self {
            Ref::Bound(index) => Some(index),
            Ref::Raw(_) => None,
        }
    }
}

/// One of the five core actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Allocate a fresh channel and bind it at the given reference index.
    NewRef(usize),
    /// Drop the reference at the given index. Only the optimizer emits this.
    Deref(usize),
    /// Subscribe once on a channel; the received channel id is bound at the
    /// given fresh index.
    SubsOne(Ref, usize),
    /// Subscribe persistently on a channel.
    SubsAll(Ref, usize),
    /// Send a message channel over a channel.
    Send(Ref, Ref),
}

/// A process: one action plus its parallel continuations.
#[derive(Clone, Debug)]
pub struct Proc {
    pub loc: Loc,
    pub action: Action,
    pub children: Vec<Proc>,
}

impl Proc {
    pub fn new(loc: Loc, action: Action, children: Vec<Proc>) -> Proc {
        Proc {
            loc,
            action,
            children,
        }
    }
}
