// Copyright (c) 2019-2021 The pisim developers

//! Dead Reference Elimination
//!
//! A bound reference that no descendant of a process uses is dead weight: it
//! keeps the reference vectors of every node below it one slot wider and can
//! keep an unreachable channel's listener list alive. This pass prepends
//! `Deref` markers wherever a reference goes dead and renumbers every
//! reference field to its position in the shrunken scope, so the simulator
//! runs with densified environments.
//!
//! The pass makes two sweeps: a bottom-up analysis collecting the set of
//! reference indices used by each subtree, then a top-down rewrite that
//! tracks the list of indices still in scope. The rewrite starts from the
//! reserved identity prefix `[0, RESERVED)`, mirroring the environment every
//! root node carries at run time.

use crate::proc::{Action, Proc, Ref};
use crate::reserved::RESERVED;
use std::collections::HashSet;

/// Dead Reference Elimination
pub struct DeadRefElim;

impl DeadRefElim {
    /// Optimize a program. The input must be an unoptimized tree; the output
    /// is semantically equivalent and runs with strictly shorter reference
    /// vectors.
    pub fn run(program: &[Proc]) -> Vec<Proc> {
        let infos = analyze_list(program);
        let refs: Vec<usize> = (0..RESERVED).collect();
        rewrite_list(program, &infos, &refs)
    }
}

/// Usage information for one process: the reference indices its subtree
/// touches, plus the information of each child.
struct Info {
    used: HashSet<usize>,
    children: Vec<Info>,
}

fn analyze_list(procs: &[Proc]) -> Vec<Info> {
    procs.iter().map(analyze).collect()
}

fn analyze(proc: &Proc) -> Info {
    let mut used = HashSet::new();
    for reference in action_refs(&proc.action) {
        if let Some(index) = reference.bound_index() {
            used.insert(index);
        }
    }
    match proc.action {
        Action::NewRef(index) | Action::SubsOne(_, index) | Action::SubsAll(_, index) => {
            used.insert(index);
        }
        Action::Send(..) => {}
        Action::Deref(_) => panic!("optimizer input already contains deref markers"),
    }
    let children = analyze_list(&proc.children);
    for child in &children {
        used.extend(child.used.iter().copied());
    }
    Info { used, children }
}

fn action_refs(action: &Action) -> Vec<Ref> {
    match *action {
        Action::NewRef(_) | Action::Deref(_) => vec![],
        Action::SubsOne(channel, _) | Action::SubsAll(channel, _) => vec![channel],
        Action::Send(channel, message) => vec![channel, message],
    }
}

/// Rewrite a list of sibling processes against the indices currently in
/// scope. Every sibling decides its own derefs, so one branch does not keep
/// another branch's references alive.
fn rewrite_list(procs: &[Proc], infos: &[Info], refs: &[usize]) -> Vec<Proc> {
    procs
        .iter()
        .zip(infos)
        .map(|(proc, info)| rewrite(proc, info, refs))
        .collect()
}

fn rewrite(proc: &Proc, info: &Info, refs: &[usize]) -> Proc {
    // Split the scope into positions this subtree still needs and positions
    // that go dead here.
    let mut dead = Vec::new();
    let mut local = Vec::new();
    for (position, &index) in refs.iter().enumerate() {
        if info.used.contains(&index) {
            local.push(index);
        } else {
            dead.push(position);
        }
    }

    // Renumber the action's fields to positions in the shrunken scope. A
    // binder appends its original index, so children resolve it at the last
    // position.
    let action = match proc.action {
        Action::NewRef(index) => {
            local.push(index);
            Action::NewRef(local.len() - 1)
        }
        Action::SubsOne(channel, index) => {
            let channel = remap(channel, &local);
            local.push(index);
            Action::SubsOne(channel, local.len() - 1)
        }
        Action::SubsAll(channel, index) => {
            let channel = remap(channel, &local);
            local.push(index);
            Action::SubsAll(channel, local.len() - 1)
        }
        Action::Send(channel, message) => {
            Action::Send(remap(channel, &local), remap(message, &local))
        }
        Action::Deref(_) => unreachable!("rejected during analysis"),
    };

    let children = rewrite_list(&proc.children, &info.children, &local);
    let mut node = Proc::new(proc.loc.clone(), action, children);

    // Wrap in deref markers, outermost first in decreasing position order,
    // so each one removes a slot that later markers do not reference.
    for &position in &dead {
        node = Proc::new(Default::default(), Action::Deref(position), vec![node]);
    }
    node
}

fn remap(reference: Ref, local: &[usize]) -> Ref {
    match reference {
        Ref::Raw(id) => Ref::Raw(id),
        Ref::Bound(index) => {
            let position = local
                .iter()
                .position(|&r| r == index)
                .expect("bound reference escaped its scope");
            Ref::Bound(position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::loc::Loc;
    use crate::parser::parse;

    fn optimize(source: &str) -> Vec<Proc> {
        let lexer = Lexer::new();
        let tokens = lexer.tokenize(source, &Loc::internal(), true);
        let (procs, errors) = parse(&tokens);
        assert!(errors.is_empty(), "{}", errors);
        DeadRefElim::run(&procs)
    }

    /// Peel the deref wrappers off an optimized process, returning the
    /// positions dropped (outermost first) and the wrapped process.
    fn peel(mut proc: &Proc) -> (Vec<usize>, &Proc) {
        let mut dropped = Vec::new();
        while let Action::Deref(position) = proc.action {
            dropped.push(position);
            proc = &proc.children[0];
        }
        (dropped, proc)
    }

    #[test]
    fn root_sheds_the_reserved_prefix() {
        let optimized = optimize("+x;x->x.");
        let (dropped, inner) = peel(&optimized[0]);
        // All reserved identity slots are dead, highest position first.
        assert_eq!(dropped, (0..RESERVED).rev().collect::<Vec<_>>());
        assert_eq!(inner.action, Action::NewRef(0));
        assert_eq!(
            inner.children[0].action,
            Action::Send(Ref::Bound(0), Ref::Bound(0))
        );
    }

    #[test]
    fn dead_binding_gets_a_deref_ahead_of_the_subtree() {
        // x is created and never used again; the marker drops it before the
        // inner send runs.
        let optimized = optimize("+x;+y;y->y.");
        let (_, outer) = peel(&optimized[0]);
        assert_eq!(outer.action, Action::NewRef(0));
        let (dropped, inner) = peel(&outer.children[0]);
        assert_eq!(dropped, vec![0]);
        assert_eq!(inner.action, Action::NewRef(0));
        assert_eq!(
            inner.children[0].action,
            Action::Send(Ref::Bound(0), Ref::Bound(0))
        );
    }

    #[test]
    fn live_references_are_densified_not_dropped() {
        let optimized = optimize("+x;+y;x->y.");
        let (_, outer) = peel(&optimized[0]);
        assert_eq!(outer.action, Action::NewRef(0));
        let inner = &outer.children[0];
        assert_eq!(inner.action, Action::NewRef(1));
        assert_eq!(
            inner.children[0].action,
            Action::Send(Ref::Bound(1), Ref::Bound(0))
        );
    }

    #[test]
    fn siblings_deref_independently() {
        // x stays live in the first branch only; the second branch drops it.
        let optimized = optimize("+x;(x->x. +y;y->y.)");
        let (_, outer) = peel(&optimized[0]);
        assert_eq!(outer.children.len(), 2);
        let (dropped, first) = peel(&outer.children[0]);
        assert!(dropped.is_empty());
        assert_eq!(first.action, Action::Send(Ref::Bound(0), Ref::Bound(0)));
        let (dropped, second) = peel(&outer.children[1]);
        assert_eq!(dropped, vec![0]);
        assert_eq!(second.action, Action::NewRef(0));
    }

    #[test]
    fn raw_references_pass_through() {
        let optimized = optimize("+x;x->stdout__A.");
        let (_, outer) = peel(&optimized[0]);
        assert_eq!(
            outer.children[0].action,
            Action::Send(Ref::Raw(256 + 65), Ref::Bound(0))
        );
    }
}
