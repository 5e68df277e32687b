// Copyright (c) 2019-2021 The pisim developers

//! Optimization passes on the core process tree.

pub mod dre;

pub use dre::DeadRefElim;
