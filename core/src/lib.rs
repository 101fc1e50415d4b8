#![no_std]

//! State-machine cores for a handful of small browser demos: tic-tac-toe, a
//! sliding-tile puzzle in click and drag flavours, a go board, and an
//! account/points flow driven by asynchronous calls.
//!
//! Every machine is a pure transition function over `(state, context, event)`
//! run by a [`Service`]. Front-ends read a [`Snapshot`] after each transition
//! and translate user input back into typed events.

extern crate alloc;

pub use config::*;
pub use error::*;
pub use go::*;
pub use machine::*;
pub use tictactoe::*;
pub use tiles::*;
pub use toggle::*;
pub use types::*;

pub mod points;

mod config;
mod error;
mod go;
mod machine;
mod tictactoe;
mod tiles;
mod toggle;
mod types;
