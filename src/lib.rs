//! **wscycle**: per-output workspace cycling and back-and-forth for i3 and
//! sway.
//!
//! Every output is treated as its own independent set of workspaces:
//!
//! * `next` / `prev` cycle through the workspaces of the focused output only,
//! * `toggle` sends the focused workspace to the next output,
//! * `back` returns to the workspace previously focused on *this* output,
//!   using a per-output history kept by a long-running daemon (`listen`).
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowManager`] abstracts workspace queries, focus and moves
//!   so the engine ([`cycle`], [`toggle`], [`history`]) is not coupled to a
//!   specific window manager.
//! * [`traits::EventSource`] abstracts everything that feeds the daemon
//!   (window-manager events, the control socket, process signals), so the
//!   daemon loop is one consumer of one channel.
//!
//! Concrete implementations live in [`i3`] (i3/sway IPC), [`ipc`] (the
//! control socket) and [`signals`].

pub mod command;
pub mod config;
pub mod cycle;
pub mod daemon;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod i3;
pub mod ipc;
pub mod registry;
pub mod signals;
pub mod toggle;
pub mod traits;
