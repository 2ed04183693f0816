#![cfg_attr(not(test), no_std)]

//! # Frostwatch
//! ## A two-probe freeze monitor in Rust
//!
//! Features:
//! - Temperature monitoring on two probes against a shared cutoff
//! - Confirmed, throttled alert notifications with a single all-clear
//! - Single button: wake the screen, send a test notification, or restart
//! - Screen auto-off
//! - Status page served through a network bridge
//!
//! Everything here is driven from one polling loop. [`monitor::Monitor::tick`]
//! is the only entry point the firmware calls once per pass.

#[macro_use]
mod fmt;

pub mod alert;
pub mod bridge;
pub mod button;
pub mod clock;
pub mod display;
pub mod error;
pub mod event;
pub mod http;
pub mod monitor;
pub mod notify;
pub mod preferences;
pub mod rendering;
pub mod sensors;
pub mod timer;

#[cfg(feature = "board")]
pub mod board;
