//! Two small terminal applications sharing one crate:
//!
//! - `flappy`: a side-scrolling reflex game with synthesized tone cues and a
//!   persisted high score ([`game`], [`render`], [`tone`]).
//! - `chat`: a line-based client that forwards text to a remote completion
//!   endpoint ([`chat`]).
//!
//! The two share nothing but [`config`] and [`telemetry`].

pub mod chat;
pub mod config;
pub mod game;
pub mod render;
pub mod telemetry;
pub mod tone;
