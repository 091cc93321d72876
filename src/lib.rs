//! Sign Duel Server - authoritative core for a two-player hand-sign duel
//!
//! Classifier bridges report the sign each player is showing; the server
//! stabilizes those reports, recognizes combos, runs the combat simulation
//! and publishes snapshots, events and presentation cues.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
