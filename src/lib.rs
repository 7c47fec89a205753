//! Voice-driven TV playback for Plex.
//!
//! plex-remote turns a request like "play Breaking Bad in the living room"
//! into a decision about which episode to play, and then into the Plex API
//! calls that start it on the named player. When the show name is a weak
//! match, or there is a half-watched episode to offer, it returns a yes/no
//! question instead and acts on the answer in the next turn.
//!
//! # Features
//!
//! - Fuzzy show-name matching with a confidence gate
//! - Continue watching, resume, random and explicit season/episode picks
//! - Top-rated filtering for random picks
//! - Play queue creation and playMedia dispatch to a Plex client
//!
//! # Usage
//!
//! ```bash
//! # Continue the next episode on the "Living Room" player
//! cargo run -- --player "Living Room" play breaking bad
//!
//! # Season 2 episode 3, in compact notation
//! cargo run -- --player "Living Room" play breaking bad --episode 203
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod identity;
pub mod listing;
pub mod matching;
pub mod orchestrator;
pub mod playback;
pub mod selectors;
pub mod session;
pub mod types;
pub mod ui;
