//! # Campus Lost & Found
//!
//! Tracking of lost and found item reports with AI-assisted match
//! suggestions.
//!
//! A target item and a list of candidate items go in; a ranked list of
//! (lost, found) pairings comes out. Untrusted item text is sanitized
//! before it is interpolated into a prompt, and the generative model is
//! asked for output constrained to a strict JSON schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  HTTP  ┌──────────────────────────────────────────┐
//! │ MatchClient  │───────▶│ POST /api/match                           │
//! │  (adapter)   │        │  filter ─▶ sanitize ─▶ prompt ─▶ model    │
//! └──────────────┘        │                        ─▶ normalize/rank  │
//!                         └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Items, dispositions, statuses, suggestions |
//! | [`sanitize`] | Text scrubbing and per-field bounds |
//! | [`candidates`] | Opposite-disposition candidate filter |
//! | [`prompt`] | Matching prompt rendering |
//! | [`llm`] | Model requester trait and Gemini implementation |
//! | [`rank`] | Binding of raw matches and confidence ranking |
//! | [`pipeline`] | End-to-end match pipeline |
//! | [`server`] | HTTP boundary |
//! | [`client`] | Client adapter and match sessions |
//! | [`store`] | In-memory item state and commands |
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |

pub mod candidates;
pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod rank;
pub mod sanitize;
pub mod server;
pub mod store;
