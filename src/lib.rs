//! # News Dashboard
//!
//! A terminal client for exploring a collection of news documents: group
//! them by an attribute, inspect group sizes, and read a generated
//! multi-point summary for one group.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────┐   ┌──────────────┐
//! │   REPL   │──▶│ Orchestrator │──▶│  Backend  │──▶│ news service │
//! │  / CLI   │   │  (tickets)   │   │ (reqwest) │   │ /group_by/   │
//! └────┬─────┘   └──────┬───────┘   └───────────┘   │ /summarize/  │
//!      │                ▼                           └──────────────┘
//!      │         ┌────────────┐   ┌──────────┐
//!      └────────▶│ ViewState  │──▶│   view   │──▶ rendered text
//!                └────────────┘   │ +excerpt │
//!                                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! newsdash --base-url http://localhost:8000 groups --field source
//! newsdash --base-url http://localhost:8000 summarize --field source --value Reuters
//! newsdash --config ./config/newsdash.toml interactive
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Group fields, groupings, summaries |
//! | [`excerpt`] | Collapsed previews of summary blocks |
//! | [`error`] | Fetch failure taxonomy |
//! | [`backend`] | Backend trait and HTTP client |
//! | [`state`] | View state machine |
//! | [`orchestrator`] | Request lifecycle and user entry points |
//! | [`view`] | Screen derivation and text rendering |
//! | [`repl`] | Interactive loop |

pub mod backend;
pub mod config;
pub mod error;
pub mod excerpt;
pub mod models;
pub mod orchestrator;
pub mod repl;
pub mod state;
pub mod view;
