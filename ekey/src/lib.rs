//! CLI and demo HTTP layer for ephemeral, proof-bound E-Key tokens. The
//! actual issuer/verifier state machines live in `ekey-core`; this crate is
//! the thin, opinionated binary wrapping them.

pub mod api;
pub mod cli;
pub mod server;
