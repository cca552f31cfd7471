//! Integration tests for the student records service.
//!
//! `api` drives the full router against the in-memory store and always runs.
//! `postgres` needs a reachable PostgreSQL (see the `DB_*` variables) and is
//! ignored by default. Run with: cargo test --test integration -- --ignored

mod api;
mod common;
mod postgres;
