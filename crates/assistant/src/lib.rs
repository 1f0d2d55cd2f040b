//! Groenmarkt Assistant - tool-calling portfolio tracker.
//!
//! A small HTTP tool server, unrelated to the webshop: it persists
//! portfolio project and skill records to `SQLite` and exposes four
//! named tools that return human-readable text summaries instead of
//! structured data.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod tools;
