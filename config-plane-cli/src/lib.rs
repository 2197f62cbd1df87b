//! Exposes the argument parser for testing; the binary itself lives in
//! `main.rs`.

pub mod cli;
