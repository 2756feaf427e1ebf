#![doc = include_str!("../../../README.md")]
//!

//! This crate re-exports the logger types and macros from `mylog-core` so
//! applications only need one dependency.

pub use mylog_core::*;
