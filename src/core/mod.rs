//! Core library components.
//!
//! This module contains the transport-independent logic: backends, the
//! cipher envelope codec, validation, rewrap and the secret service.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod rewrap;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;
