#![forbid(unsafe_code)]

//! Core types shared by every crate in the wsse workspace.
//!
//! Holds the primitive-level [`Error`], namespace constants for SOAP,
//! XML-DSig, XML-Enc and the OASIS WS-Security schemas, and the algorithm
//! URIs understood by the signature and encryption engines.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
