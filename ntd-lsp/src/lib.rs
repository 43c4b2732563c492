//! Language Server Protocol (LSP) implementation for NTD
//!
//!     This crate exposes the `ntd-analysis` engine to any LSP-compatible editor. The server
//!     owns no assistance logic: it keeps the latest text of every open document, translates
//!     positions and payloads, and forwards requests to a [`FeatureProvider`].
//!
//! Feature Set
//!
//!     1. Completion (textDocument/completion):
//!         - Triggered on `=`, `,` and `(`, or explicitly
//!         - Section, element and function templates as snippets
//!         - Field names, enumerated values and defaults for the element under the cursor
//!
//!     2. Hover (textDocument/hover):
//!         - Field description and unit for the key or value under the cursor
//!         - Section and function family descriptions for their codes
//!
//!     Documents are synchronised in full on every change.
//!
//! Testing
//!
//!     The server is generic over its client and feature provider. Unit tests drive it with a
//!     no-op client and a mock provider that records the positions it receives.

pub mod server;

pub use server::{DefaultFeatureProvider, FeatureProvider, LspClient, NtdLanguageServer};
