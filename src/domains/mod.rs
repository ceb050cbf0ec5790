//! Domains module containing business logic organized by bounded contexts.
//!
//! The server only exposes tools; each API area is a provider inside the
//! tools domain.

pub mod tools;
