//! Host integration: line protocol, session state, stdin/stdout loop.

pub mod contract;
pub mod session;
pub mod stdio;
