//! Remote-input bridge — sessions, injection, and request dispatch.
//!
//! The transport here is deliberately thin: a single session over a
//! line-delimited JSON stream. Everything a transport needs from the
//! daemon goes through [`Bridge`].

pub mod inject;
pub mod protocol;
pub mod service;
pub mod session;
pub mod stdio;

pub use inject::TextInjector;
pub use service::Bridge;
