//! Service layer.
//!
//! DESIGN
//! ======
//! Route handlers are thin wrappers that parse HTTP input and delegate here.
//! Each service module owns one concern so both transports and the HTTP
//! layer share the same logic.

pub mod broadcast;
pub mod polling;
pub mod session;
pub mod store;
