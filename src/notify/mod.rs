//! Outbound delivery of the composed digest.

pub mod email;

pub use email::{Mailer, TransportProfile};
