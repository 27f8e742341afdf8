// src/lib.rs
// Library surface shared by the aggregator and digest binaries (and integration tests).

pub mod cli;
pub mod config;
pub mod digest;
pub mod html;
pub mod ingest;
pub mod logging;
pub mod notify;
pub mod store;

pub use crate::config::{AppConfig, CredentialSource, DigestConfig};
pub use crate::ingest::{run_source, Outcome, SourceRequest};
pub use crate::notify::{Mailer, TransportProfile};
pub use crate::store::{DocumentStore, FileStore, MemoryStore};
