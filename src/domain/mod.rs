//! Domain model shared by every layer of the bridge.
//!
//! Everything here is either sourced verbatim from the actor platform
//! ([`Actor`], [`ActorPage`], [`ActorSchema`], [`RunSnapshot`]) or produced by the run
//! coordinator ([`Run`]). Nothing is persisted.

pub mod actor;
pub mod credential;
pub mod run;

pub use actor::{Actor, ActorPage, ActorSchema, SchemaProperty};
pub use credential::Credential;
pub use run::{Run, RunSnapshot, RunStatus};
