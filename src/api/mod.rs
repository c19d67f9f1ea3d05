//! HTTP API for the identity-mapping service.

mod handler;
mod request;

pub use handler::{health_handler, mutate_identity, HealthResponse};
pub use request::{MatchContext, MutatorPayload};
