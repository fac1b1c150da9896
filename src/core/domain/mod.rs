//! Domain types.

mod backend_kind;
mod secret;

pub use backend_kind::BackendKind;
pub use secret::{BulkSecret, Payload, PurgeAck, Secret};
