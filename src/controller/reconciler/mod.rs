//! # Reconciler
//!
//! Turns NodeConfigCache objects into published node snapshots.
//!
//! ## Module Structure
//!
//! - `error.rs` - Error taxonomy and field-level validation errors
//! - `secrets.rs` - Secret sources and TLS secret resolution
//! - `loader.rs` - Candidate snapshot assembly
//! - `reconcile.rs` - The reconciliation pass
//! - `status.rs` - Status reporting
//! - `types.rs` - Shared context and backoff state

mod error;
mod loader;
mod reconcile;
mod secrets;
mod status;
mod types;

pub use error::{ErrorClass, ObjectKey, ReconcilerError, ResourceLocation, ValidationError};
pub use loader::ResourceLoader;
pub use reconcile::{reconcile, reconcile_node, ReconcileOutcome};
pub use secrets::{KubeSecretSource, SecretError, SecretResolver, SecretSource, StoredSecret};
pub use status::{update_status, StatusUpdate};
pub use types::{BackoffState, Reconciler};
