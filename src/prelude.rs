//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use wordpress_operator::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    EnsureResult, Pipeline, ReadinessGate, ReconcileError, ReconcileOutcome, Reconciler, Stage,
};

// Store types
pub use crate::store::{
    InMemoryStore, KubeStore, ManagedKind, ManagedResource, ObjectKey, ResourceStore, StoreError,
};

// Config types
pub use crate::config::{ControllerConfig, LogFormat, ServerConfig};
