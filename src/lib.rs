//! # Wordpress Operator
//!
//! A Kubernetes operator that turns a `Wordpress` custom resource into a
//! running two-tier installation: a MySQL database and the Wordpress web
//! tier in front of it.
//!
//! ## Overview
//!
//! For every `Wordpress` object the operator:
//!
//! 1. **Provisions MySQL** - persistent volume claim, deployment and service
//! 2. **Waits for the database** - the Wordpress tier is held back until the
//!    MySQL deployment reports all replicas ready and available
//! 3. **Provisions Wordpress** - persistent volume claim, deployment and service
//! 4. **Reports status** - phase, message and conditions on the custom resource
//!
//! Sub-resources carry an owner reference to their `Wordpress` object, so
//! deleting the object lets the garbage collector remove them.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod store;
pub mod templates;
