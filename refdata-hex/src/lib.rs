//! # Reference Data Hex
//!
//! Application service layer and HTTP adapter for reference-data sync.
//!
//! ## Architecture
//!
//! - `sync` - Orchestrator applying a snapshot diff to the store
//! - `service` - Sync and rate lookup services
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Services are generic over `R: ReferenceRepository` and
//! `S: ReferenceSource`, allowing different adapters to be injected.

pub mod inbound;
pub mod service;
pub mod sync;


pub use service::{RateService, SyncService};
pub use sync::{ReconcileOptions, reconcile};
