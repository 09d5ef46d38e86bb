//! panocast - direction-aligned street-level imagery acquisition
//!
//! Given a road coordinate and the next point along its route, panocast
//! resolves the nearest street-level panorama, calibrates its orientation
//! against true north, assembles the equirectangular panorama from tiles and
//! renders a perspective photograph looking along the road.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use panocast::acquire::{Acquirer, AcquireSettings};
//! use panocast::batch::{BatchAcquirer, BatchSettings};
//! use panocast::provider::{AsyncReqwestClient, Endpoints};
//!
//! let client = AsyncReqwestClient::new()?;
//! let acquirer = Arc::new(Acquirer::new(
//!     client,
//!     Endpoints::default(),
//!     api_key,
//!     AcquireSettings::new("/var/cache/panocast"),
//! ));
//!
//! let task = acquirer.task_for(here, next);
//! let image = acquirer.acquire(&task).await?;
//!
//! let summary = BatchAcquirer::new(acquirer, BatchSettings::default())
//!     .run(tasks)
//!     .await;
//! ```

pub mod acquire;
pub mod batch;
pub mod cache;
pub mod config;
pub mod coord;
pub mod error;
pub mod logging;
pub mod panorama;
pub mod projection;
pub mod provider;
pub mod route;
pub mod source;

pub use error::AcquisitionError;

/// Version of the panocast library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
