//! Crate for discovering the api resources served by a Kubernetes cluster
//!
//! Given a [`Client`] for a cluster, a [`ResourceLister`] queries the
//! versioned (`/api`) and grouped (`/apis`) discovery endpoints, then probes
//! every served group version for the resource kinds that support listing.
//! Requests are fanned out under a shared concurrency cap so a cluster with
//! hundreds of api groups is never hammered, and any individual request
//! failure is logged and skipped rather than aborting the run.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use kube_lister::{Client, ResourceLister};
//! use tower::service_fn;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Any tower service that speaks to the apiserver will do here;
//!     // kubeconfig/TLS/auth layering is up to the caller.
//!     let service = service_fn(|_req: Request<Vec<u8>>| async {
//!         Ok::<_, std::convert::Infallible>(Response::new(Bytes::new()))
//!     });
//!     let client = Client::new(service);
//!
//!     for resource in ResourceLister::new(client).run().await {
//!         println!("{}: {} ({})", resource.group, resource.kind, resource.api_name);
//!     }
//! }
//! ```
//!
//! For more details, see:
//!
//! - [`Client`](crate::client) for the injectable transport seam
//! - [`ResourceLister`](crate::discovery) for the discovery engine itself
//! - [`meta`](crate::meta) for the discovery wire types

pub mod client;
pub mod discovery;
pub mod error;
pub mod meta;

#[doc(inline)] pub use client::Client;
#[doc(inline)]
pub use discovery::{DiscoveredResource, ResourceLister};
#[doc(inline)] pub use error::Error;

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
