//! Client side of the chain query surface.
//!
//! - [`transport`]: the HTTP seam every remote call goes through
//! - [`registry`]: chain directory (endpoints and network metadata)
//! - [`resolver`]: picks a live, synced endpoint and its governance API version
//! - [`lcd`]: typed REST queries against one endpoint
//! - [`ipfs`]: content-addressed document fetches through a public gateway

pub mod error;
pub mod ipfs;
pub mod lcd;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use error::NetworkError;
pub use ipfs::IpfsGateway;
pub use lcd::LcdClient;
pub use models::{RawProposal, TxResponse, WeightedVote};
pub use registry::{normalize_endpoints, CachedDirectory, ChainDirectory, ChainRegistryClient};
pub use resolver::{EndpointResolver, ResolvedEndpoint};
pub use transport::{HttpResponse, ReqwestTransport, RestTransport};
