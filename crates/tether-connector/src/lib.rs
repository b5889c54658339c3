//! Connector contract and registry.
//!
//! A connector is the provider-specific adapter: it declares a static
//! action catalog, discovers what a given credential currently permits, and
//! executes individual actions in read-only, dry-run, or real mode. The
//! registry is the single place providers are wired in.

pub mod connector;
pub mod error;
pub mod handler;
pub mod registry;
pub mod strategy;

pub use connector::{
    generate_state, ActionContext, ActionRequest, ActionResult, CapabilityDiscovery, Connector,
    IssuedCredential, ProviderMetadata,
};
pub use error::ConnectorError;
pub use handler::{ActionHandler, HandlerTable};
pub use registry::ConnectorRegistry;
pub use strategy::{CredentialKind, Strategy, DEMO_TOKEN_PREFIX};
