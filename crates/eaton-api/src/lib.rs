// eaton-api: Async Rust client for the Eaton PDU REST API
//
// Bearer-token authenticated resource fetches plus the `members` /
// `@id` collection traversal the device uses for child resources.

pub mod auth;
pub mod client;
pub mod collection;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::DeviceClient;
pub use collection::{Document, Resource};
pub use error::{AuthError, Error};
pub use models::{Collection, Reference};
pub use transport::TransportConfig;

/// Default REST root on Eaton network management cards.
pub const DEFAULT_BASE_PATH: &str = "/rest/mbdetnrs/2.0";

/// Token endpoint, relative to the REST root.
pub const TOKEN_PATH: &str = "/oauth2/token";
