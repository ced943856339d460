//! Probes and scrape orchestration between `eaton-api` and the HTTP surface.
//!
//! - **[`Module`]**: the closed set of probe names accepted in a scrape's
//!   `module` parameter.
//!
//! - **[`Probe`]**: one per device resource type. Each knows its root
//!   endpoint, registers its gauges with a scrape's registry, populates
//!   itself through a [`DeviceClient`](eaton_api::DeviceClient), and writes
//!   its readings into the registered gauges.
//!
//! - **[`Scraper`]**: runs one scrape: resolve the target, build the
//!   probes, fetch everything, and render the registry in the text
//!   exposition format. Nothing survives the call.

pub mod error;
pub mod module;
pub mod probe;
pub mod scrape;

pub use error::ScrapeError;
pub use module::Module;
pub use probe::{BranchProbe, InputProbe, Probe};
pub use scrape::{ScrapeParams, Scraper, render};
