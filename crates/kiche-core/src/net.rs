use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::NetworkConfig;

pub(crate) const USER_AGENT: &str = concat!("kiche/", env!("CARGO_PKG_VERSION"));

/// Blocking client shared by the catalog, checksum and archive requests.
///
/// No request timeout is set; failures surface from the transport itself.
pub fn build_http_client(network: &NetworkConfig) -> Result<Client> {
    let builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(None::<Duration>);
    let builder = if network.keep_proxies {
        builder
    } else {
        builder.no_proxy()
    };
    builder.build().context("failed to build HTTP client")
}
