use anyhow::Result;
use kiche_domain::{release_suffix, select_release, PlatformKey, ReleaseDescriptor};
use tracing::debug;

use crate::catalog::ReleaseCatalog;

/// Pick the release matching `version` for `platform`.
///
/// The host is checked against the suffix table before the catalog is
/// queried, so unsupported hosts never touch the network.
pub fn resolve_release(
    catalog: &dyn ReleaseCatalog,
    version: Option<&str>,
    platform: &PlatformKey,
) -> Result<ReleaseDescriptor> {
    let suffix = release_suffix(platform)?;
    debug!(%platform, suffix, "looking up python releases");
    let releases = catalog.fetch()?;
    let release = select_release(releases, suffix, version)?;
    debug!(
        version = release.python_version(),
        url = release.url(),
        "selected python release"
    );
    Ok(release)
}
