use crate::issue::ProvisionIssue;
use crate::release::ReleaseDescriptor;

/// Pick the release to install out of a catalog.
///
/// Only archives whose URL ends with `suffix` are considered. Without a
/// requested version the highest release wins; otherwise the highest
/// release whose version starts with `requested`.
pub fn select_release(
    catalog: Vec<ReleaseDescriptor>,
    suffix: &str,
    requested: Option<&str>,
) -> Result<ReleaseDescriptor, ProvisionIssue> {
    let mut candidates = catalog
        .into_iter()
        .filter(|release| release.url().ends_with(suffix))
        .collect::<Vec<_>>();
    candidates.sort_by(|left, right| left.version().cmp(right.version()));

    let considered = || {
        candidates
            .iter()
            .map(|release| release.basename().to_string())
            .collect::<Vec<_>>()
    };

    let selected = match requested {
        None => candidates.last(),
        Some(prefix) => candidates
            .iter()
            .rev()
            .find(|release| release.version().matches_prefix(prefix)),
    };
    match selected {
        Some(release) => Ok(release.clone()),
        None => Err(ProvisionIssue::NotFound {
            requested: requested.unwrap_or("latest").to_string(),
            considered: considered(),
        }),
    }
}
