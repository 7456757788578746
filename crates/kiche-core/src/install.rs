use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use kiche_domain::{interpreter_location, OsFamily, ProvisionIssue};
use tar::Archive;
use tracing::{debug, info};

use crate::timings::TimingGuard;

/// Unpack a downloaded `.tar.gz` release into `target_dir` and return the
/// interpreter inside it. The archive is deleted once extracted.
pub fn install_archive(archive: &Path, target_dir: &Path, family: OsFamily) -> Result<PathBuf> {
    info!(
        "extracting '{}' to '{}'",
        archive.display(),
        target_dir.display()
    );
    {
        let _timing = TimingGuard::debug("extraction took ");
        extract_tar_gz(archive, target_dir)?;
    }
    fs::remove_file(archive)
        .with_context(|| format!("removing extracted archive {}", archive.display()))?;

    let interpreter = interpreter_location(target_dir, family);
    if !interpreter.exists() {
        let archive = archive.file_name().map_or_else(
            || archive.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        return Err(ProvisionIssue::Corruption {
            archive,
            expected: interpreter,
        }
        .into());
    }
    debug!(interpreter = %interpreter.display(), "python interpreter installed");
    Ok(interpreter)
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("opening python archive {}", archive.display()))?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.unpack(dest)
        .with_context(|| format!("extracting archive into {}", dest.display()))
}
