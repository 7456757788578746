use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kiche_domain::{ProvisionIssue, ReleaseDescriptor};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::progress::TransferProgress;
use crate::timings::TimingGuard;

pub(crate) const BLOCK_SIZE: usize = 64 * 1024;

/// Fetches release archives and checks them against their published digest.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download `release` into `target_dir` and verify its SHA-256.
    ///
    /// On a digest mismatch the file is removed and `ProvisionIssue::Integrity`
    /// is returned.
    pub fn download(
        &self,
        release: &ReleaseDescriptor,
        target_dir: &Path,
        progress: &mut dyn TransferProgress,
    ) -> Result<PathBuf> {
        let target = target_dir.join(release.basename());
        info!("downloading '{}' to '{}'", release.url(), target.display());
        {
            let _timing = TimingGuard::debug("download_file took ");
            progress.start(release.basename());
            let streamed = self.stream_to_file(release.url(), &target, progress);
            progress.finish();
            streamed?;
        }

        let valid = {
            let _timing = TimingGuard::debug("checksum validation took ");
            self.validate_checksum(release.checksum_url(), &target)?
        };
        if !valid {
            remove_if_present(&target)?;
            return Err(ProvisionIssue::Integrity {
                release: release.basename().to_string(),
                url: release.url().to_string(),
            }
            .into());
        }
        Ok(target)
    }

    fn stream_to_file(
        &self,
        url: &str,
        target: &Path,
        progress: &mut dyn TransferProgress,
    ) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| network_issue(url, &err))?;
        let total_size = response
            .content_length()
            .and_then(|length| i64::try_from(length).ok())
            .unwrap_or(-1);

        let file = File::create(target)
            .with_context(|| format!("creating download target {}", target.display()))?;
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BLOCK_SIZE];
        let mut block_number = 0u64;
        let mut written = 0u64;
        progress.advance(block_number, BLOCK_SIZE as u64, total_size);
        loop {
            let read =
                read_block(&mut response, &mut buffer).map_err(|err| network_issue(url, &err))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .with_context(|| format!("writing {}", target.display()))?;
            written += read as u64;
            block_number += 1;
            progress.advance(block_number, BLOCK_SIZE as u64, total_size);
        }
        writer
            .flush()
            .with_context(|| format!("writing {}", target.display()))?;
        debug!(bytes = written, "download complete");
        Ok(written)
    }

    fn validate_checksum(&self, checksum_url: &str, file: &Path) -> Result<bool> {
        let actual = compute_file_sha256(file)?;
        let expected = self.read_checksum(checksum_url)?;
        debug!(%expected, %actual, "comparing sha256 digests");
        Ok(expected.eq_ignore_ascii_case(&actual))
    }

    fn read_checksum(&self, checksum_url: &str) -> Result<String> {
        let body = self
            .client
            .get(checksum_url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .map_err(|err| network_issue(checksum_url, &err))?;
        Ok(body.trim().to_string())
    }
}

/// Fill `buffer` completely unless the stream ends first.
fn read_block(reader: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn network_issue(url: &str, err: &dyn std::fmt::Display) -> ProvisionIssue {
    ProvisionIssue::Network {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
    }
}

/// Hex-encoded SHA-256 of a file on disk.
pub fn compute_file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 32 * 1024];
    loop {
        let read = file
            .read(&mut buf)
            .with_context(|| format!("reading {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
