#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod activation;
pub mod issue;
pub mod platform;
pub mod release;
pub mod select;
pub mod version;

pub use activation::{activate, environment_interpreter, executables_dir, VIRTUAL_ENV};
pub use issue::ProvisionIssue;
pub use platform::{release_suffix, Libc, OsFamily, PlatformKey};
pub use release::{
    interpreter_location, ReleaseAsset, ReleaseDescriptor, ReleaseDocument, CHECKSUM_MANIFEST,
    CHECKSUM_SUFFIX,
};
pub use select::select_release;
pub use version::{InterpreterVersion, ParseVersionError};
