//! Archive service - AES-encrypted single-file ZIP archives
//!
//! Archives are WinZip AES-256 encrypted, so any mainstream extractor can
//! open them with the 8-digit password. Building and verifying are separate
//! steps: an archive is only ever handed to the mail transport after it has
//! been read back and decrypted in full.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{AesMode, CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::result::ArchiveError;
use crate::domain::{ensure_well_formed, Credential, EncryptedArchive, SourceFile};

/// Archive file extension in the staging directory
pub const ARCHIVE_EXTENSION: &str = "zip";

/// How many `_N` suffixes to try before giving up on a unique name
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Builds and verifies encrypted archives inside a staging directory
#[derive(Debug, Clone)]
pub struct ArchiveCipher {
    staging_dir: PathBuf,
}

impl ArchiveCipher {
    pub fn new(staging_dir: PathBuf) -> Self {
        Self { staging_dir }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Build an encrypted archive holding `source` as its only member
    pub fn build(
        &self,
        source: &SourceFile,
        credential: &Credential,
    ) -> Result<EncryptedArchive, ArchiveError> {
        self.build_at(source, credential, Local::now())
    }

    /// Same as [`ArchiveCipher::build`] with an explicit creation time
    pub fn build_at(
        &self,
        source: &SourceFile,
        credential: &Credential,
        created_at: DateTime<Local>,
    ) -> Result<EncryptedArchive, ArchiveError> {
        if !source.exists() {
            return Err(ArchiveError::NotFound(source.path().to_path_buf()));
        }
        ensure_well_formed(credential.expose())?;

        fs::create_dir_all(&self.staging_dir).map_err(|e| {
            ArchiveError::io(
                format!("Failed to create staging directory {:?}", self.staging_dir),
                e,
            )
        })?;

        let member = source.file_name();
        let base = archive_base_name(&source.stem(), &created_at);
        let (path, file) = self.create_unique(&base)?;
        debug!(archive = %path.display(), "writing encrypted archive");

        if let Err(e) = write_encrypted(file, source.path(), &member, credential) {
            // Never leave a half-written archive behind for the transport to pick up
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        let size_bytes = fs::metadata(&path)
            .map_err(|e| ArchiveError::io(format!("Failed to stat archive {:?}", path), e))?
            .len();

        Ok(EncryptedArchive {
            path,
            member,
            created_at,
            size_bytes,
        })
    }

    /// Check that `archive` opens with `credential` and holds exactly `expected_member`
    ///
    /// Read-only. Succeeds only when the member decrypts completely and its
    /// authentication code matches.
    pub fn verify(
        &self,
        archive: &Path,
        credential: &Credential,
        expected_member: &str,
    ) -> Result<(), ArchiveError> {
        self.read_member(archive, credential, expected_member)
            .map(|_| ())
    }

    /// Decrypt and return the bytes of `expected_member`
    pub fn read_member(
        &self,
        archive: &Path,
        credential: &Credential,
        expected_member: &str,
    ) -> Result<Vec<u8>, ArchiveError> {
        if !archive.is_file() {
            return Err(ArchiveError::NotFound(archive.to_path_buf()));
        }

        let file = File::open(archive)
            .map_err(|e| ArchiveError::io(format!("Failed to open archive {:?}", archive), e))?;
        let mut zip = ZipArchive::new(file).map_err(integrity_failure)?;

        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        if names.len() != 1 || names[0] != expected_member {
            return Err(ArchiveError::ContentMismatch {
                expected: expected_member.to_string(),
                found: names,
            });
        }

        let mut entry = zip
            .by_name_decrypt(expected_member, credential.expose().as_bytes())
            .map_err(integrity_failure)?;
        if !entry.encrypted() {
            return Err(ArchiveError::IntegrityFailure(format!(
                "member {:?} is not encrypted",
                expected_member
            )));
        }

        let declared = entry.size();
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| ArchiveError::IntegrityFailure(e.to_string()))?;
        if contents.len() as u64 != declared {
            return Err(ArchiveError::IntegrityFailure(format!(
                "member {:?} is {} bytes, header declares {}",
                expected_member,
                contents.len(),
                declared
            )));
        }

        Ok(contents)
    }

    /// Create `<base>.zip`, or `<base>_2.zip`, `<base>_3.zip`... if taken
    fn create_unique(&self, base: &str) -> Result<(PathBuf, File), ArchiveError> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let name = if attempt == 1 {
                format!("{}.{}", base, ARCHIVE_EXTENSION)
            } else {
                format!("{}_{}.{}", base, attempt, ARCHIVE_EXTENSION)
            };
            let path = self.staging_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(ArchiveError::io(
                        format!("Failed to create archive file {:?}", path),
                        e,
                    ))
                }
            }
        }
        Err(ArchiveError::io(
            format!("No free archive name for {:?}", base),
            io::Error::from(io::ErrorKind::AlreadyExists),
        ))
    }
}

fn write_encrypted(
    file: File,
    source: &Path,
    member: &str,
    credential: &Credential,
) -> Result<(), ArchiveError> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .with_aes_encryption(AesMode::Aes256, credential.expose());

    zip.start_file(member, options)?;
    let mut reader = File::open(source)
        .map_err(|e| ArchiveError::io(format!("Failed to read source file {:?}", source), e))?;
    io::copy(&mut reader, &mut zip)
        .map_err(|e| ArchiveError::io(format!("Failed to write {:?} into archive", member), e))?;

    let mut file = zip.finish()?;
    file.flush()
        .and_then(|_| file.sync_all())
        .map_err(|e| ArchiveError::io("Failed to flush archive", e))?;
    Ok(())
}

fn integrity_failure(err: ZipError) -> ArchiveError {
    ArchiveError::IntegrityFailure(err.to_string())
}

/// `<sanitized-stem>_<YYYYMMDD_HHMMSS>` without extension
pub fn archive_base_name(stem: &str, created_at: &DateTime<Local>) -> String {
    format!(
        "{}_{}",
        sanitize_stem(stem),
        created_at.format("%Y%m%d_%H%M%S")
    )
}

/// Replace each run of characters outside `[A-Za-z0-9._-]` with one `_`
pub fn sanitize_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut in_run = false;
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    if out.is_empty() {
        "archive".to_string()
    } else {
        out
    }
}
