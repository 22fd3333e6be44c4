//! AES-128 key material for HLS segment encryption.
//!
//! Every attempt generates a fresh key and IV from the OS random source,
//! writes the raw key to `enc.key`, and writes the 3-line key-info
//! descriptor the encoder reads: key-delivery URI, key file path, IV hex.

use std::path::PathBuf;

use rand::RngCore;
use thiserror::Error;
use tracing::debug;

use crate::layout::HlsOutput;

/// Key and IV length in bytes (AES-128).
pub const KEY_LEN: usize = 16;

/// Errors writing key material to the output directory.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to write encryption key to {path}: {source}")]
    WriteKey {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write key info to {path}: {source}")]
    WriteKeyInfo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl KeyError {
    /// Key writes only touch the job-owned output directory; a later
    /// attempt against a fresh directory may well succeed.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Freshly generated encryption key and IV for one attempt.
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
    iv: [u8; KEY_LEN],
}

impl KeyMaterial {
    /// Generates key and IV from the OS cryptographic random source.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; KEY_LEN];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// Raw key bytes, persisted on the lesson record when the run completes.
    pub fn key_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// IV rendered as 32 lowercase hex characters.
    pub fn iv_hex(&self) -> String {
        self.iv.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Expands the key-delivery URI template for one lesson.
pub fn key_uri(template: &str, lesson_id: i64) -> String {
    template.replace("{lesson_id}", &lesson_id.to_string())
}

/// Writes `enc.key` (16 raw bytes) and the 3-line `enc.keyinfo` descriptor.
///
/// `key_uri` must be the externally reachable URI the key-delivery endpoint
/// serves this lesson's key from; the encoder copies it verbatim into the
/// playlist's `#EXT-X-KEY` header.
pub async fn write_key_files(
    material: &KeyMaterial,
    output: &HlsOutput,
    key_uri: &str,
) -> Result<(), KeyError> {
    let key_path = output.key_path();
    tokio::fs::write(&key_path, material.key_bytes())
        .await
        .map_err(|source| KeyError::WriteKey {
            path: key_path.clone(),
            source,
        })?;

    let info_path = output.key_info_path();
    let info = format!("{}\n{}\n{}", key_uri, key_path.display(), material.iv_hex());
    tokio::fs::write(&info_path, info)
        .await
        .map_err(|source| KeyError::WriteKeyInfo {
            path: info_path,
            source,
        })?;

    debug!("Wrote key material for lesson {}", output.lesson_id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_generate_produces_distinct_material() {
        let a = KeyMaterial::generate();
        let b = KeyMaterial::generate();
        assert_eq!(a.key_bytes().len(), 16);
        assert_ne!(a.key_bytes(), b.key_bytes());
        assert_ne!(a.iv_hex(), b.iv_hex());
    }

    #[test]
    fn test_iv_hex_is_32_lowercase_hex_chars() {
        let material = KeyMaterial::generate();
        let hex = material.iv_hex();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_key_uri_expands_lesson_id() {
        assert_eq!(
            key_uri("https://example.com/lessons/{lesson_id}/key", 15),
            "https://example.com/lessons/15/key"
        );
        assert_eq!(key_uri("/static/key", 15), "/static/key");
    }

    #[tokio::test]
    async fn test_write_key_files_layout() {
        let tmp = TempDir::new().unwrap();
        let output = HlsOutput::for_lesson(tmp.path(), 3);
        tokio::fs::create_dir_all(output.dir()).await.unwrap();

        let material = KeyMaterial::generate();
        write_key_files(&material, &output, "https://example.com/lessons/3/key")
            .await
            .unwrap();

        let key = std::fs::read(output.key_path()).unwrap();
        assert_eq!(key, material.key_bytes());
        assert_eq!(key.len(), 16);

        let info = std::fs::read_to_string(output.key_info_path()).unwrap();
        let lines: Vec<&str> = info.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "https://example.com/lessons/3/key");
        assert_eq!(Path::new(lines[1]), output.key_path());
        assert_eq!(lines[2], material.iv_hex());
    }

    #[tokio::test]
    async fn test_write_key_files_fails_without_output_dir() {
        let tmp = TempDir::new().unwrap();
        let output = HlsOutput::for_lesson(tmp.path(), 4);

        let material = KeyMaterial::generate();
        let err = write_key_files(&material, &output, "/lessons/4/key")
            .await
            .unwrap_err();
        assert!(matches!(err, KeyError::WriteKey { .. }));
        assert!(err.is_retryable());
    }
}
