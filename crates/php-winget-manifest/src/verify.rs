//! Optional check that the published digests match the actual downloads

use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::errors::VerifyError;
use crate::query::Arch;
use crate::release::ReleaseInfo;
use crate::source::get_bytes;

/// PHP Windows zips are well above this; anything smaller is an error page
/// or a truncated transfer.
pub const MIN_ARTIFACT_BYTES: usize = 20 * 1024 * 1024;

pub struct ArtifactVerifier {
    client: Client,
    min_bytes: usize,
}

impl ArtifactVerifier {
    pub fn new(client: Client) -> Self {
        ArtifactVerifier {
            client,
            min_bytes: MIN_ARTIFACT_BYTES,
        }
    }

    /// Download every artifact of the release and compare digests
    pub fn verify(&self, release: &ReleaseInfo) -> Result<(), VerifyError> {
        for arch in Arch::ALL {
            let artifact = release.artifact(arch);
            info!("Verifying {} artifact {}", arch, artifact.url());

            let bytes = get_bytes(&self.client, artifact.url()).map_err(|source| {
                VerifyError::Download {
                    arch: arch.as_str(),
                    source,
                }
            })?;
            check_artifact(arch, artifact.sha256(), &bytes, self.min_bytes)?;
        }
        Ok(())
    }
}

/// Size floor plus SHA-256 comparison for one downloaded artifact
pub fn check_artifact(
    arch: Arch,
    expected: &str,
    bytes: &[u8],
    min_bytes: usize,
) -> Result<(), VerifyError> {
    if bytes.len() < min_bytes {
        return Err(VerifyError::TooSmall {
            arch: arch.as_str(),
            size: bytes.len(),
        });
    }

    let actual = hex::encode(Sha256::digest(bytes));
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(VerifyError::Mismatch {
            arch: arch.as_str(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("abc")
    const ABC_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_matching_digest() {
        assert!(check_artifact(Arch::X64, ABC_DIGEST, b"abc", 0).is_ok());
        assert!(check_artifact(Arch::X64, &ABC_DIGEST.to_ascii_uppercase(), b"abc", 0).is_ok());
    }

    #[test]
    fn test_mismatch_names_architecture() {
        let result = check_artifact(Arch::X86, ABC_DIGEST, b"abd", 0);
        assert!(matches!(result, Err(VerifyError::Mismatch { arch: "x86", .. })));
    }

    #[test]
    fn test_small_download_rejected() {
        let result = check_artifact(Arch::X64, ABC_DIGEST, b"abc", MIN_ARTIFACT_BYTES);
        assert!(matches!(result, Err(VerifyError::TooSmall { size: 3, .. })));
    }
}
