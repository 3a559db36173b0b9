//! Fetches justification content and computes its integrity digest.

use stakelock_primitives::Md5Checksum;
use tracing::debug;

use crate::CoordinatorError;

/// Downloads the content behind a justification URL and digests it.
///
/// Slash, reclaim and deny operations publish a URL together with the digest
/// of what it served at operation time, so later readers can tell whether
/// the evidence changed underneath them.
pub async fn checksum_of(url: &str) -> Result<Md5Checksum, CoordinatorError> {
    let fetch_err = |source| CoordinatorError::Justification {
        url: url.to_owned(),
        source,
    };

    let response = reqwest::get(url).await.map_err(fetch_err)?;
    let body = response
        .error_for_status()
        .map_err(fetch_err)?
        .bytes()
        .await
        .map_err(fetch_err)?;

    let checksum = Md5Checksum::digest(&body);
    debug!(%url, %checksum, bytes = body.len(), "justification digested");

    Ok(checksum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unfetchable_justification_is_an_error() {
        let err = checksum_of("not-a-url")
            .await
            .expect_err("a malformed url must not digest");
        assert!(
            matches!(err, CoordinatorError::Justification { url, .. } if url == "not-a-url"),
            "the failure must name the offending url"
        );
    }
}
