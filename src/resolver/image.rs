//! Image reference resolution

use crate::client::RegistryApi;
use crate::error::{PinnyError, Result};
use crate::reference::ImageRef;

/// Fetch the manifest digest for `image`, returning a copy with the digest set
///
/// An image that already carries a digest is resolved by that digest, so the
/// registry confirms the manifest still exists.
pub fn resolve(api: &mut dyn RegistryApi, image: &ImageRef) -> Result<ImageRef> {
    let digest = api.digest(image)?;
    if digest.is_empty() {
        return Err(PinnyError::DigestNotFound {
            reference: image.canonical(),
        });
    }

    tracing::debug!("Resolved {} to {}", image.canonical_tag(), digest);
    let mut resolved = image.clone();
    resolved.digest = Some(digest);
    Ok(resolved)
}
