//! Full product validation: the pure rules from `shopfront-core`, then
//! media resolution.

use shopfront_core::error::ValidationError;
use shopfront_core::types::Product;
use shopfront_core::validation::{check_product, ValidationRules};
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::ports::{MediaError, MediaResolver};

/// Validates `product` for `namespace`; the first failing check wins.
///
/// Negative stock is clamped in place before the status and media checks run.
/// Media ids are resolved one at a time: product-level ids first, then each
/// variant's ids in order. Any resolver failure rejects the product.
pub async fn validate_product(
    ctx: &RequestContext,
    namespace: &str,
    product: &mut Product,
    rules: &ValidationRules,
    media: &dyn MediaResolver,
) -> Result<(), ValidationError> {
    check_product(product, rules)?;

    for media_id in product.media_refs() {
        match media.get_by_id(ctx, namespace, media_id).await {
            Ok(_) => {}
            Err(MediaError::NotFound(_)) => {
                debug!(%media_id, namespace, "Media reference did not resolve");
                return Err(ValidationError::InvalidMedia(media_id));
            }
            Err(e) => {
                warn!(%media_id, namespace, error = %e, "Media lookup failed");
                return Err(ValidationError::InvalidMedia(media_id));
            }
        }
    }

    Ok(())
}
