//! Remote existence check backing the overwrite guard.

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::config::ExistencePolicy;
use crate::contract::{RemoteObjectRef, RemoteStore};
use crate::error::PublishError;

/// Asks the store whether `object` is already present.
///
/// Under [`ExistencePolicy::Lenient`] only a 200 counts as present; 401, 5xx, redirects and so on
/// all read as "absent", so a flaky server can let an overwrite through. Under
/// [`ExistencePolicy::Strict`] those statuses abort with [`PublishError::UnexpectedStatus`].
/// Transport failures are always errors.
pub async fn remote_exists<S>(
    store: &S,
    object: &RemoteObjectRef,
    policy: ExistencePolicy,
) -> Result<bool, PublishError>
where
    S: RemoteStore + ?Sized,
{
    let url = object.url();
    let status = store.head(object).await?;
    info!(url = %url, status = status.as_u16(), ?policy, "[PUBLISH][GUARD] Existence check answered");

    if status == StatusCode::OK {
        return Ok(true);
    }
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Ok(false);
    }
    match policy {
        ExistencePolicy::Lenient => {
            warn!(url = %url, status = status.as_u16(), "[PUBLISH][GUARD] Treating non-200 status as absent");
            Ok(false)
        }
        ExistencePolicy::Strict => Err(PublishError::UnexpectedStatus {
            url: url.to_string(),
            status,
        }),
    }
}
