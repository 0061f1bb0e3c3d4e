use crate::context::RequestContext;
use crate::error::TrunkerError;
use crate::flags::{Active, Flags};

/// Resolve whether `flag_name` is active for this request.
///
/// A missing snapshot or an unknown flag is `false`, never an error: this
/// answers "is it on", it does not gate. A failing dynamic check is passed
/// back to the caller untouched.
pub async fn is_flag_active(
    snapshot: Option<&Flags>,
    flag_name: &str,
    ctx: &RequestContext,
) -> Result<bool, TrunkerError> {
    let Some(flag) = snapshot.and_then(|flags| flags.get(flag_name)) else {
        tracing::debug!(
            flag = %flag_name,
            attached = snapshot.is_some(),
            "flag not found, resolving inactive"
        );
        return Ok(false);
    };

    let result = match &flag.active {
        Active::Static(active) => return Ok(*active),
        Active::Sync(check) => check(ctx),
        Active::Async(check) => check(ctx.clone()).await,
    };

    result.map_err(|source| TrunkerError::Check {
        flag: flag_name.to_string(),
        source,
    })
}

impl Flags {
    /// Same as [`is_flag_active`] with this collection as the snapshot.
    pub async fn resolve(
        &self,
        flag_name: &str,
        ctx: &RequestContext,
    ) -> Result<bool, TrunkerError> {
        is_flag_active(Some(self), flag_name, ctx).await
    }
}
