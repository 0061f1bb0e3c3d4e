//! The request gate.
//!
//! Two middleware functions do the work and are meant for
//! [`axum::middleware::from_fn_with_state`]:
//!
//! - [`attach`] puts a [`FlagSnapshot`] on every request that passes it.
//! - [`restrict`] rejects the request unless every flag of its target is
//!   active. It needs `attach` to have run first.
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use trunker::{attach, restrict, Flags, Trunker, TrunkerOptions};
//!
//! let trunker = Trunker::new(TrunkerOptions::new(
//!     Flags::new().with("betaFeature1", true).with("betaFeature2", false),
//! ));
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/beta-feature1",
//!         get(|| async { "Hello" })
//!             .layer(middleware::from_fn_with_state(trunker.restrict("betaFeature1"), restrict)),
//!     )
//!     .layer(middleware::from_fn_with_state(trunker.clone(), attach));
//! ```
//!
//! [`guard`] does both steps in a single layer for routes that do not share
//! an `attach` layer.

pub mod response;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, Extensions},
    middleware::Next,
    response::Response,
};
use std::ops::Deref;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::TrunkerError;
use crate::flags::Flags;
use response::ErrorOptions;

/// Gate configuration: the flags to serve and how to reject.
///
/// There is no `Default`: a gate always starts from an explicit flag
/// collection.
///
/// ```compile_fail
/// let _ = trunker::TrunkerOptions::default();
/// ```
#[derive(Debug, Clone)]
pub struct TrunkerOptions {
    pub flags: Flags,
    pub error: Option<ErrorOptions>,
}

impl TrunkerOptions {
    pub fn new(flags: Flags) -> Self {
        Self { flags, error: None }
    }

    pub fn with_error(mut self, error: ErrorOptions) -> Self {
        self.error = Some(error);
        self
    }
}

/// A configured gate. Cheap to clone; all clones share one immutable
/// configuration.
#[derive(Debug, Clone)]
pub struct Trunker {
    options: Arc<TrunkerOptions>,
}

impl Trunker {
    pub fn new(options: TrunkerOptions) -> Self {
        Self { options: Arc::new(options) }
    }

    pub fn builder() -> TrunkerBuilder {
        TrunkerBuilder::default()
    }

    pub fn options(&self) -> &TrunkerOptions {
        &self.options
    }

    pub fn flags(&self) -> &Flags {
        &self.options.flags
    }

    /// State for the [`restrict`] middleware.
    pub fn restrict(&self, target: impl Into<Target>) -> Restriction {
        Restriction {
            trunker: self.clone(),
            target: target.into(),
        }
    }

    /// State for the [`guard`] middleware.
    pub fn guard(&self, target: impl Into<Target>) -> Guard {
        Guard(self.restrict(target))
    }

    /// Stores this gate's flags on the request unless some earlier layer
    /// already did. Returns whether a snapshot was inserted.
    pub fn attach_to(&self, extensions: &mut Extensions) -> bool {
        if extensions.get::<FlagSnapshot>().is_some() {
            tracing::trace!("flag snapshot already attached");
            return false;
        }
        extensions.insert(FlagSnapshot(self.options.flags.clone()));
        true
    }

    /// The first flag of `target` that resolves inactive against
    /// `snapshot`, for handlers that gate by hand.
    pub async fn first_inactive(
        snapshot: &Flags,
        target: &Target,
        ctx: &RequestContext,
    ) -> Result<Option<String>, TrunkerError> {
        Ok(target.first_inactive(snapshot, ctx).await?.map(str::to_string))
    }

    /// The configured rejection for `flag_name`.
    pub fn reject(&self, flag_name: &str) -> Response {
        match &self.options.error {
            Some(error) => error.reject(flag_name),
            None => ErrorOptions::default().reject(flag_name),
        }
    }
}

impl From<TrunkerOptions> for Trunker {
    fn from(options: TrunkerOptions) -> Self {
        Self::new(options)
    }
}

#[derive(Debug, Default)]
pub struct TrunkerBuilder {
    flags: Option<Flags>,
    error: Option<ErrorOptions>,
}

impl TrunkerBuilder {
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn error(mut self, error: ErrorOptions) -> Self {
        self.error = Some(error);
        self
    }

    /// Fails with [`TrunkerError::MissingFlags`] if no flags were given.
    pub fn build(self) -> Result<Trunker, TrunkerError> {
        let flags = self.flags.ok_or(TrunkerError::MissingFlags)?;
        Ok(Trunker::new(TrunkerOptions { flags, error: self.error }))
    }
}

/// The flag name, or ordered list of names, a route needs active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    One(String),
    All(Vec<String>),
}

impl Target {
    pub fn names(&self) -> &[String] {
        match self {
            Target::One(name) => std::slice::from_ref(name),
            Target::All(names) => names,
        }
    }

    /// The first flag, in target order, that resolves inactive.
    ///
    /// Flags are resolved one after the other and nothing past the first
    /// inactive one runs. An empty list has no inactive flag.
    pub async fn first_inactive(
        &self,
        snapshot: &Flags,
        ctx: &RequestContext,
    ) -> Result<Option<&str>, TrunkerError> {
        for name in self.names() {
            if !snapshot.resolve(name, ctx).await? {
                return Ok(Some(name.as_str()));
            }
        }
        Ok(None)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::One(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::One(name)
    }
}

impl<S: Into<String>> From<Vec<S>> for Target {
    fn from(names: Vec<S>) -> Self {
        Target::All(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Target {
    fn from(names: [S; N]) -> Self {
        Target::All(names.into_iter().map(Into::into).collect())
    }
}

impl From<&[&str]> for Target {
    fn from(names: &[&str]) -> Self {
        Target::All(names.iter().map(|name| name.to_string()).collect())
    }
}

/// The flags attached to one request.
///
/// Also an extractor, for handlers that want to branch on a flag
/// themselves instead of being restricted:
///
/// ```no_run
/// use trunker::{FlagSnapshot, RequestContext};
///
/// async fn handler(snapshot: FlagSnapshot, ctx: RequestContext) -> &'static str {
///     match snapshot.is_active("betaFeature1", &ctx).await {
///         Ok(true) => "new",
///         _ => "old",
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FlagSnapshot(pub Flags);

impl FlagSnapshot {
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<FlagSnapshot>().cloned()
    }

    pub async fn is_active(
        &self,
        flag_name: &str,
        ctx: &RequestContext,
    ) -> Result<bool, TrunkerError> {
        self.0.resolve(flag_name, ctx).await
    }
}

impl Deref for FlagSnapshot {
    type Target = Flags;

    fn deref(&self) -> &Flags {
        &self.0
    }
}

impl<S> FromRequestParts<S> for FlagSnapshot
where
    S: Send + Sync,
{
    type Rejection = TrunkerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        FlagSnapshot::from_extensions(&parts.extensions).ok_or(TrunkerError::NotAttached)
    }
}

/// State of one [`restrict`] layer.
#[derive(Debug, Clone)]
pub struct Restriction {
    trunker: Trunker,
    target: Target,
}

impl Restriction {
    pub fn target(&self) -> &Target {
        &self.target
    }

    async fn run(
        &self,
        snapshot: FlagSnapshot,
        req: Request,
        next: Next,
    ) -> Result<Response, TrunkerError> {
        let ctx = RequestContext::from_request(&req);

        match self.target.first_inactive(&snapshot, &ctx).await? {
            Some(flag) => {
                tracing::debug!(
                    flag = %flag,
                    path = %ctx.path(),
                    "flag inactive, rejecting request"
                );
                Ok(self.trunker.reject(flag))
            }
            None => {
                tracing::debug!(flags = ?self.target.names(), path = %ctx.path(), "flags active");
                Ok(next.run(req).await)
            }
        }
    }
}

/// State of one [`guard`] layer.
#[derive(Debug, Clone)]
pub struct Guard(Restriction);

/// Attaches the gate's flags to the request, first attachment wins.
/// Never rejects.
pub async fn attach(State(trunker): State<Trunker>, mut req: Request, next: Next) -> Response {
    trunker.attach_to(req.extensions_mut());
    next.run(req).await
}

/// Lets the request through only if every flag of the target is active.
///
/// Errors with [`TrunkerError::NotAttached`] when no [`attach`] layer ran
/// before it, and with [`TrunkerError::Check`] when a dynamic check fails.
pub async fn restrict(
    State(restriction): State<Restriction>,
    req: Request,
    next: Next,
) -> Result<Response, TrunkerError> {
    let snapshot =
        FlagSnapshot::from_extensions(req.extensions()).ok_or(TrunkerError::NotAttached)?;
    restriction.run(snapshot, req, next).await
}

/// [`attach`] followed by [`restrict`] in one layer.
pub async fn guard(
    State(Guard(restriction)): State<Guard>,
    mut req: Request,
    next: Next,
) -> Result<Response, TrunkerError> {
    restriction.trunker.attach_to(req.extensions_mut());
    restrict(State(restriction), req, next).await
}
