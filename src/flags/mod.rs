use futures::future::BoxFuture;
use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::BoxError;

// MODELS

/// Synchronous dynamic check.
pub type SyncCheck = Arc<dyn Fn(&RequestContext) -> Result<bool, BoxError> + Send + Sync>;

/// Asynchronous dynamic check. Gets its own copy of the context so the
/// returned future can be `'static`.
pub type AsyncCheck =
    Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Result<bool, BoxError>> + Send + Sync>;

/// How a flag decides whether it is active.
#[derive(Clone)]
pub enum Active {
    Static(bool),
    Sync(SyncCheck),
    Async(AsyncCheck),
}

impl Active {
    /// The literal value, `None` for dynamic flags.
    pub fn as_static(&self) -> Option<bool> {
        match self {
            Active::Static(value) => Some(*value),
            Active::Sync(_) | Active::Async(_) => None,
        }
    }
}

impl fmt::Debug for Active {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Active::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Active::Sync(_) => f.write_str("Sync(..)"),
            Active::Async(_) => f.write_str("Async(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub active: Active,
}

impl Flag {
    pub fn new(active: bool) -> Self {
        Self { active: Active::Static(active) }
    }

    pub fn enabled() -> Self {
        Self::new(true)
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Flag decided per request by a synchronous predicate.
    ///
    /// ```
    /// use trunker::Flag;
    ///
    /// let flag = Flag::check(|ctx| ctx.header("x-beta") == Some("1"));
    /// ```
    pub fn check<F>(check: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        let check: SyncCheck = Arc::new(move |ctx: &RequestContext| -> Result<bool, BoxError> {
            Ok(check(ctx))
        });
        Self { active: Active::Sync(check) }
    }

    /// Like [`Flag::check`], but the predicate may fail. The failure reaches
    /// the caller of the gate instead of turning into a deny.
    pub fn try_check<F, E>(check: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let check: SyncCheck = Arc::new(move |ctx: &RequestContext| -> Result<bool, BoxError> {
            check(ctx).map_err(Into::into)
        });
        Self { active: Active::Sync(check) }
    }

    /// Flag decided per request by an async predicate.
    ///
    /// ```
    /// use trunker::Flag;
    ///
    /// let flag = Flag::check_async(|_ctx| async { true });
    /// ```
    pub fn check_async<F, Fut>(check: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let check: AsyncCheck = Arc::new(
            move |ctx: RequestContext| -> BoxFuture<'static, Result<bool, BoxError>> {
                let fut = check(ctx);
                Box::pin(async move { Ok(fut.await) })
            },
        );
        Self { active: Active::Async(check) }
    }

    pub fn try_check_async<F, Fut, E>(check: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let check: AsyncCheck = Arc::new(
            move |ctx: RequestContext| -> BoxFuture<'static, Result<bool, BoxError>> {
                let fut = check(ctx);
                Box::pin(async move { fut.await.map_err(Into::into) })
            },
        );
        Self { active: Active::Async(check) }
    }

    pub fn is_dynamic(&self) -> bool {
        self.active.as_static().is_none()
    }
}

impl From<bool> for Flag {
    fn from(active: bool) -> Self {
        Self::new(active)
    }
}

/// Serialized as `{"active": true}`; dynamic flags have `"active": null`.
impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Flag", 1)?;
        state.serialize_field("active", &self.active.as_static())?;
        state.end()
    }
}

/// Named collection of flags.
///
/// Immutable once shared: cloning hands out another reference to the same
/// map, which is what lets every request carry its own snapshot for free.
#[derive(Debug, Clone, Default)]
pub struct Flags(Arc<BTreeMap<String, Flag>>);

impl Serialize for Flags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces `name`. Returns `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, flag: impl Into<Flag>) -> Self {
        Arc::make_mut(&mut self.0).insert(name.into(), flag.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Flag)> {
        self.0.iter().map(|(name, flag)| (name.as_str(), flag))
    }

    /// True when both handles point at the same underlying map.
    pub fn ptr_eq(&self, other: &Flags) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<K: Into<String>> FromIterator<(K, Flag)> for Flags {
    fn from_iter<I: IntoIterator<Item = (K, Flag)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(name, flag)| (name.into(), flag))
            .collect::<BTreeMap<_, _>>();
        Self(Arc::new(map))
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Flag); N]> for Flags {
    fn from(flags: [(K, Flag); N]) -> Self {
        flags.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_flags_serialize_their_value() {
        let flags = Flags::from([("test1", Flag::enabled()), ("test2", Flag::disabled())]);
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "test1": { "active": true },
                "test2": { "active": false },
            })
        );
    }

    #[test]
    fn test_dynamic_flag_serializes_null() {
        let flags = Flags::new().with("beta", Flag::check(|_| true));
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json, serde_json::json!({ "beta": { "active": null } }));
        assert!(flags.get("beta").unwrap().is_dynamic());
    }

    #[test]
    fn test_names_are_unique() {
        let flags = Flags::new()
            .with("beta", false)
            .with("beta", true)
            .with("other", Flag::check_async(|_| async { false }));
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get("beta").unwrap().active.as_static(), Some(true));
        assert_eq!(flags.names().collect::<Vec<_>>(), vec!["beta", "other"]);
    }

    #[test]
    fn test_clones_share_the_map() {
        let flags = Flags::from([("a", Flag::enabled())]);
        let snapshot = flags.clone();
        assert!(flags.ptr_eq(&snapshot));
        assert!(!flags.ptr_eq(&Flags::from([("a", Flag::enabled())])));
    }
}
