use std::sync::Arc;
use trunker::{Flag, Trunker, TrunkerOptions};
use uuid::Uuid;

use crate::config::Config;

/// Flag that is active only for authenticated users on the beta list.
pub const BETA_USERS_FLAG: &str = "betaUsers";

#[derive(Clone)]
pub struct AppState {
    pub trunker: Trunker,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    /// Adds the `betaUsers` check to the flags in `options`.
    pub fn new(mut options: TrunkerOptions, config: &Config) -> Self {
        let beta_users: Arc<[Uuid]> = config.beta_users.clone().into();

        options.flags = options.flags.with(
            BETA_USERS_FLAG,
            Flag::check(move |ctx| {
                ctx.extension::<Uuid>()
                    .is_some_and(|user_id| beta_users.contains(user_id))
            }),
        );

        Self {
            trunker: Trunker::new(options),
            jwt_secret: config.jwt_secret.as_str().into(),
        }
    }
}
