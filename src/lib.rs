//! # trunker
//!
//! Feature-flag gating for axum request pipelines.
//!
//! Declare named flags, each active or inactive either as a literal or by a
//! check run against the request. Then put routes behind them:
//!
//! ```no_run
//! use axum::{middleware, routing::get, Router};
//! use trunker::{attach, restrict, Flag, Flags, Trunker, TrunkerOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let flags = Flags::new()
//!     .with("newCheckout", true)
//!     .with("internal", Flag::check(|ctx| ctx.header("x-staff") == Some("1")));
//! let trunker = Trunker::new(TrunkerOptions::new(flags));
//!
//! let app = Router::new()
//!     .route(
//!         "/checkout",
//!         get(|| async { "new checkout" }).layer(middleware::from_fn_with_state(
//!             trunker.restrict(["newCheckout", "internal"]),
//!             restrict,
//!         )),
//!     )
//!     .layer(middleware::from_fn_with_state(trunker.clone(), attach));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Flags can also come from the environment, see
//! [`TrunkerOptions::from_env`].

pub mod context;
pub mod env;
pub mod error;
pub mod evaluation;
pub mod flags;
pub mod gate;

pub use context::RequestContext;
pub use error::{BoxError, TrunkerError, NOT_ATTACHED_MESSAGE};
pub use evaluation::is_flag_active;
pub use flags::{Active, Flag, Flags};
pub use gate::response::{format, ErrorFormat, ErrorOptions, RejectionBody};
pub use gate::{
    attach, guard, restrict, FlagSnapshot, Guard, Restriction, Target, Trunker, TrunkerBuilder,
    TrunkerOptions,
};
