//! Authentication and authorization core for the campus activity portal.
//!
//! This crate provides:
//!
//! - A session store persisted to durable client storage
//! - An auth gateway that logs in against the portal API and tolerates its
//!   inconsistent response shapes
//! - Role-based route guards over a static route table
//! - Bearer-authenticated API requests with refresh-token renewal
//!
//! # Quick Start
//!
//! ```no_run
//! use uniact_auth::{ActionResult, AuthAction, AuthConfig, AuthContext, Credentials};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut ctx = AuthContext::from_config(&AuthConfig::from_env())?;
//!
//! let credentials = Credentials::new("65015368", "secret");
//! credentials.validate()?;
//!
//! match ctx.dispatch(AuthAction::Login(credentials)).await {
//!     ActionResult::LoggedIn(identity) => println!("hello {}", identity.display_name()),
//!     ActionResult::LoginFailed(message) => eprintln!("{}", message),
//!     ActionResult::LoggedOut => unreachable!(),
//! }
//!
//! println!("/admin -> {}", ctx.guard("/admin"));
//! # Ok(())
//! # }
//! ```
//!
//! # Roles
//!
//! | Role | Home | May view |
//! |------|------|----------|
//! | `student` | `/` | public and personal pages |
//! | `staff` | `/staff` | plus activity management |
//! | `admin` | `/admin` | everything |
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `UNIACT_API_URL` | API base URL (default: `http://localhost:5000/api`) |
//! | `UNIACT_API_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `UNIACT_ALLOW_MISSING_TOKEN` | Synthesize a token when login returns none (default: true) |
//! | `UNIACT_SESSION_DIR` | Session storage directory |

pub mod client;
pub mod context;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod session;
pub mod storage;
pub mod types;

// Re-export main types
pub use client::ApiClient;
pub use context::{ActionResult, AuthAction, AuthContext};
pub use error::{AuthError, AuthResult};
pub use gateway::{AuthGateway, LoginOutcome};
pub use guard::{
    evaluate, find_rule, home_for, paths, require_authenticated, require_roles, Access,
    GuardDecision, RouteRule, ROUTES,
};
pub use session::{SessionState, SessionStore, REFRESH_TOKEN_KEY, SESSION_KEY};
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
pub use types::{AuthConfig, Credentials, Identity, Role, SessionRecord};
