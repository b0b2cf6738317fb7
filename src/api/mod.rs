//! API Module
//!
//! HTTP handlers, extractors, middleware and routing for the blog generator.
//!
//! # Endpoints
//! - `GET /` - Liveness
//! - `GET /topics` - Predefined topics
//! - `POST /generate` - Generate a post with an illustration
//! - `GET /image/:topic` - Captioned illustration as a JPEG attachment
//! - `POST /auth/login`, `POST /auth/register`, `POST /auth/change-password`, `GET /auth/me`
//! - `GET /metrics`, `GET /health`
//! - `GET /cache/status`, `POST /cache/clear`
//! - `GET /admin/users`, `POST /admin/users/:username/{disable,enable}`
//! - `POST /api/webhook`, `POST /test-telegram`

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use extract::{AdminUser, ApiJson, CurrentUser};
pub use routes::{create_router, with_middleware};
pub use state::AppState;
