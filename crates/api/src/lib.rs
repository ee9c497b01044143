//! Herald admin API.
//!
//! - `GET  /health` - liveness plus database reachability
//! - `POST /api/notifications/send` - deliver a push notification to a target set
//! - `GET  /api/notifications/history` - recent delivery audit records

pub mod middleware;
pub mod routes;
pub mod state;
