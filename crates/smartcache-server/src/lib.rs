//! SmartCache Server
//!
//! HTTP front end for the breached-email runtime.
//!
//! # Routes
//!
//! - `GET /checkemail/:email` (200 breached, 404 not)
//! - `POST /addemail?email=` (201 added, 409 already breached)
//! - `POST /addemails` with a JSON array body
//! - `POST /deleteemail?email=`
//! - `GET /health` (no authentication)

pub mod api;
pub mod models;
pub mod security;
pub mod service;
pub mod state;
pub mod validation;

pub use service::BreachService;
pub use state::AppState;
