//! Profile API: finalizes avatar changes by linking provisionally uploaded
//! storage objects to user profiles inside a request-scoped transaction.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod middleware;
pub mod repositories;
pub mod router;
pub mod routes;
