//! HTTP surface: routes, handler stubs, and middleware wiring.

pub mod handlers;
pub mod middleware;
pub mod routes;
