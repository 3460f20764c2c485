//! Domain services built on `HttpClient` and `TrafficClient`.
//!
//! Each service is a cheap handle over the shared client; clones talk to
//! the same session store.

mod admin;
mod auth;
mod citizen;
mod fines;

pub use admin::{AdminService, ListingCache};
pub use auth::AuthService;
pub use citizen::CitizenService;
pub use fines::FineService;
