//! Async API client for the traffic-violation service.
//!
//! # Overview
//! Officers search drivers by licence number and issue fines; admins manage
//! police and citizen accounts; citizens view and dispute their fines. All
//! of it goes through one request lifecycle: bearer-token attachment, a
//! single retry on network failure or 5xx, response validation, and
//! primary/fallback endpoint chaining.
//!
//! # Design
//! - `TrafficClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. It never touches the network.
//! - `HttpClient` owns the interceptor chain and executes requests through
//!   an injected `Transport`.
//! - The session lives in an injected `SessionStore`, written as one record.
//! - Services (`AuthService`, `FineService`, `AdminService`,
//!   `CitizenService`) glue the two together; `TrafficApi` wires one of each.
//! - DTOs are defined independently from the mock-server crate; end-to-end
//!   tests catch schema drift.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod fallback;
pub mod http;
pub mod http_client;
pub mod services;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod transport;
pub mod types;

pub use api::TrafficApi;
pub use cache::TtlCache;
pub use client::{AccountKind, Portal, TrafficClient};
pub use config::{ClientConfig, Platform};
pub use connectivity::{ConnectivityChecker, NetworkProbe, NetworkState, TcpProbe};
pub use error::{ApiError, ErrorCategory};
pub use fallback::{attempt_with_fallback, Served, Tier};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use http_client::HttpClient;
pub use services::{AdminService, AuthService, CitizenService, FineService, ListingCache};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{
    AccountType, ActivitySummary, AuthResponse, CitizenProfile, Credentials, DriverRecord, Fine, FineRequest, FineStatus,
    Listing, NewPoliceAccount, NewUserAccount, PoliceAccount, PoliceAccountUpdate, RegisterProfile, Session,
    Timeframe, UserAccount, UserAccountUpdate,
};
