//! # Elephant Party Pages
//!
//! Page logic for the Elephant Party public site and admin console, written
//! as reducers over [`elephant_core`] and driven by an
//! [`elephant_runtime::Store`].
//!
//! Each page (listing, purchase, dashboard, event editor, ticket desk, door,
//! downloads, login) is a feature with its own `State`, `Action` and
//! `Reducer`. Reducers only mutate state and describe effects; every backend
//! call goes through the [`Backend`](elephant_client::Backend) held by the
//! [`PageEnvironment`].
//!
//! ## Example
//!
//! ```no_run
//! use elephant_admin::features::public_events::{ListingAction, ListingReducer, ListingState};
//! use elephant_admin::reports::FsReportSink;
//! use elephant_admin::{render, PageEnvironment};
//! use elephant_client::{BackendClient, DEFAULT_API_URL};
//! use elephant_core::environment::SystemClock;
//! use elephant_runtime::Store;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = PageEnvironment::new(
//!     Arc::new(BackendClient::new(DEFAULT_API_URL)?),
//!     Arc::new(SystemClock),
//!     Arc::new(FsReportSink::new("reports")),
//! );
//! let store = Store::new(ListingState::default(), ListingReducer::new(), env);
//!
//! store.send(ListingAction::Load).await.wait().await;
//! println!("{}", store.state(render::listing).await);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pure helpers
//!
//! - [`listing`]: upcoming-first ordering, featured event and pagination
//! - [`roster`]: attendee search, grouping and door totals
//! - [`tickets`]: ticket search and column sorting
//! - [`ticket_form`]: buyer and attendee form state with validation
//! - [`field_errors`]: backend failures mapped onto form fields

pub mod config;
pub mod environment;
pub mod features;
pub mod field_errors;
pub mod listing;
pub mod page;
pub mod render;
pub mod reports;
pub mod roster;
pub mod ticket_form;
pub mod tickets;

pub use config::{Config, ConfigError};
pub use environment::PageEnvironment;
pub use field_errors::{Field, FieldErrors};
pub use page::{Loadable, PageError, Route};
