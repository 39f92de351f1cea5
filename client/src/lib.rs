//! # Elephant Party Backend Client
//!
//! Rust client library for the Elephant Party ticketing backend: public event
//! listings, ticket purchases, and the admin routes used to run a party
//! (event editing, ticket desk, door check-in, walk-ins, PDF reports).
//!
//! ## Example
//!
//! ```no_run
//! use elephant_client::{BackendClient, Credentials, DEFAULT_API_URL};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BackendClient::new(DEFAULT_API_URL)?;
//!
//!     // Public routes need no session
//!     let events = client.public_events().await?;
//!     println!("{} events", events.len());
//!
//!     // Admin routes ride on the session cookie set by login
//!     client
//!         .login(&Credentials {
//!             username: "admin".to_string(),
//!             password: "secret".to_string(),
//!         })
//!         .await?;
//!     let tickets = client.tickets().await?;
//!     println!("{} purchases", tickets.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Cookie-based admin session
//! - Multipart uploads for payslips and posters
//! - Lenient decoding of decimal strings and timestamp dates
//! - Uniform [`ApiError`] with the backend's message, code and field
//! - [`Backend`] trait seam for driving page logic with test doubles

pub mod backend;
pub mod client;
pub mod error;
pub mod forms;
pub mod types;

// Re-export main types for convenience
pub use backend::{Backend, BackendFuture};
pub use client::{BackendClient, DEFAULT_API_URL};
pub use error::ApiError;
pub use forms::{Credentials, FormFields, PurchaseRequest, TicketSubmission, Upload};
pub use types::{
    Attendee, AttendeeId, Event, EventDraft, EventId, PageContent, PaymentType, ReportKind,
    TicketId, TicketPurchase, WalkInAdjustment, WalkInCount,
};
