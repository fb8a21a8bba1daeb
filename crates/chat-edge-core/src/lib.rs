//! # Chat Edge Core
//!
//! Domain types, ports, and the two stateful services of the edge:
//! the fixed-window [`RateLimiter`] and the bounded [`ConversationStore`].
//! All mutable state lives behind the [`KeyValueStore`] and
//! [`MessageRepository`] ports.

pub mod clock;
pub mod domain;
pub mod error;
pub mod outcome;
pub mod ports;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use error::DomainError;
pub use outcome::Outcome;
pub use ports::{KeyValueStore, MessageRepository};
pub use services::{ConversationStore, RateLimiter};
