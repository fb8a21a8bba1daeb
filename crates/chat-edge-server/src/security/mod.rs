pub mod client_identity;

pub use client_identity::{rate_limit_identifier, ClientIp};
