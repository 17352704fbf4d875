//! SkyDisk Links - ephemeral, token-addressed access to single files.
//!
//! A short link maps a 10-character token to a file entry, optionally with an
//! expiry and an access code. Direct links prefer a backend presigned URL and
//! fall back to a short link or the authenticated download endpoint.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod direct;
pub mod issuer;
pub mod token;

pub use direct::DirectLink;
pub use issuer::{LinkIssuer, ResolvedLink};
pub use token::{TOKEN_LENGTH, generate_token};
