//! LDAP controls and extended operations for Rust.
//!
//! Typed request and response controls with BER and JSON codecs, a generic
//! [`Control`](controls::Control) for everything else, and extraction of
//! typed controls from responses and errors:
//!
//! ```rust
//! use ldap_controls::controls::{LdapControl, SimplePagedResultsControl};
//!
//! let control = SimplePagedResultsControl::new(500).to_control()?;
//! let controls = vec![control];
//! let paged = SimplePagedResultsControl::get(controls.as_slice())?;
//! assert_eq!(paged.map(|c| c.size()), Some(500));
//! # Ok::<(), ldap_controls::error::Error>(())
//! ```

pub use bytes;
pub use rasn_ldap;
pub use serde_json;

pub use extended::*;
pub use model::*;
pub use request::*;
pub use response::*;

pub(crate) mod json;

pub mod controls;
pub mod error;
pub mod extended;
pub mod filter;
pub mod model;
pub mod oid;
pub mod request;
pub mod response;
