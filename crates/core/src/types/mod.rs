//! Core types for Groenmarkt.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod order_number;
pub mod postcode;
pub mod vat;

pub use email::{Email, EmailError};
pub use id::*;
pub use order_number::{OrderNumber, OrderNumberError};
pub use postcode::{Postcode, PostcodeError};
pub use vat::{STANDARD_VAT_RATE, price_excl_vat, vat_amount};
