#![allow(missing_docs)]
//! Form helpers for slick pages.
//!
//! [`field`] turns form controls into a JSON object, [`input`] keeps number and email
//! inputs tidy while the user types, and [`FormHandler`] wires both to a live form.

pub mod field;
mod handler;
pub mod input;

pub use field::{Control, Field, Transform, serialize};
pub use handler::{FormHandler, SubmitHandler};
pub use input::{NumberRules, normalize_email};
