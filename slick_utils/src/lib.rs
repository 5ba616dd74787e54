#![allow(missing_docs)]

pub mod cookie;

pub use cookie::CookieJar;
