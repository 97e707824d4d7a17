// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usagemon Fetch
//!
//! HTTP plumbing shared by the usagemon source adapters.
//!
//! - [`http::HttpClient`] - `reqwest` wrapper with tracing and JSON decoding
//! - [`error::FetchError`] - transport, status and decoding failures
//!
//! A [`FetchError`] converts into a classified [`usagemon_core::ApiError`]:
//! 401/403 become authentication errors, 429 rate-limit errors, 404
//! not-found errors, transport failures network errors, and everything else
//! a generic API error.
//!
//! ## Example
//!
//! ```ignore
//! use usagemon_fetch::{HttpClient, build_url};
//!
//! let client = HttpClient::new();
//! let url = build_url("https://openrouter.ai/api/v1", "auth/key", [])?;
//! let body: serde_json::Value = client.get_json(&url, headers).await?;
//! ```

pub mod error;
pub mod http;

pub use error::{FetchError, HttpError};
pub use http::{DEFAULT_TIMEOUT_SECS, HttpClient, build_url, extract_error_message};

pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
