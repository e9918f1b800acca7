//! Outgoing request model and body transport for netkit.
//!
//! This crate connects multipart bodies from `netkit-core` to a transport:
//! - [`Request`] with case-insensitive [`Headers`] and a [`Body`] that may be
//!   a chained stream
//! - [`Request::set_form_data`] installing a form as the request body, and
//!   [`Request::set_file`] sending a single upload as the raw body
//! - [`BodyReader`] and [`pump_body`] for pulling bodies chunk by chunk
//!
//! # Example
//!
//! ```ignore
//! use netkit_core::{FormData, FormParameter, MultipartBodyBuilder, UploadFile};
//! use netkit_http::{BodyConfig, Method, Request, pump_body};
//!
//! let form = FormData::new(
//!     vec![FormParameter::new("caption", "sunset")],
//!     vec![UploadFile::from_path("photo", "/sdcard/DCIM/sunset.jpg")?],
//! );
//! let mut request = Request::new(Method::Post, "https://api.example.com/photos")
//!     .with_form_data(form, &MultipartBodyBuilder::new());
//! let sent = pump_body(request.take_body(), &mut connection, &BodyConfig::default())?;
//! ```

#![deny(unsafe_code)]

pub mod body;
mod request;

pub use body::{BodyConfig, BodyError, BodyReader, DEFAULT_CHUNK_SIZE, pump_body};
pub use request::{Body, CONTENT_LENGTH, CONTENT_TYPE, Headers, Method, Request};
