//! Client-side data mapping for JSON REST APIs.
//!
//! Turns raw HTTP/JSON responses into typed, paginated data objects through
//! declarative [`mapping::Mapping`]s, and turns data objects back into wire
//! JSON for writes. Transport failures and unhandled HTTP statuses are
//! classified into [`Error`].

mod client;
pub mod config;
pub mod decode;
mod errors;
pub mod mapping;
mod query;
mod template;
pub mod transport;
pub mod types;

pub use self::client::{Client, RequestOptions};
pub use self::config::{ClientConfig, ConfigError};
pub use self::decode::{DecodeOptions, Decoded, Decoder};
pub use self::errors::Error;
pub use self::mapping::{Mapping, MappingBuilder, MappingError, MappingRegistry, ObjectKind};
pub use self::query::{
    sort_params, start_offset, ListParams, ListQuery, SortBy, SortDirection,
};
pub use self::transport::{HttpTransport, Method, RawResponse, Transport, TransportError};
