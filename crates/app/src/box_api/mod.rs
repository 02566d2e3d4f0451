//! Box content API client
//!
//! Implements [`RemoteClient`](common::remote::RemoteClient) against the Box
//! v2.0 REST API using a bearer access token. Every call maps onto a single
//! HTTP request (listings page through `folders/{id}/items`); nothing is
//! retried here.

mod client;
mod error;
mod types;

pub use client::BoxApiClient;
pub use error::ApiError;
