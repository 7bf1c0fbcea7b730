//! Remote sync client
//!
//! Wraps the REST calls against the hosted template table and the
//! reachability check that gates every remote operation.

pub mod client;
pub mod dto;
pub mod network;

pub use client::{table_endpoint, RemoteStore, SupabaseClient, CONFLICT_TARGET};
pub use dto::ServiceTemplateDto;
pub use network::{NetworkProbe, StaticProbe, TcpProbe};
