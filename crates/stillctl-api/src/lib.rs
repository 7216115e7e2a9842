// stillctl-api: Async Rust client for still/brew controller firmware

pub mod client;
pub mod error;
pub mod models;
pub mod payload;
pub mod transport;

pub use client::DeviceClient;
pub use error::Error;
pub use models::{Ack, DataResponse, WireConfig};
pub use payload::{FieldValue, FormPayload, SubmitEncoding};
pub use transport::TransportConfig;
