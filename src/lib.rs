// src/lib.rs
pub mod banner;
pub mod client;
pub mod commands;
pub mod config;
pub mod errors;
pub mod models;
pub mod subscription;
pub mod transport;

pub use client::GatewayClient;
pub use commands::{Command, CommandRequest};
pub use config::GatewayConfig;
pub use errors::{GatewayError, Result};
pub use models::{CommandResponse, GraphQLRequest, Outcome};
pub use subscription::{RunCommandParams, RunCommandSubscription, SubscriptionState};
pub use transport::{SubscriptionTransport, WsTransport};
