// src/transport/mod.rs

use futures::stream::BoxStream;
use serde_json::Value;

use crate::errors::Result;
use crate::models::GraphQLRequest;

pub mod ws;

pub use ws::WsTransport;

/// Stream of GraphQL execution results (`{data, errors}`) pushed by the server.
pub type EventStream = BoxStream<'static, Result<Value>>;

/// A push transport able to run a GraphQL subscription.
///
/// Dropping the returned stream ends the subscription.
pub trait SubscriptionTransport: Send + Sync {
    /// Opens a subscription for `request` and returns its event stream.
    fn subscribe(
        &self,
        request: GraphQLRequest,
    ) -> impl std::future::Future<Output = Result<EventStream>> + Send;
}
