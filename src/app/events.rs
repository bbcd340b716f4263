//! Inbound transport events.
//!
//! A [`BrokerPort`](super::ports::BrokerPort) adapter translates whatever
//! its client library reports into these variants.  The supervisor feeds
//! each one through a single dispatch function; there are no callbacks
//! stored on the client.

/// Events produced by one broker message-processing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// A message arrived on a subscribed topic.
    Message { topic: String, payload: String },

    /// The broker acknowledged a subscription.
    Subscribed,

    /// A publish left the client.
    Published,

    /// The broker (or the client) closed the session.
    Disconnected,
}
