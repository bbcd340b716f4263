//! MQTT broker adapter over the `rumqttc` synchronous client.
//!
//! Every [`connect`](BrokerPort::connect) builds a fresh client/connection
//! pair and drives it until CONNACK.  After that, [`poll`](BrokerPort::poll)
//! runs one bounded `recv_timeout` step and translates the rumqttc event
//! into a [`BrokerEvent`].  A connection error leaves the session in place
//! so the supervisor can still attempt a graceful disconnect on it; that
//! attempt fails when the event loop cannot deliver the DISCONNECT.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rumqttc::{
    Client, ClientError, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions,
    Outgoing, Packet, QoS, RecvTimeoutError,
};

use crate::app::events::BrokerEvent;
use crate::app::ports::BrokerPort;
use crate::config::DeviceConfig;
use crate::error::TransportError;

/// Request channel depth between the client handle and its event loop.
const REQUEST_CAPACITY: usize = 64;

struct Session {
    client: Client,
    connection: Connection,
}

pub struct MqttBroker {
    options: MqttOptions,
    connect_timeout: Duration,
    session: Option<Session>,
}

impl MqttBroker {
    pub fn new(config: &DeviceConfig) -> Self {
        let mut options = MqttOptions::new(
            config.client_id(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(60));
        options.set_clean_session(true);
        if let Some((user, pass)) = config.credentials() {
            options.set_credentials(user, pass);
        }
        info!(
            "mqtt: broker {}:{} as '{}' (auth: {})",
            config.broker_host,
            config.broker_port,
            config.client_id(),
            config.credentials().is_some()
        );
        Self {
            options,
            connect_timeout: config.timing.connect_timeout(),
            session: None,
        }
    }

    fn session(&mut self) -> Result<&mut Session, TransportError> {
        self.session.as_mut().ok_or(TransportError::NotConnected)
    }
}

fn connect_error(e: &ConnectionError) -> TransportError {
    match e {
        ConnectionError::ConnectionRefused(code) => {
            warn!("mqtt: broker refused: {:?}", code);
            TransportError::Refused
        }
        other => {
            warn!("mqtt: {}", other);
            TransportError::ConnectFailed
        }
    }
}

fn request_error(e: &ClientError) -> TransportError {
    debug!("mqtt: {}", e);
    TransportError::RequestRejected
}

impl BrokerPort for MqttBroker {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.session = None;
        let (client, mut connection) = Client::new(self.options.clone(), REQUEST_CAPACITY);
        let deadline = Instant::now() + self.connect_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout);
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        warn!("mqtt: CONNACK {:?}", ack.code);
                        return Err(TransportError::Refused);
                    }
                    self.session = Some(Session { client, connection });
                    return Ok(());
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(connect_error(&e)),
                Err(RecvTimeoutError::Timeout) => return Err(TransportError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::ConnectFailed),
            }
        }
    }

    /// Queue a DISCONNECT and drive the event loop until it has gone out.
    ///
    /// A dead socket surfaces here as [`TransportError::ConnectionLost`] so
    /// the supervisor falls through to a link reset.
    fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut session = self.session.take().ok_or(TransportError::NotConnected)?;
        session
            .client
            .try_disconnect()
            .map_err(|e| request_error(&e))?;
        let deadline = Instant::now() + self.connect_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("mqtt: DISCONNECT not sent within {:?}", self.connect_timeout);
                return Err(TransportError::ConnectionLost);
            }
            match session.connection.recv_timeout(remaining) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) => return Ok(()),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!("mqtt: disconnect: {}", e);
                    return Err(TransportError::ConnectionLost);
                }
                Err(_) => return Err(TransportError::ConnectionLost),
            }
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.session()?
            .client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| request_error(&e))
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        self.session()?
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|e| request_error(&e))
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<BrokerEvent>, TransportError> {
        let session = self.session()?;
        match session.connection.recv_timeout(timeout) {
            Ok(Ok(Event::Incoming(Packet::Publish(p)))) => Ok(Some(BrokerEvent::Message {
                topic: p.topic,
                payload: String::from_utf8_lossy(&p.payload).into_owned(),
            })),
            Ok(Ok(Event::Incoming(Packet::SubAck(_)))) => Ok(Some(BrokerEvent::Subscribed)),
            Ok(Ok(Event::Incoming(Packet::Disconnect))) => Ok(Some(BrokerEvent::Disconnected)),
            Ok(Ok(Event::Outgoing(Outgoing::Publish(_)))) => Ok(Some(BrokerEvent::Published)),
            Ok(Ok(_)) => Ok(None),
            Ok(Err(e)) => {
                warn!("mqtt: {}", e);
                Err(TransportError::ConnectionLost)
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::ConnectionLost),
        }
    }
}
