//! Link-layer adapter for hosted builds.
//!
//! There is no DHCP client to drive on a host: "lease maintenance" is
//! re-learning which local address routes toward the broker, at most once
//! per [`LEASE_CHECK`].  A soft reset forgets the cached address.
//!
//! [`HostLink::soft_reset`] cannot fail: it always returns `Ok(0)`.  The
//! supervisor's escalation to `Fatal::LinkResetFailed` on a non-zero code
//! or a [`LinkError`] is therefore only reachable through other
//! [`LinkPort`] implementations, such as a hardware Ethernet driver or
//! the recording mocks in the integration tests.

use core::net::Ipv4Addr;
use std::net::{IpAddr, UdpSocket};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::app::ports::LinkPort;
use crate::error::LinkError;

const LEASE_CHECK: Duration = Duration::from_secs(30);

pub struct HostLink {
    broker: (String, u16),
    address: Ipv4Addr,
    last_check: Option<Instant>,
}

impl HostLink {
    pub fn new(broker_host: &str, broker_port: u16) -> Self {
        Self {
            broker: (broker_host.to_owned(), broker_port),
            address: Ipv4Addr::UNSPECIFIED,
            last_check: None,
        }
    }

    fn resolve_local(&self) -> Result<Ipv4Addr, LinkError> {
        // Connecting a UDP socket sends nothing; it only selects a route.
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(|_| LinkError::Io)?;
        socket
            .connect((self.broker.0.as_str(), self.broker.1))
            .map_err(|_| LinkError::LeaseFailed)?;
        match socket.local_addr().map_err(|_| LinkError::Io)?.ip() {
            IpAddr::V4(v4) => Ok(v4),
            IpAddr::V6(_) => Err(LinkError::LeaseFailed),
        }
    }
}

impl LinkPort for HostLink {
    fn maintain_lease(&mut self) -> Result<(), LinkError> {
        if self.last_check.is_some_and(|t| t.elapsed() < LEASE_CHECK) {
            return Ok(());
        }
        self.last_check = Some(Instant::now());

        let address = self.resolve_local()?;
        if address != self.address {
            info!("link: address {}", address);
            self.address = address;
        }
        Ok(())
    }

    /// Always `Ok(0)`.
    fn soft_reset(&mut self) -> Result<i32, LinkError> {
        debug!("link: soft reset");
        self.address = Ipv4Addr::UNSPECIFIED;
        self.last_check = None;
        Ok(0)
    }

    fn ip_address(&self) -> Ipv4Addr {
        self.address
    }
}
