//! Message-oriented front end for an RFM69 driver.
//!
//! # Example
//!
//! ```ignore
//! let mut manager = Rfm69Manager::new(radio);
//! manager.initialize(&RadioConfig::default()).await?;
//!
//! let mut handler = |message: &Message<'_>| {
//!     info!("{}: {}={}", message.node_id, message.name, message.value);
//! };
//! manager.on_message(Some(&mut handler));
//!
//! loop {
//!     manager.poll().await?;
//!     if report_due {
//!         manager.send(manager.gateway_id(), "cpm", "18", 2, false).await?;
//!     }
//! }
//! ```

use crate::driver::Rfm69Driver;
use crate::message::{self, Message};
use crate::settings::{RadioConfig, MAX_DATA_LEN};

/// Errors returned by [`Rfm69Manager`].
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ManagerError<E> {
    /// The wrapped driver failed.
    Driver(E),
    /// The outgoing message does not fit in one packet.
    MessageTooLarge,
}

/// Receives every message [`Rfm69Manager::poll`] decodes.
pub trait MessageHandler {
    /// Called once per decoded message. `message` only lives for the call.
    fn on_message(&mut self, message: &Message<'_>);
}

impl<F> MessageHandler for F
where
    F: FnMut(&Message<'_>),
{
    fn on_message(&mut self, message: &Message<'_>) {
        self(message)
    }
}

/// Wraps an [`Rfm69Driver`] and exchanges `name:value` messages over it.
pub struct Rfm69Manager<'h, R> {
    driver: R,
    handler: Option<&'h mut dyn MessageHandler>,
    gateway_id: u8,
    send_packet_id: bool,
    receive_count: u32,
    send_count: u8,
}

impl<'h, R> Rfm69Manager<'h, R>
where
    R: Rfm69Driver,
{
    /// Creates a manager around `driver`. Call [`initialize`](Self::initialize)
    /// before using the radio.
    #[must_use]
    pub fn new(driver: R) -> Self {
        Rfm69Manager {
            driver,
            handler: None,
            gateway_id: 0,
            send_packet_id: false,
            receive_count: 0,
            send_count: 0,
        }
    }

    /// Brings the radio up and applies `config`.
    ///
    /// The encryption key is applied even if bring-up failed; the bring-up
    /// error is returned afterwards. Auto Transmission Control is enabled
    /// unless this node is the gateway, and high power mode on RFM69HW
    /// modules.
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::Driver` if the driver fails. A failed bring-up
    /// is reported after the remaining steps ran.
    pub async fn initialize(&mut self, config: &RadioConfig) -> Result<(), ManagerError<R::Error>> {
        let bring_up = self
            .driver
            .initialize(config.frequency, config.node_id, config.network_id)
            .await;

        self.driver
            .encrypt(config.encrypt_key.as_ref())
            .await
            .map_err(ManagerError::Driver)?;

        self.gateway_id = config.gateway_id;
        self.send_packet_id = config.send_packet_id;

        if !config.is_gateway() {
            self.driver
                .enable_auto_power(config.target_rssi)
                .await
                .map_err(ManagerError::Driver)?;
        }

        if self.driver.is_high_power() {
            self.driver
                .set_high_power()
                .await
                .map_err(ManagerError::Driver)?;
        }

        info!("[RADIO] Node: {}", config.node_id);
        info!("[RADIO] Network: {}", config.network_id);
        if config.is_gateway() {
            info!("[RADIO] This node is a gateway.");
        } else {
            info!("[RADIO] Gateway: {}", config.gateway_id);
            info!("[RADIO] Auto Transmission Control (ATC) enabled");
        }
        info!("[RADIO] Working at {} Mhz...", config.frequency.mhz());

        bring_up.map_err(|e| {
            error!("[RADIO] Initialization failed: {:?}", e);
            ManagerError::Driver(e)
        })
    }

    /// Registers the handler for decoded messages, replacing the previous one.
    ///
    /// With `None` messages are still decoded and counted, then dropped.
    pub fn on_message(&mut self, handler: Option<&'h mut dyn MessageHandler>) {
        self.handler = handler;
    }

    /// Handles at most one received packet.
    ///
    /// Acknowledges the packet if asked to, decodes it and hands the message
    /// to the handler. Returns `Ok(true)` if a message was decoded, `Ok(false)`
    /// if nothing was waiting or the payload was not a message.
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::Driver` if checking for a packet or sending the
    /// ACK fails.
    pub async fn poll(&mut self) -> Result<bool, ManagerError<R::Error>> {
        if !self.driver.receive_done().await.map_err(ManagerError::Driver)? {
            return Ok(false);
        }

        // Sending the ACK reuses the driver's packet state, read everything first.
        let sender_id = self.driver.sender_id();
        let rssi = self.driver.rssi();
        let buffer = heapless::Vec::<u8, MAX_DATA_LEN>::from_slice(self.driver.data()).ok();

        if self.driver.ack_requested() {
            self.driver.send_ack().await.map_err(ManagerError::Driver)?;
        }

        let Some(buffer) = buffer else {
            warn!("[RADIO] Dropping oversized packet from {}", sender_id);
            return Ok(false);
        };
        let Ok(payload) = core::str::from_utf8(&buffer) else {
            warn!("[RADIO] Dropping non-text packet from {}", sender_id);
            return Ok(false);
        };
        let Some(fields) = message::decode(payload) else {
            debug!("[RADIO] Dropping undelimited packet from {}", sender_id);
            return Ok(false);
        };

        self.receive_count = self.receive_count.wrapping_add(1);
        let message = Message {
            message_id: self.receive_count,
            packet_id: fields.packet_id,
            node_id: sender_id,
            name: fields.name,
            value: fields.value,
            rssi,
        };
        trace!(
            "[RADIO] Received #{} from {}: {}={} ({})",
            message.message_id,
            message.node_id,
            message.name,
            message.value,
            message.rssi
        );

        if let Some(handler) = self.handler.as_mut() {
            handler.on_message(&message);
        }

        Ok(true)
    }

    /// Sends `name:value` to `destination_id`.
    ///
    /// With `retries == 0` the packet is sent once, asking for an ACK if
    /// `request_ack` is set, and `Ok(true)` is returned as soon as the driver
    /// took it. Otherwise the driver retries up to `retries` times and the
    /// result tells whether an attempt was acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::MessageTooLarge` if the message does not fit in
    /// one packet, `ManagerError::Driver` if the driver fails.
    pub async fn send(
        &mut self,
        destination_id: u8,
        name: &str,
        value: &str,
        retries: u8,
        request_ack: bool,
    ) -> Result<bool, ManagerError<R::Error>> {
        let sequence = self
            .send_packet_id
            .then(|| message::next_sequence(self.send_count));
        let wire = message::encode(name, value, sequence).ok_or(ManagerError::MessageTooLarge)?;
        if let Some(sequence) = sequence {
            self.send_count = sequence;
        }

        let delivered = if retries > 0 {
            self.driver
                .send_with_retry(destination_id, wire.as_bytes(), retries)
                .await
                .map_err(ManagerError::Driver)?
        } else {
            self.driver
                .send(destination_id, wire.as_bytes(), request_ack)
                .await
                .map_err(ManagerError::Driver)?;
            true
        };

        if delivered {
            debug!("[RADIO] Sending: {} OK", wire.as_str());
        } else {
            warn!("[RADIO] Sending: {} KO", wire.as_str());
        }

        Ok(delivered)
    }

    /// Node that receives this node's reports, `0` on the gateway itself.
    #[must_use]
    pub fn gateway_id(&self) -> u8 {
        self.gateway_id
    }

    /// Returns whether this node was initialized as the gateway.
    #[must_use]
    pub fn is_gateway(&self) -> bool {
        self.gateway_id == crate::settings::GATEWAY_NODE_ID
    }

    /// Number of messages decoded so far.
    #[must_use]
    pub fn receive_count(&self) -> u32 {
        self.receive_count
    }

    /// Last sequence number sent, `0` before the first numbered message.
    #[must_use]
    pub fn send_count(&self) -> u8 {
        self.send_count
    }

    /// Borrows the wrapped driver.
    #[must_use]
    pub fn driver(&self) -> &R {
        &self.driver
    }

    /// Mutably borrows the wrapped driver.
    pub fn driver_mut(&mut self) -> &mut R {
        &mut self.driver
    }

    /// Consumes the manager and returns the driver.
    pub fn release(self) -> R {
        self.driver
    }
}
