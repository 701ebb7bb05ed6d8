//! Capabilities the manager needs from the wrapped RFM69 driver.
//!
//! Modulation, encryption, Auto Transmission Control and the ACK/retry timing
//! all live behind this trait. The manager never touches registers.

use core::fmt::Debug;

use crate::settings::{FrequencyBand, ENCRYPT_KEY_LEN};

/// An RFM69 driver with Auto Transmission Control.
///
/// The receive side follows the packet-engine model: [`receive_done`]
/// reports whether a complete packet is waiting, after which [`sender_id`],
/// [`rssi`], [`data`] and [`ack_requested`] describe that packet until the
/// driver sends or receives again.
///
/// [`receive_done`]: Rfm69Driver::receive_done
/// [`sender_id`]: Rfm69Driver::sender_id
/// [`rssi`]: Rfm69Driver::rssi
/// [`data`]: Rfm69Driver::data
/// [`ack_requested`]: Rfm69Driver::ack_requested
pub trait Rfm69Driver {
    #[cfg(feature = "defmt")]
    type Error: Debug + defmt::Format;

    #[cfg(not(feature = "defmt"))]
    type Error: Debug;

    /// Brings the module up on `frequency` with the given addressing.
    async fn initialize(
        &mut self,
        frequency: FrequencyBand,
        node_id: u8,
        network_id: u8,
    ) -> Result<(), Self::Error>;

    /// Sets the AES key, or disables encryption when `key` is `None`.
    async fn encrypt(&mut self, key: Option<&[u8; ENCRYPT_KEY_LEN]>) -> Result<(), Self::Error>;

    /// Enables transmit power adjustment towards `target_rssi` dBm at the receiver.
    async fn enable_auto_power(&mut self, target_rssi: i16) -> Result<(), Self::Error>;

    /// Switches the PA to high power mode (RFM69HW/HCW only).
    async fn set_high_power(&mut self) -> Result<(), Self::Error>;

    /// Whether the module is the high power variant.
    fn is_high_power(&self) -> bool;

    /// Checks, without waiting, whether a complete packet has been received.
    async fn receive_done(&mut self) -> Result<bool, Self::Error>;

    /// Node id of the last received packet's sender.
    fn sender_id(&self) -> u8;

    /// RSSI of the last received packet.
    fn rssi(&self) -> i16;

    /// Payload of the last received packet.
    fn data(&self) -> &[u8];

    /// Whether the sender of the last received packet asked for an ACK.
    fn ack_requested(&self) -> bool;

    /// Acknowledges the last received packet.
    async fn send_ack(&mut self) -> Result<(), Self::Error>;

    /// Transmits `payload` once without waiting for an ACK.
    async fn send(
        &mut self,
        destination_id: u8,
        payload: &[u8],
        request_ack: bool,
    ) -> Result<(), Self::Error>;

    /// Transmits `payload` up to `retries` times until it is acknowledged.
    ///
    /// Returns `Ok(false)` when no attempt was acknowledged.
    async fn send_with_retry(
        &mut self,
        destination_id: u8,
        payload: &[u8],
        retries: u8,
    ) -> Result<bool, Self::Error>;
}
