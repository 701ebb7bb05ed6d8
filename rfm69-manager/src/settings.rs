//! Node configuration.
//!
//! These structs replace build-time constants: a node builds one
//! [`RadioConfig`] (and a [`SensorConfig`] if it counts pulses) and hands it
//! to the manager at start-up. The `Default` impls describe a battery powered
//! Geiger counter node reporting to gateway 1 on 868 MHz.

/// Maximum payload length accepted by the RFM69 packet engine.
pub const MAX_DATA_LEN: usize = 61;

/// Length of the AES-128 key the radio encrypts with.
pub const ENCRYPT_KEY_LEN: usize = 16;

/// Node id reserved for the gateway role.
pub const GATEWAY_NODE_ID: u8 = 0;

/// Frequency band of the radio module.
///
/// Must match the module variant and the local regulations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrequencyBand {
    /// 315 MHz.
    Mhz315,
    /// 433 MHz.
    Mhz433,
    /// 868 MHz.
    Mhz868,
    /// 915 MHz.
    Mhz915,
}

impl FrequencyBand {
    /// Nominal carrier frequency in MHz.
    #[must_use]
    pub fn mhz(self) -> u16 {
        match self {
            FrequencyBand::Mhz315 => 315,
            FrequencyBand::Mhz433 => 433,
            FrequencyBand::Mhz868 => 868,
            FrequencyBand::Mhz915 => 915,
        }
    }
}

/// Configuration applied by [`Rfm69Manager::initialize`](crate::Rfm69Manager::initialize).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// Frequency band of the module.
    pub frequency: FrequencyBand,
    /// This node's id, unique within the network.
    pub node_id: u8,
    /// Network id. Only nodes sharing it see each other.
    pub network_id: u8,
    /// Node that receives this node's reports. `0` means this node is the gateway.
    pub gateway_id: u8,
    /// Key shared by all nodes of the network. `None` disables encryption.
    pub encrypt_key: Option<[u8; ENCRYPT_KEY_LEN]>,
    /// RSSI in dBm that Auto Transmission Control aims for at the gateway.
    pub target_rssi: i16,
    /// Append a `:<sequence>` suffix to every outgoing message.
    pub send_packet_id: bool,
}

impl RadioConfig {
    /// Returns `true` if this configuration describes the gateway.
    #[must_use]
    pub fn is_gateway(&self) -> bool {
        self.gateway_id == GATEWAY_NODE_ID
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency: FrequencyBand::Mhz868,
            node_id: 13,
            network_id: 164,
            gateway_id: 1,
            encrypt_key: Some(*b"fibonacci0123456"),
            target_rssi: -75,
            send_packet_id: true,
        }
    }
}

/// Timing and conversion settings of the Geiger counter node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// Length of one counting interval in milliseconds.
    pub update_interval_ms: u32,
    /// Settling time after a pulse edge, in milliseconds.
    pub debounce_ms: u32,
    /// How long the LED stays on after a report, in milliseconds.
    pub notification_ms: u32,
    /// Conversion factor from CPM to µSv/h (SBM-20 tube).
    pub cpm_to_usvh: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 6_000,
            debounce_ms: 5,
            notification_ms: 5,
            cpm_to_usvh: 0.0057,
        }
    }
}
