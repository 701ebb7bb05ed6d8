//! Scripted [`Rfm69Driver`] that records every call.

use std::collections::VecDeque;

use crate::driver::Rfm69Driver;
use crate::settings::{FrequencyBand, ENCRYPT_KEY_LEN};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FakeError;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize(FrequencyBand, u8, u8),
    Encrypt(Option<[u8; ENCRYPT_KEY_LEN]>),
    EnableAutoPower(i16),
    SetHighPower,
    ReceiveDone,
    SendAck,
    Send(u8, Vec<u8>, bool),
    SendWithRetry(u8, Vec<u8>, u8),
}

#[derive(Debug, Clone)]
pub struct Packet {
    sender_id: u8,
    rssi: i16,
    data: Vec<u8>,
    ack_requested: bool,
}

impl Packet {
    pub fn new(sender_id: u8, rssi: i16, data: &[u8]) -> Self {
        Packet {
            sender_id,
            rssi,
            data: data.to_vec(),
            ack_requested: false,
        }
    }

    pub fn with_ack_request(mut self) -> Self {
        self.ack_requested = true;
        self
    }
}

pub struct FakeRadio {
    pub calls: Vec<Call>,
    pub high_power: bool,
    pub fail_initialize: bool,
    pub fail_send: bool,
    /// Whether `send_with_retry` gets an ACK.
    pub acknowledge: bool,
    /// Overwrite the received packet when an ACK goes out.
    pub clobber_on_ack: bool,
    inbox: VecDeque<Packet>,
    current: Option<Packet>,
}

impl FakeRadio {
    pub fn new() -> Self {
        FakeRadio {
            calls: Vec::new(),
            high_power: false,
            fail_initialize: false,
            fail_send: false,
            acknowledge: true,
            clobber_on_ack: false,
            inbox: VecDeque::new(),
            current: None,
        }
    }

    pub fn queue(&mut self, packet: Packet) {
        self.inbox.push_back(packet);
    }

    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Send(_, payload, _) | Call::SendWithRetry(_, payload, _) => {
                    Some(payload.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn check_send(&self) -> Result<(), FakeError> {
        if self.fail_send {
            Err(FakeError)
        } else {
            Ok(())
        }
    }
}

impl Rfm69Driver for FakeRadio {
    type Error = FakeError;

    async fn initialize(
        &mut self,
        frequency: FrequencyBand,
        node_id: u8,
        network_id: u8,
    ) -> Result<(), FakeError> {
        self.calls
            .push(Call::Initialize(frequency, node_id, network_id));
        if self.fail_initialize {
            Err(FakeError)
        } else {
            Ok(())
        }
    }

    async fn encrypt(&mut self, key: Option<&[u8; ENCRYPT_KEY_LEN]>) -> Result<(), FakeError> {
        self.calls.push(Call::Encrypt(key.copied()));
        Ok(())
    }

    async fn enable_auto_power(&mut self, target_rssi: i16) -> Result<(), FakeError> {
        self.calls.push(Call::EnableAutoPower(target_rssi));
        Ok(())
    }

    async fn set_high_power(&mut self) -> Result<(), FakeError> {
        self.calls.push(Call::SetHighPower);
        Ok(())
    }

    fn is_high_power(&self) -> bool {
        self.high_power
    }

    async fn receive_done(&mut self) -> Result<bool, FakeError> {
        self.calls.push(Call::ReceiveDone);
        self.current = self.inbox.pop_front();
        Ok(self.current.is_some())
    }

    fn sender_id(&self) -> u8 {
        self.current.as_ref().map_or(0, |packet| packet.sender_id)
    }

    fn rssi(&self) -> i16 {
        self.current.as_ref().map_or(0, |packet| packet.rssi)
    }

    fn data(&self) -> &[u8] {
        self.current
            .as_ref()
            .map_or(&[][..], |packet| packet.data.as_slice())
    }

    fn ack_requested(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|packet| packet.ack_requested)
    }

    async fn send_ack(&mut self) -> Result<(), FakeError> {
        self.calls.push(Call::SendAck);
        self.check_send()?;
        if self.clobber_on_ack {
            self.current = Some(Packet::new(0, 0, b"ack"));
        }
        Ok(())
    }

    async fn send(
        &mut self,
        destination_id: u8,
        payload: &[u8],
        request_ack: bool,
    ) -> Result<(), FakeError> {
        self.check_send()?;
        self.calls
            .push(Call::Send(destination_id, payload.to_vec(), request_ack));
        Ok(())
    }

    async fn send_with_retry(
        &mut self,
        destination_id: u8,
        payload: &[u8],
        retries: u8,
    ) -> Result<bool, FakeError> {
        self.check_send()?;
        self.calls
            .push(Call::SendWithRetry(destination_id, payload.to_vec(), retries));
        Ok(self.acknowledge)
    }
}
