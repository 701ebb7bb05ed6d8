//! Geiger counter node.
//!
//! The tube pulls its output low for every particle. [`PulseCounter`] counts
//! those pulses, the application moves the count into a [`CountRing`] once
//! per update interval, and every time the ring wraps the resulting
//! [`Reading`] is sent to the gateway with [`report`]. [`Notifier`] flashes
//! an LED after each report.

use core::fmt::Write;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::{delay::DelayNs, digital::Wait};
use heapless::String;

use crate::driver::Rfm69Driver;
use crate::manager::{ManagerError, Rfm69Manager};
use crate::settings::SensorConfig;

/// Number of update intervals covered by one reading.
pub const RING_SIZE: usize = 10;

/// Metric name of the counts-per-minute report.
pub const CPM_NAME: &str = "cpm";

/// Metric name of the dose-rate report.
pub const USVH_NAME: &str = "usvh";

const MS_PER_MINUTE: u64 = 60_000;

/// Errors from the sensor side of the node.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeigerError {
    /// Reading or driving a GPIO failed.
    Pin,
}

/// One report: counts per minute and the matching dose rate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub cpm: u32,
    pub usvh: f32,
}

impl Reading {
    #[must_use]
    pub fn from_cpm(cpm: u32, cpm_to_usvh: f32) -> Self {
        Reading {
            cpm,
            usvh: cpm as f32 * cpm_to_usvh,
        }
    }
}

/// Counts tube pulses on a GPIO.
pub struct PulseCounter<PIN, D> {
    pin: PIN,
    delay: D,
    debounce_ms: u32,
    pending: u32,
}

impl<PIN, D> PulseCounter<PIN, D>
where
    PIN: Wait,
    D: DelayNs,
{
    #[must_use]
    pub fn new(pin: PIN, delay: D, config: &SensorConfig) -> Self {
        PulseCounter {
            pin,
            delay,
            debounce_ms: config.debounce_ms,
            pending: 0,
        }
    }

    /// Waits for one pulse and counts it.
    ///
    /// Returns once the line is high again after the debounce interval.
    pub async fn wait_for_pulse(&mut self) -> Result<(), GeigerError> {
        self.pin.wait_for_low().await.map_err(|_| GeigerError::Pin)?;
        self.pending = self.pending.saturating_add(1);
        self.delay.delay_ms(self.debounce_ms).await;
        self.pin
            .wait_for_high()
            .await
            .map_err(|_| GeigerError::Pin)?;
        Ok(())
    }

    /// Pulses counted since the last [`take`](Self::take).
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Returns the pending count and restarts counting.
    pub fn take(&mut self) -> u32 {
        core::mem::take(&mut self.pending)
    }
}

/// Ring of per-interval pulse counts.
pub struct CountRing<const N: usize = RING_SIZE> {
    counts: [u32; N],
    index: usize,
    update_interval_ms: u32,
    cpm_to_usvh: f32,
}

impl<const N: usize> CountRing<N> {
    #[must_use]
    pub fn new(config: &SensorConfig) -> Self {
        CountRing {
            counts: [0; N],
            index: 0,
            update_interval_ms: config.update_interval_ms,
            cpm_to_usvh: config.cpm_to_usvh,
        }
    }

    /// Stores the count of the interval that just ended.
    ///
    /// Returns a reading every `N` pushes, when the ring wraps.
    pub fn push(&mut self, count: u32) -> Option<Reading> {
        let slot = self.counts.get_mut(self.index)?;
        *slot = count;
        self.index += 1;
        if self.index < N {
            return None;
        }

        self.index = 0;
        let reading = self.reading();
        debug!("[GEIGER] {} cpm, {} uSv/h", reading.cpm, reading.usvh);
        Some(reading)
    }

    /// Counts per minute over the whole ring, scaled to one minute.
    #[must_use]
    pub fn cpm(&self) -> u32 {
        let total: u64 = self.counts.iter().map(|&count| u64::from(count)).sum();
        let window_ms = N as u64 * u64::from(self.update_interval_ms);
        let cpm = (total * MS_PER_MINUTE).checked_div(window_ms).unwrap_or(0);
        u32::try_from(cpm).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn reading(&self) -> Reading {
        Reading::from_cpm(self.cpm(), self.cpm_to_usvh)
    }
}

/// Flashes an LED to show a report went out.
pub struct Notifier<LED, D> {
    led: LED,
    delay: D,
    notification_ms: u32,
}

impl<LED, D> Notifier<LED, D>
where
    LED: OutputPin,
    D: DelayNs,
{
    #[must_use]
    pub fn new(led: LED, delay: D, config: &SensorConfig) -> Self {
        Notifier {
            led,
            delay,
            notification_ms: config.notification_ms,
        }
    }

    pub async fn flash(&mut self) -> Result<(), GeigerError> {
        self.led.set_high().map_err(|_| GeigerError::Pin)?;
        self.delay.delay_ms(self.notification_ms).await;
        self.led.set_low().map_err(|_| GeigerError::Pin)?;
        Ok(())
    }
}

/// Sends `reading` to the manager's gateway as `cpm` and `usvh` messages.
///
/// Returns `Ok(true)` only if both messages were delivered.
///
/// # Errors
///
/// Propagates the errors of [`Rfm69Manager::send`].
pub async fn report<R>(
    manager: &mut Rfm69Manager<'_, R>,
    reading: &Reading,
    retries: u8,
) -> Result<bool, ManagerError<R::Error>>
where
    R: Rfm69Driver,
{
    let gateway_id = manager.gateway_id();
    let mut value: String<16> = String::new();

    write!(value, "{}", reading.cpm).map_err(|_| ManagerError::MessageTooLarge)?;
    let cpm_delivered = manager
        .send(gateway_id, CPM_NAME, &value, retries, false)
        .await?;

    value.clear();
    write!(value, "{:.4}", reading.usvh).map_err(|_| ManagerError::MessageTooLarge)?;
    let usvh_delivered = manager
        .send(gateway_id, USVH_NAME, &value, retries, false)
        .await?;

    Ok(cpm_delivered && usvh_delivered)
}
