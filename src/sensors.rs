use crate::error::SensorError;
use crate::timer::Millis;

/// Which probe a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Sensor1,
    Sensor2,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Sensor1, Channel::Sensor2];

    pub fn label(self) -> &'static str {
        match self {
            Channel::Sensor1 => "Sensor1",
            Channel::Sensor2 => "Sensor2",
        }
    }
}

/// One temperature sample in Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub channel: Channel,
    pub value: f32,
    pub taken_at: Millis,
}

impl Reading {
    pub fn new(channel: Channel, value: f32, taken_at: Millis) -> Reading {
        Self {
            channel,
            value,
            taken_at,
        }
    }

    /// True when this reading is below `threshold`.
    pub fn is_out_of_spec(&self, threshold: f32) -> bool {
        self.value < threshold
    }
}

/// The latest reading from each probe.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingPair {
    pub first: Reading,
    pub second: Reading,
}

impl ReadingPair {
    pub fn new(first: f32, second: f32, taken_at: Millis) -> ReadingPair {
        Self {
            first: Reading::new(Channel::Sensor1, first, taken_at),
            second: Reading::new(Channel::Sensor2, second, taken_at),
        }
    }

    /// Both probes at `value`. Used before the first successful poll and as
    /// the payload of informational notifications.
    pub fn uniform(value: f32, taken_at: Millis) -> ReadingPair {
        Self::new(value, value, taken_at)
    }

    pub fn get(&self, channel: Channel) -> &Reading {
        match channel {
            Channel::Sensor1 => &self.first,
            Channel::Sensor2 => &self.second,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> &mut Reading {
        match channel {
            Channel::Sensor1 => &mut self.first,
            Channel::Sensor2 => &mut self.second,
        }
    }

    /// True if either probe is below `threshold`.
    pub fn any_out_of_spec(&self, threshold: f32) -> bool {
        self.first.is_out_of_spec(threshold) || self.second.is_out_of_spec(threshold)
    }
}

/// Anything that can produce a fresh reading for a probe on demand.
pub trait SensorSource {
    fn poll(&mut self, channel: Channel, now: Millis) -> Result<Reading, SensorError>;
}

/// Polls both probes into `latest`. A probe that fails keeps its previous
/// value, so a dead probe never shows up as a sentinel temperature.
/// Returns the number of probes that updated.
pub fn refresh<S: SensorSource>(source: &mut S, latest: &mut ReadingPair, now: Millis) -> usize {
    let mut updated = 0;
    for channel in Channel::ALL {
        match source.poll(channel, now) {
            Ok(reading) => {
                *latest.get_mut(channel) = Reading { channel, ..reading };
                updated += 1;
            }
            Err(e) => {
                warn!("{} read failed: {}", channel, e);
            }
        }
    }
    updated
}

/// Converts a Celsius value from a probe driver to Fahrenheit
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * (9. / 5.) + 32.
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        first: Result<f32, SensorError>,
        second: Result<f32, SensorError>,
    }

    impl SensorSource for Scripted {
        fn poll(&mut self, channel: Channel, now: Millis) -> Result<Reading, SensorError> {
            let value = match channel {
                Channel::Sensor1 => self.first,
                Channel::Sensor2 => self.second,
            }?;
            Ok(Reading::new(channel, value, now))
        }
    }

    #[test]
    fn either_channel_below_threshold_is_out_of_spec() {
        assert!(ReadingPair::new(-1.0, 50.0, 0).any_out_of_spec(0.0));
        assert!(ReadingPair::new(50.0, -1.0, 0).any_out_of_spec(0.0));
        assert!(!ReadingPair::new(0.0, 50.0, 0).any_out_of_spec(0.0));
    }

    #[test]
    fn failed_probe_keeps_previous_value() {
        let mut latest = ReadingPair::new(10.0, 20.0, 0);
        let mut source = Scripted {
            first: Ok(11.0),
            second: Err(SensorError::Bus),
        };

        assert_eq!(refresh(&mut source, &mut latest, 1000), 1);
        assert_eq!(latest.first.value, 11.0);
        assert_eq!(latest.first.taken_at, 1000);
        assert_eq!(latest.second.value, 20.0);
        assert_eq!(latest.second.taken_at, 0);
    }

    #[test]
    fn freezing_point_converts() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 1e-3);
    }
}
