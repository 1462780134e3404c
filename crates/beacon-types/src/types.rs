//! Core types for logger beacon sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Minimum number of bytes required to decode a [`SensorSample`].
///
/// Four two-byte fields followed by the 32-bit device clock.
pub const MIN_FRAME_BYTES: usize = 12;

/// Byte offset of the little-endian device clock word.
pub const TIMESTAMP_OFFSET: usize = 8;

/// One decoded sample from a beacon notification payload.
///
/// The byte layout is:
/// - bytes 0-1: Temperature (`hi + lo / 256`)
/// - bytes 2-3: Humidity (`hi + lo / 256`)
/// - bytes 4-5: Illuminance (`hi * 256 + lo`, no fractional part)
/// - bytes 6-7: Battery voltage (`hi + lo / 256`)
/// - bytes 8-11: Device clock in Unix seconds (u32 LE)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorSample {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity percentage.
    pub humidity: f32,
    /// Illuminance in lux.
    pub illuminance: u16,
    /// Battery voltage in volts.
    pub battery_voltage: f32,
    /// Device clock reading in Unix seconds.
    pub timestamp: u32,
}

/// Combine a big-endian byte pair into an 8.8 fixed-point value.
fn fixed_8_8(hi: u8, lo: u8) -> f32 {
    (f32::from(hi) * 256.0 + f32::from(lo)) / 256.0
}

impl SensorSample {
    /// Decode a `SensorSample` from a raw notification payload.
    ///
    /// Bytes past [`MIN_FRAME_BYTES`] are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InsufficientBytes`] if `data` contains fewer than
    /// [`MIN_FRAME_BYTES`] (12) bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use beacon_types::SensorSample;
    ///
    /// let bytes = [0x01, 0x80, 0x02, 0x40, 0x03, 0x00, 0x0C, 0x80, 0, 0, 0, 0];
    /// let sample = SensorSample::from_bytes(&bytes).unwrap();
    /// assert_eq!(sample.temperature, 1.5);
    /// assert_eq!(sample.illuminance, 768);
    /// ```
    #[must_use = "decoding returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        use bytes::Buf;

        if data.len() < MIN_FRAME_BYTES {
            return Err(ParseError::InsufficientBytes {
                expected: MIN_FRAME_BYTES,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let temperature = fixed_8_8(buf.get_u8(), buf.get_u8());
        let humidity = fixed_8_8(buf.get_u8(), buf.get_u8());
        let illuminance = buf.get_u16();
        let battery_voltage = fixed_8_8(buf.get_u8(), buf.get_u8());
        let timestamp = buf.get_u32_le();

        Ok(SensorSample {
            temperature,
            humidity,
            illuminance,
            battery_voltage,
            timestamp,
        })
    }

    /// The device clock as a UTC date-time.
    #[must_use]
    pub fn device_time(&self) -> time::OffsetDateTime {
        // Every u32 is inside the representable range.
        time::OffsetDateTime::from_unix_timestamp(i64::from(self.timestamp))
            .unwrap_or(time::OffsetDateTime::UNIX_EPOCH)
    }
}

/// A decoded sample together with the identity of the beacon that sent it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorFrame {
    /// Advertised or connected device name.
    pub device_name: String,
    /// Application-assigned name distinguishing same-named devices.
    pub unique_name: String,
    /// The decoded sensor values.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub sample: SensorSample,
}

impl SensorFrame {
    /// Decode a payload received from the named device.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InsufficientBytes`] for payloads shorter than
    /// [`MIN_FRAME_BYTES`].
    pub fn decode(
        device_name: impl Into<String>,
        unique_name: impl Into<String>,
        data: &[u8],
    ) -> Result<Self, ParseError> {
        Ok(Self {
            device_name: device_name.into(),
            unique_name: unique_name.into(),
            sample: SensorSample::from_bytes(data)?,
        })
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(&self) -> f32 {
        self.sample.temperature
    }

    /// Relative humidity percentage.
    pub fn humidity(&self) -> f32 {
        self.sample.humidity
    }

    /// Illuminance in lux.
    pub fn illuminance(&self) -> u16 {
        self.sample.illuminance
    }

    /// Battery voltage in volts.
    pub fn battery_voltage(&self) -> f32 {
        self.sample.battery_voltage
    }

    /// Device clock in Unix seconds.
    pub fn timestamp(&self) -> u32 {
        self.sample.timestamp
    }
}

impl fmt::Display for SensorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): T={} H={} L={} B={} @{}",
            self.device_name,
            self.unique_name,
            self.sample.temperature,
            self.sample.humidity,
            self.sample.illuminance,
            self.sample.battery_voltage,
            self.sample.timestamp
        )
    }
}

/// Code points for bytes 0x80..=0x9F in windows-1252.
///
/// The five bytes the code page leaves undefined map to the C1 control of
/// the same value.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Decode an advertisement payload as windows-1252 text.
///
/// This is what a browser's `ascii` text decoder produces. Bytes outside
/// 0x80..=0x9F map to the Unicode scalar with the same value, and no byte is
/// ever rejected.
///
/// ```
/// assert_eq!(beacon_types::advertisement_text(b"T=21.5"), "T=21.5");
/// assert_eq!(beacon_types::advertisement_text(&[0x80, 0xB0]), "\u{20AC}\u{B0}");
/// ```
#[must_use]
pub fn advertisement_text(payload: &[u8]) -> String {
    payload
        .iter()
        .map(|&byte| match byte {
            0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(byte - 0x80)],
            _ => char::from(byte),
        })
        .collect()
}

/// Parse a hex dump such as `"01 80 02 40"`, `"01:80:02:40"` or `"0x01800240"`.
///
/// # Errors
///
/// Returns [`ParseError::InvalidHex`] when the input contains non-hex
/// characters or an odd number of digits.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, ParseError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| !matches!(b, b' ' | b':' | b'-' | b',' | b'\t'))
        .collect();

    if digits.len() % 2 != 0 {
        return Err(ParseError::InvalidHex(format!(
            "odd number of hex digits ({})",
            digits.len()
        )));
    }

    digits
        .chunks_exact(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair)
                .map_err(|_| ParseError::InvalidHex("non-ASCII input".to_string()))?;
            u8::from_str_radix(text, 16)
                .map_err(|_| ParseError::InvalidHex(format!("'{}' is not a hex byte", text)))
        })
        .collect()
}
