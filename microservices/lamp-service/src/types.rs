//! Lamp Service domain types

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Power state of a lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    #[default]
    Off,
}

impl Power {
    pub fn toggled(self) -> Self {
        match self {
            Power::On => Power::Off,
            Power::Off => Power::On,
        }
    }

    /// Power implied by a brightness level: anything above zero is on
    pub fn for_brightness(brightness: u8) -> Self {
        if brightness > 0 {
            Power::On
        } else {
            Power::Off
        }
    }

    /// Binary encoding used for the `lamp_state` metric
    pub fn metric_value(self) -> f64 {
        match self {
            Power::On => 1.0,
            Power::Off => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Power::On => "on",
            Power::Off => "off",
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self { r: 255, g: 255, b: 255 }
    }
}

/// Last known state of a lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampState {
    pub power: Power,
    /// 0..=100
    pub brightness: u8,
    pub color: Color,
}

impl Default for LampState {
    fn default() -> Self {
        Self {
            power: Power::Off,
            brightness: 100,
            color: Color::default(),
        }
    }
}

/// Device as returned by the device directory. Everything other than the
/// identifier, `type` included, is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    #[serde(deserialize_with = "deserialize_device_id")]
    pub id: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl DeviceDescriptor {
    /// A light with no other metadata
    pub fn new(id: impl Into<String>) -> Self {
        let mut metadata = serde_json::Map::new();
        metadata.insert("type".to_string(), serde_json::Value::from("light"));
        Self { id: id.into(), metadata }
    }

    pub fn device_type(&self) -> Option<&str> {
        self.metadata.get("type").and_then(serde_json::Value::as_str)
    }
}

/// Directory ids may be numeric; lamps are always keyed by their string form.
fn deserialize_device_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// A device descriptor merged with its lamp state, as listed by `GET /lamps`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LampEntry {
    #[serde(flatten)]
    pub device: DeviceDescriptor,
    pub state: LampState,
}
