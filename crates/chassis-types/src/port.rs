//! Port tunables and state enums shared by the device backend and the
//! chassis manager.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Desired administrative state of a port.
///
/// `Unknown` is the unset value and is never accepted by a config push.
/// `Diag` is recognised but not supported by any backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminState {
    #[default]
    Unknown,
    #[serde(alias = "down")]
    Disabled,
    #[serde(alias = "up")]
    Enabled,
    Diag,
}

impl AdminState {
    /// Returns true if the port is administratively enabled.
    pub const fn is_enabled(&self) -> bool {
        matches!(self, AdminState::Enabled)
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdminState::Unknown => "unknown",
            AdminState::Disabled => "disabled",
            AdminState::Enabled => "enabled",
            AdminState::Diag => "diag",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AdminState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(AdminState::Unknown),
            "disabled" | "down" => Ok(AdminState::Disabled),
            "enabled" | "up" => Ok(AdminState::Enabled),
            "diag" => Ok(AdminState::Diag),
            _ => Err(ParseError::InvalidAdminState(s.to_string())),
        }
    }
}

/// Three-valued switch used for autonegotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    #[default]
    Unknown,
    Enabled,
    Disabled,
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriState::Unknown => "unknown",
            TriState::Enabled => "enabled",
            TriState::Disabled => "disabled",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TriState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(TriState::Unknown),
            "enabled" | "on" | "true" => Ok(TriState::Enabled),
            "disabled" | "off" | "false" => Ok(TriState::Disabled),
            _ => Err(ParseError::InvalidTriState(s.to_string())),
        }
    }
}

/// Port loopback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopbackState {
    #[default]
    Unknown,
    None,
    Mac,
    Phy,
}

impl fmt::Display for LoopbackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopbackState::Unknown => "unknown",
            LoopbackState::None => "none",
            LoopbackState::Mac => "mac",
            LoopbackState::Phy => "phy",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LoopbackState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(LoopbackState::Unknown),
            "none" => Ok(LoopbackState::None),
            "mac" => Ok(LoopbackState::Mac),
            "phy" => Ok(LoopbackState::Phy),
            _ => Err(ParseError::InvalidLoopbackState(s.to_string())),
        }
    }
}

/// Forward error correction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FecMode {
    #[default]
    Unknown,
    On,
    Off,
    Auto,
}

impl fmt::Display for FecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FecMode::Unknown => "unknown",
            FecMode::On => "on",
            FecMode::Off => "off",
            FecMode::Auto => "auto",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for FecMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(FecMode::Unknown),
            "on" => Ok(FecMode::On),
            "off" => Ok(FecMode::Off),
            "auto" => Ok(FecMode::Auto),
            _ => Err(ParseError::InvalidFecMode(s.to_string())),
        }
    }
}

/// Operational link state of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    #[default]
    Unknown,
    Up,
    Down,
    Failed,
}

impl PortState {
    /// Returns true if the link is up.
    pub const fn is_up(&self) -> bool {
        matches!(self, PortState::Up)
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortState::Unknown => "unknown",
            PortState::Up => "up",
            PortState::Down => "down",
            PortState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Kind of data-plane port created in the software switch backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    #[default]
    None,
    Vhost,
    Tap,
    Link,
    Source,
    Sink,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortType::None => "none",
            PortType::Vhost => "vhost",
            PortType::Tap => "tap",
            PortType::Link => "link",
            PortType::Source => "source",
            PortType::Sink => "sink",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PortType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(PortType::None),
            "vhost" => Ok(PortType::Vhost),
            "tap" => Ok(PortType::Tap),
            "link" => Ok(PortType::Link),
            "source" => Ok(PortType::Source),
            "sink" => Ok(PortType::Sink),
            _ => Err(ParseError::InvalidPortType(s.to_string())),
        }
    }
}

/// Whether a port faces the host (control plane) or the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketDirection {
    #[default]
    Host,
    Network,
}
