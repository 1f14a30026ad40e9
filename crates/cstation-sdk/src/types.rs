//! Wire types for the Container Station API.
//!
//! The appliance omits fields freely and the published API documents do not
//! always match what it returns, so response structs default missing fields.
//! The exceptions are the fields that identify a success body: a container's
//! `id` and `type`, and `used` on a port query. Without them any unrelated
//! object would decode as a zero value. A field of the wrong JSON type is
//! always a decode failure.

use crate::error::SdkError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Runtime that manages a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Docker,
    Lxc,
}

impl ContainerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerType::Docker => "docker",
            ContainerType::Lxc => "lxc",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerType {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docker" => Ok(ContainerType::Docker),
            "lxc" => Ok(ContainerType::Lxc),
            _ => Err(SdkError::Validation(format!("unknown container type '{s}'"))),
        }
    }
}

impl TryFrom<&str> for ContainerType {
    type Error = SdkError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<i32> for ContainerType {
    type Error = SdkError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ContainerType::Docker),
            1 => Ok(ContainerType::Lxc),
            _ => Err(SdkError::Validation(format!(
                "unknown container type {value}"
            ))),
        }
    }
}

/// Transport protocol for port usage queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(SdkError::Validation(format!("unknown protocol '{s}'"))),
        }
    }
}

impl TryFrom<&str> for Protocol {
    type Error = SdkError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<i32> for Protocol {
    type Error = SdkError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Protocol::Tcp),
            1 => Ok(Protocol::Udp),
            _ => Err(SdkError::Validation(format!("unknown protocol {value}"))),
        }
    }
}

/// Lifecycle actions accepted by `PUT /container/{type}/{id}/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
}

impl ContainerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Restart => "restart",
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by login and login refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLoginResponse")]
pub struct LoginResponse {
    pub anonymous: bool,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(rename = "logintime")]
    pub login_time: String,
    pub username: String,
}

// Firmware has been seen sending the misspelled `loginime`, sometimes next to
// `logintime`. Either key is accepted; a non-empty `logintime` wins.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawLoginResponse {
    anonymous: bool,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
    logintime: Option<String>,
    loginime: Option<String>,
    username: String,
}

impl From<RawLoginResponse> for LoginResponse {
    fn from(raw: RawLoginResponse) -> Self {
        let login_time = raw
            .logintime
            .filter(|t| !t.is_empty())
            .or(raw.loginime)
            .unwrap_or_default();

        LoginResponse {
            anonymous: raw.anonymous,
            is_admin: raw.is_admin,
            login_time,
            username: raw.username,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoutResponse {
    pub username: String,
}

/// Host capabilities and component versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemInformation {
    pub cpu_core: u32,
    pub cpu_thread: u32,
    pub features: Vec<String>,
    pub gpu: GpuInformation,
    pub gpu_driver: bool,
    pub hostname: String,
    pub machine: String,
    pub need_restart: bool,
    pub processor: String,
    pub status: String,
    pub version: VersionInformation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuInformation {
    pub cs_mode: bool,
    pub device: Vec<serde_json::Value>,
    pub driver_installed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionInformation {
    pub docker_version: String,
    pub firmware: String,
    pub lxc_version: String,
    pub qpkg: String,
    pub web: String,
}

/// CPU and memory utilisation snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceUsage {
    #[serde(rename = "cpu_usage", deserialize_with = "number_or_string")]
    pub cpu: f64,
    #[serde(rename = "memory_usage")]
    pub memory: MemoryUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryUsage {
    pub buffers: u64,
    pub cached: u64,
    pub percent: f64,
    pub percent_buffers: f64,
    pub percent_cached: f64,
    pub total: u64,
    pub used: u64,
}

/// Summary of one managed container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub cpu: f64,
    pub id: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, rename = "imageID")]
    pub image_id: String,
    #[serde(default, rename = "ipaddress")]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rx: u64,
    #[serde(default)]
    pub state: String,
    #[serde(default, rename = "tcpPort")]
    pub tcp_ports: Vec<u16>,
    #[serde(default)]
    pub tx: u64,
    #[serde(rename = "type")]
    pub kind: ContainerType,
}

/// `GET /system/port/{protocol}/{port}` body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortUsage {
    pub used: bool,
}

/// Some firmware reports `cpu_usage` as a string ("12.5"), some as a number.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0.0),
        Raw::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .parse()
            .map_err(serde::de::Error::custom),
    }
}
