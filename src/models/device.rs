// Connected-device models and list filtering

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::MacAddress;

/// A host attached to the router, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub mac_address: MacAddress,
    /// Router-side host name; equals the MAC string when the user never named it.
    pub name: String,
    pub ip_address: String,
    pub connection_type: String,
    pub active: bool,
    #[serde(default)]
    pub down_speed: Option<u64>,
    #[serde(default)]
    pub up_speed: Option<u64>,
    #[serde(default)]
    pub packets_sent: Option<u64>,
    #[serde(default)]
    pub packets_received: Option<u64>,
}

impl Device {
    pub fn is_unnamed(&self) -> bool {
        self.name == self.mac_address.as_str()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceFilter {
    #[default]
    All,
    /// Name still equals the MAC address.
    Unnamed,
    /// Name was set by the user.
    Custom,
}

impl DeviceFilter {
    pub fn matches(self, device: &Device) -> bool {
        match self {
            DeviceFilter::All => true,
            DeviceFilter::Unnamed => device.is_unnamed(),
            DeviceFilter::Custom => !device.is_unnamed(),
        }
    }
}

impl FromStr for DeviceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(DeviceFilter::All),
            "unnamed" => Ok(DeviceFilter::Unnamed),
            "custom" => Ok(DeviceFilter::Custom),
            other => Err(format!(
                "unknown filter {other:?}, expected one of all, unnamed, custom"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceSort {
    #[default]
    Name,
    Mac,
    Ip,
    Type,
}

impl DeviceSort {
    /// Stable sort, so equal keys keep router order.
    pub fn apply(self, devices: &mut [Device]) {
        match self {
            DeviceSort::Name => devices.sort_by(|a, b| a.name.cmp(&b.name)),
            DeviceSort::Mac => devices.sort_by(|a, b| a.mac_address.cmp(&b.mac_address)),
            DeviceSort::Ip => devices.sort_by(|a, b| a.ip_address.cmp(&b.ip_address)),
            DeviceSort::Type => devices.sort_by(|a, b| a.connection_type.cmp(&b.connection_type)),
        }
    }
}

impl FromStr for DeviceSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(DeviceSort::Name),
            "mac" => Ok(DeviceSort::Mac),
            "ip" => Ok(DeviceSort::Ip),
            "type" => Ok(DeviceSort::Type),
            other => Err(format!(
                "unknown sort key {other:?}, expected one of name, mac, ip, type"
            )),
        }
    }
}

/// Applies a filter then a sort, returning the surviving devices.
pub fn filter_and_sort(devices: Vec<Device>, filter: DeviceFilter, sort: DeviceSort) -> Vec<Device> {
    let mut out: Vec<Device> = devices.into_iter().filter(|d| filter.matches(d)).collect();
    sort.apply(&mut out);
    out
}
