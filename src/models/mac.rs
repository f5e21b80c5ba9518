// Hardware address canonicalisation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A MAC address in canonical `AA:BB:CC:DD:EE:FF` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hardware address: {0:?}")]
pub struct InvalidMac(pub String);

impl MacAddress {
    /// Accepts colon, dash or no separators, any case. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, InvalidMac> {
        let cleaned = raw.trim().to_uppercase().replace('-', ":");
        let octets: Vec<&str> = if cleaned.contains(':') {
            cleaned.split(':').collect()
        } else if cleaned.len() == 12 && cleaned.is_ascii() {
            (0..6).map(|i| &cleaned[i * 2..i * 2 + 2]).collect()
        } else {
            return Err(InvalidMac(raw.to_string()));
        };
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(InvalidMac(raw.to_string()));
        }
        Ok(Self(octets.join(":")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dash-delimited form the router expects in write requests.
    pub fn to_router_format(&self) -> String {
        self.0.replace(':', "-")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = InvalidMac;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = InvalidMac;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}
