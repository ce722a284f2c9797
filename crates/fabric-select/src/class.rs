//! Network device classes.
//!
//! Discovery reports the kernel's ARPHRD hardware type for each network
//! interface. `Manual` is reserved for devices declared in configuration
//! and is never produced by discovery.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FabricError;

/// The network technology behind a fabric interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetDevClass {
    Netrom,
    Ether,
    Eether,
    Ax25,
    Pronet,
    Chaos,
    Ieee802,
    Arcnet,
    Appletalk,
    Dlci,
    Atm,
    Metricom,
    Ieee1394,
    Eui64,
    Infiniband,
    Loopback,
    /// Declared by the user; assumed compatible with any request.
    Manual,
}

impl NetDevClass {
    /// Map a Linux ARPHRD_* value to a device class.
    pub fn from_arphrd(value: u32) -> Option<Self> {
        let class = match value {
            0 => Self::Netrom,
            1 => Self::Ether,
            2 => Self::Eether,
            3 => Self::Ax25,
            4 => Self::Pronet,
            5 => Self::Chaos,
            6 => Self::Ieee802,
            7 => Self::Arcnet,
            8 => Self::Appletalk,
            15 => Self::Dlci,
            19 => Self::Atm,
            23 => Self::Metricom,
            24 => Self::Ieee1394,
            27 => Self::Eui64,
            32 => Self::Infiniband,
            772 => Self::Loopback,
            _ => return None,
        };
        Some(class)
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Netrom => "NETROM",
            Self::Ether => "ETHER",
            Self::Eether => "EETHER",
            Self::Ax25 => "AX25",
            Self::Pronet => "PRONET",
            Self::Chaos => "CHAOS",
            Self::Ieee802 => "IEEE802",
            Self::Arcnet => "ARCNET",
            Self::Appletalk => "APPLETLK",
            Self::Dlci => "DLCI",
            Self::Atm => "ATM",
            Self::Metricom => "METRICOM",
            Self::Ieee1394 => "IEEE1394",
            Self::Eui64 => "EUI64",
            Self::Infiniband => "INFINIBAND",
            Self::Loopback => "LOOPBACK",
            Self::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for NetDevClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NetDevClass {
    type Err = FabricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let class = match s.trim().to_ascii_lowercase().as_str() {
            "netrom" => Self::Netrom,
            "ether" | "ethernet" | "eth" => Self::Ether,
            "eether" => Self::Eether,
            "ax25" => Self::Ax25,
            "pronet" => Self::Pronet,
            "chaos" => Self::Chaos,
            "ieee802" => Self::Ieee802,
            "arcnet" => Self::Arcnet,
            "appletalk" | "appletlk" => Self::Appletalk,
            "dlci" => Self::Dlci,
            "atm" => Self::Atm,
            "metricom" => Self::Metricom,
            "ieee1394" => Self::Ieee1394,
            "eui64" => Self::Eui64,
            "infiniband" | "ib" => Self::Infiniband,
            "loopback" => Self::Loopback,
            "manual" => Self::Manual,
            other => {
                return Err(FabricError::InvalidArgument(format!(
                    "unknown network device class {other:?}"
                )));
            }
        };
        Ok(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arphrd_values() {
        assert_eq!(NetDevClass::from_arphrd(1), Some(NetDevClass::Ether));
        assert_eq!(NetDevClass::from_arphrd(32), Some(NetDevClass::Infiniband));
        assert_eq!(NetDevClass::from_arphrd(772), Some(NetDevClass::Loopback));
        assert_eq!(NetDevClass::from_arphrd(9999), None);
    }

    #[test]
    fn manual_is_never_discovered() {
        assert!((0..1024).filter_map(NetDevClass::from_arphrd).all(|c| !c.is_manual()));
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("ethernet".parse::<NetDevClass>().unwrap(), NetDevClass::Ether);
        assert_eq!("InfiniBand".parse::<NetDevClass>().unwrap(), NetDevClass::Infiniband);
        assert_eq!("manual".parse::<NetDevClass>().unwrap(), NetDevClass::Manual);
        assert!("token-ring".parse::<NetDevClass>().is_err());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&NetDevClass::Infiniband).unwrap();
        assert_eq!(json, "\"infiniband\"");
        let back: NetDevClass = serde_json::from_str("\"ether\"").unwrap();
        assert_eq!(back, NetDevClass::Ether);
    }
}
