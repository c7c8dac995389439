/// P-Touch models with a 128 pin print head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    PTP300BT, // Bluetooth only
    PTP700,
    PTP710BT,
    PTP750W,
    PTE550W,
}

impl Model {
    /// USB product id, `None` for models without a USB printer interface.
    pub fn pid(&self) -> Option<u16> {
        match self {
            Self::PTP300BT => None,
            Self::PTP700 => Some(0x2061),
            Self::PTP710BT => Some(0x20AF),
            Self::PTP750W => Some(0x2062),
            Self::PTE550W => Some(0x2060),
        }
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "ptp300bt" | "p300bt" => Ok(Self::PTP300BT),
            "ptp700" | "p700" => Ok(Self::PTP700),
            "ptp710bt" | "p710bt" => Ok(Self::PTP710BT),
            "ptp750w" | "p750w" => Ok(Self::PTP750W),
            "pte550w" | "e550w" => Ok(Self::PTE550W),
            other => Err(format!("unknown model '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_names() {
        assert_eq!("PT-P710BT".parse::<Model>(), Ok(Model::PTP710BT));
        assert_eq!("e550w".parse::<Model>(), Ok(Model::PTE550W));
        assert!("QL-800".parse::<Model>().is_err());
    }

    #[test]
    fn bluetooth_only_model_has_no_pid() {
        assert_eq!(Model::PTP300BT.pid(), None);
        assert_eq!(Model::PTP710BT.pid(), Some(0x20AF));
    }
}
