use serde::{Deserialize, Serialize};

/// Physical data of a fixture, or of one mode overriding it.
///
/// All fields are optional; a mode-level override replaces exactly the
/// fields it sets, see [`Physical::merged_over`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Physical {
    /// Width, height, depth in millimeters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<[f64; 3]>,
    /// Kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "DMXconnector")]
    pub dmx_connector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulb: Option<Bulb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<Lens>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bulb {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulb_type: Option<String>,
    /// Kelvin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lumens: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Smallest and widest beam angle in degrees, min <= max.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrees_min_max: Option<[f64; 2]>,
}

impl Physical {
    /// This physical data laid over `base`: fields set here win, everything
    /// else falls through to `base`. Used for mode-level overrides.
    pub fn merged_over(&self, base: &Physical) -> Physical {
        Physical {
            dimensions: self.dimensions.or(base.dimensions),
            weight: self.weight.or(base.weight),
            power: self.power.or(base.power),
            dmx_connector: self
                .dmx_connector
                .clone()
                .or_else(|| base.dmx_connector.clone()),
            bulb: self.bulb.clone().or_else(|| base.bulb.clone()),
            lens: self.lens.clone().or_else(|| base.lens.clone()),
        }
    }
}
