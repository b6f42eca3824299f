//! Reference data for the cell stack. The stack is assembled once at startup
//! (either the built-in table or a validated JSON override) and is read-only
//! afterwards; index 0 is the top of the stack.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;
use crate::micro::MicroKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub color: Rgb,
    pub description: String,
    #[serde(default)]
    pub details: Vec<String>,
    pub thickness_ratio: f32,
    #[serde(default)]
    pub has_micro_view: bool,
}

impl Layer {
    /// Which micro simulator this layer opens, if any.
    pub fn micro_kind(&self) -> Option<MicroKind> {
        if self.has_micro_view {
            MicroKind::for_layer(&self.id)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum StackError {
    #[error("reading layer stack {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing layer stack {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("layer stack is empty")]
    Empty,
    #[error("duplicate layer id {0:?}")]
    DuplicateId(String),
    #[error("layer {id:?} has invalid thickness ratio {ratio}")]
    InvalidThickness { id: String, ratio: f32 },
    #[error("layer {0:?} requests a micro view but no micro simulator exists for it")]
    UnsupportedMicroView(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

struct BuiltinLayer {
    id: &'static str,
    name: &'static str,
    color: Rgb,
    description: &'static str,
    details: &'static [&'static str],
    thickness_ratio: f32,
    has_micro_view: bool,
}

const BUILTIN_LAYERS: [BuiltinLayer; 5] = [
    BuiltinLayer {
        id: "copper",
        name: "Copper Foil",
        color: Rgb::from_u8(0xB8, 0x73, 0x33),
        description: "Current collector for the anode side. Provides electrical connection to the external circuit.",
        details: &["Material: Copper", "Role: Negative Current Collector"],
        thickness_ratio: 0.2,
        has_micro_view: false,
    },
    BuiltinLayer {
        id: "anode",
        name: "Li-Metal / Graphite Anode",
        color: Rgb::from_u8(0xE5, 0xE7, 0xEB),
        description: "Advanced anode technology. Primary design uses Lithium Metal for max density. Research tracks include improved Graphite with Interlayer Expansion.",
        details: &[
            "Primary: Li-Metal (No casting needed)",
            "R&D: Graphite with Interlayer Expansion",
            "Target: High Capacity & Fast Charging",
        ],
        thickness_ratio: 0.8,
        has_micro_view: true,
    },
    BuiltinLayer {
        id: "separator",
        name: "Glass Separator",
        color: Rgb::from_u8(0x3B, 0x82, 0xF6),
        description: "The core Oxy-Sulfide Glass electrolyte. Dense, non-flammable, and creates a perfect solid-solid interface.",
        details: &[
            "Thickness: ~35 μm",
            "Conductivity: 1 x 10⁻³ S/cm",
            "Prevents dendrites",
        ],
        thickness_ratio: 0.6,
        has_micro_view: false,
    },
    BuiltinLayer {
        id: "cathode",
        name: "Glass-Infused Cathode",
        color: Rgb::from_u8(0x17, 0x25, 0x54),
        description: "NMC Cathode active material infused with molten OS Glass for maximum surface contact and ionic conductivity.",
        details: &[
            "Composition: NMC811 + OS Glass",
            "Structure: High surface area contact",
            "Voltage: 4.3V operational",
        ],
        thickness_ratio: 2.0,
        has_micro_view: true,
    },
    BuiltinLayer {
        id: "aluminum",
        name: "Aluminum Foil",
        color: Rgb::from_u8(0x9C, 0xA3, 0xAF),
        description: "Current collector for the cathode side.",
        details: &["Material: Aluminum", "Role: Positive Current Collector"],
        thickness_ratio: 0.2,
        has_micro_view: false,
    },
];

impl LayerStack {
    /// The five-layer solid-state cell shown by default.
    pub fn builtin() -> Self {
        let layers = BUILTIN_LAYERS
            .iter()
            .map(|layer| Layer {
                id: layer.id.to_string(),
                name: layer.name.to_string(),
                color: layer.color,
                description: layer.description.to_string(),
                details: layer.details.iter().map(|line| line.to_string()).collect(),
                thickness_ratio: layer.thickness_ratio,
                has_micro_view: layer.has_micro_view,
            })
            .collect();
        Self { layers }
    }

    pub fn new(layers: Vec<Layer>) -> Result<Self, StackError> {
        if layers.is_empty() {
            return Err(StackError::Empty);
        }
        let mut seen = HashSet::new();
        for layer in &layers {
            if !seen.insert(layer.id.as_str()) {
                return Err(StackError::DuplicateId(layer.id.clone()));
            }
            if !layer.thickness_ratio.is_finite() || layer.thickness_ratio <= 0.0 {
                return Err(StackError::InvalidThickness {
                    id: layer.id.clone(),
                    ratio: layer.thickness_ratio,
                });
            }
            if layer.has_micro_view && MicroKind::for_layer(&layer.id).is_none() {
                return Err(StackError::UnsupportedMicroView(layer.id.clone()));
            }
        }
        Ok(Self { layers })
    }

    pub fn from_json_str(data: &str, origin: &Path) -> Result<Self, StackError> {
        let layers: Vec<Layer> = serde_json::from_str(data).map_err(|source| StackError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        Self::new(layers)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StackError> {
        let data = fs::read_to_string(path).map_err(|source| StackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stack = Self::from_json_str(&data, path)?;
        log::info!(
            "loaded {} layer(s) from {}",
            stack.len(),
            path.display()
        );
        Ok(stack)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    pub fn supports_micro(&self, id: &str) -> bool {
        self.get(id).and_then(Layer::micro_kind).is_some()
    }
}
