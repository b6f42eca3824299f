//! Side panel content, derived from the view state and the layer stack alone.
//! Exactly one block is shown at a time and each block carries a stable key,
//! so the front-end can animate block replacement rather than mutation.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::layers::LayerStack;
use crate::micro::MicroKind;
use crate::view_state::ViewState;

/// Buttons the panel can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelAction {
    AnalyzeStructure,
    BackToStack,
    ViewMicroDetail,
    CloseMicro,
}

impl PanelAction {
    pub fn label(self) -> &'static str {
        match self {
            PanelAction::AnalyzeStructure => "Analyze Structure",
            PanelAction::BackToStack => "\u{2190} Back to stack",
            PanelAction::ViewMicroDetail => "View R&D Detail",
            PanelAction::CloseMicro => "Close Micro View",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub swatch: Rgb,
    pub text: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MicroText {
    pub title: &'static str,
    pub accent: Rgb,
    pub summary: &'static str,
    pub section_title: &'static str,
    pub section_text: &'static str,
    pub legend: Vec<LegendEntry>,
    pub highlight: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub color: Rgb,
    pub description: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "key")]
pub enum InfoContent {
    #[serde(rename = "micro-detail")]
    MicroDetail {
        kind: Option<MicroKind>,
        text: Option<MicroText>,
        actions: Vec<PanelAction>,
    },
    #[serde(rename = "layer-detail")]
    LayerDetail {
        layer: Option<LayerSummary>,
        micro_teaser: Option<&'static str>,
        specs_heading: &'static str,
        actions: Vec<PanelAction>,
    },
    #[serde(rename = "intro")]
    Intro {
        badge: &'static str,
        title: &'static str,
        subtitle: &'static str,
        body: &'static str,
        actions: Vec<PanelAction>,
    },
}

pub const INTRO_BADGE: &str = "Solid-State Revolution";
pub const INTRO_TITLE: &str = "Glass Electrolyte";
pub const INTRO_SUBTITLE: &str = "Batteries";
pub const INTRO_BODY: &str = "A breakthrough in energy storage replacing flammable liquids with dense, highly conductive oxy-sulfide glass.";
pub const SPECS_HEADING: &str = "Key Specifications";

impl InfoContent {
    pub fn derive(state: &ViewState, stack: &LayerStack) -> Self {
        if state.is_micro() {
            let kind = state.selected().and_then(MicroKind::for_layer);
            return InfoContent::MicroDetail {
                kind,
                text: kind.map(micro_text),
                actions: vec![PanelAction::CloseMicro],
            };
        }
        if let Some(id) = state.selected() {
            let layer = stack.get(id);
            let micro_teaser = layer.and_then(|layer| layer.micro_kind()).map(MicroKind::teaser);
            let mut actions = vec![PanelAction::BackToStack];
            if micro_teaser.is_some() {
                actions.push(PanelAction::ViewMicroDetail);
            }
            return InfoContent::LayerDetail {
                layer: layer.map(|layer| LayerSummary {
                    name: layer.name.clone(),
                    color: layer.color,
                    description: layer.description.clone(),
                    details: layer.details.clone(),
                }),
                micro_teaser,
                specs_heading: SPECS_HEADING,
                actions,
            };
        }
        InfoContent::Intro {
            badge: INTRO_BADGE,
            title: INTRO_TITLE,
            subtitle: INTRO_SUBTITLE,
            body: INTRO_BODY,
            actions: vec![PanelAction::AnalyzeStructure],
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            InfoContent::MicroDetail { .. } => "micro-detail",
            InfoContent::LayerDetail { .. } => "layer-detail",
            InfoContent::Intro { .. } => "intro",
        }
    }

    pub fn actions(&self) -> &[PanelAction] {
        match self {
            InfoContent::MicroDetail { actions, .. }
            | InfoContent::LayerDetail { actions, .. }
            | InfoContent::Intro { actions, .. } => actions,
        }
    }
}

fn micro_text(kind: MicroKind) -> MicroText {
    match kind {
        MicroKind::Anode => MicroText {
            title: "Graphite Interlayer Expansion",
            accent: Rgb::from_u8(0x22, 0xC5, 0x5E),
            summary: "JES is developing modified graphite anodes where the interlayer spacing (d-spacing) is expanded beyond 3.36\u{c5}.",
            section_title: "Mechanism of Action",
            section_text: "Expanding the carbon layers reduces diffusion resistance (R_Diffusion), allowing Lithium ions to move freely.",
            legend: Vec::new(),
            highlight: "Accelerates Diffusion of Li+",
        },
        MicroKind::Cathode => MicroText {
            title: "Glass-Infused Cathode",
            accent: Rgb::from_u8(0x25, 0x63, 0xEB),
            summary: "Interact with the slider to simulate the glass infusion process.",
            section_title: "Composite Structure",
            section_text: "Molten Oxy-Sulfide glass fills the voids between NMC active material particles (dodecahedrons).",
            legend: vec![
                LegendEntry {
                    swatch: Rgb::from_u8(0x1E, 0x29, 0x3B),
                    text: "Active Material (NMC)",
                },
                LegendEntry {
                    swatch: Rgb::from_u8(0x60, 0xA5, 0xFA),
                    text: "Solid Electrolyte (Glass)",
                },
            ],
            highlight: "Enables High Capacity & Speed",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::ViewMode;

    fn state(mode: ViewMode, id: Option<&str>) -> ViewState {
        ViewState {
            mode,
            selected_layer_id: id.map(str::to_string),
        }
    }

    #[test]
    fn intro_offers_analyze_structure() {
        let content = InfoContent::derive(&ViewState::default(), &LayerStack::builtin());
        assert_eq!(content.key(), "intro");
        assert_eq!(content.actions(), &[PanelAction::AnalyzeStructure]);
    }

    #[test]
    fn exploded_without_selection_still_shows_intro() {
        let content = InfoContent::derive(&state(ViewMode::Exploded, None), &LayerStack::builtin());
        assert_eq!(content.key(), "intro");
    }

    #[test]
    fn layer_detail_offers_micro_only_when_supported() {
        let stack = LayerStack::builtin();
        let cathode = InfoContent::derive(&state(ViewMode::Exploded, Some("cathode")), &stack);
        assert_eq!(cathode.key(), "layer-detail");
        assert!(cathode.actions().contains(&PanelAction::ViewMicroDetail));
        let InfoContent::LayerDetail { layer, micro_teaser, .. } = cathode else {
            panic!("expected layer detail");
        };
        assert_eq!(micro_teaser, Some("Glass Infusion"));
        assert_eq!(layer.expect("layer").details.len(), 3);

        let copper = InfoContent::derive(&state(ViewMode::Exploded, Some("copper")), &stack);
        assert_eq!(copper.actions(), &[PanelAction::BackToStack]);
    }

    #[test]
    fn unknown_selection_degrades_to_empty_detail() {
        let content =
            InfoContent::derive(&state(ViewMode::Exploded, Some("ghost")), &LayerStack::builtin());
        let InfoContent::LayerDetail { layer, micro_teaser, .. } = content else {
            panic!("expected layer detail");
        };
        assert!(layer.is_none());
        assert!(micro_teaser.is_none());
    }

    #[test]
    fn micro_detail_matches_active_layer() {
        let content =
            InfoContent::derive(&state(ViewMode::Micro, Some("anode")), &LayerStack::builtin());
        assert_eq!(content.key(), "micro-detail");
        let InfoContent::MicroDetail { text, .. } = content else {
            panic!("expected micro detail");
        };
        assert_eq!(text.expect("text").title, "Graphite Interlayer Expansion");
    }

    #[test]
    fn serializes_with_stable_key() {
        let content = InfoContent::derive(&ViewState::default(), &LayerStack::builtin());
        let json = serde_json::to_value(&content).expect("serialize");
        assert_eq!(json["key"], "intro");
    }
}
