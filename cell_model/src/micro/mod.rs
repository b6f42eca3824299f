//! Microscopic sub-scenes. A scene exists only while its layer is selected in
//! micro mode: it is built on entry (random layouts included), advanced once
//! per frame, and dropped on exit.

pub mod anode;
pub mod cathode;
pub mod ions;

use rand::Rng;
use serde::Serialize;

pub use anode::{AnodeFrame, AnodeSimulator};
pub use cathode::{CathodeFrame, CathodeSimulator};
pub use ions::{IonField, IonPoses};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MicroKind {
    Anode,
    Cathode,
}

impl MicroKind {
    /// Layer ids that own a micro simulator.
    pub fn for_layer(id: &str) -> Option<Self> {
        match id {
            "anode" => Some(Self::Anode),
            "cathode" => Some(Self::Cathode),
            _ => None,
        }
    }

    pub fn layer_id(self) -> &'static str {
        match self {
            Self::Anode => "anode",
            Self::Cathode => "cathode",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            Self::Anode => "Graphite Anode Micro-Structure",
            Self::Cathode => "Cathode-Electrolyte Interface",
        }
    }

    /// Subtitle for the "View R&D Detail" action.
    pub fn teaser(self) -> &'static str {
        match self {
            Self::Anode => "Interlayer Expansion",
            Self::Cathode => "Glass Infusion",
        }
    }
}

#[derive(Debug, Clone)]
pub enum MicroScene {
    Anode(AnodeSimulator),
    Cathode(CathodeSimulator),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MicroFrame {
    Anode(AnodeFrame),
    Cathode(CathodeFrame),
}

impl MicroScene {
    pub fn enter<R: Rng + ?Sized>(kind: MicroKind, rng: &mut R) -> Self {
        log::info!("entering {} micro scene", kind.layer_id());
        match kind {
            MicroKind::Anode => Self::Anode(AnodeSimulator::new(rng)),
            MicroKind::Cathode => Self::Cathode(CathodeSimulator::new(rng)),
        }
    }

    pub fn kind(&self) -> MicroKind {
        match self {
            Self::Anode(_) => MicroKind::Anode,
            Self::Cathode(_) => MicroKind::Cathode,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        match self {
            Self::Anode(sim) => sim.advance(dt),
            Self::Cathode(sim) => sim.advance(dt),
        }
    }

    pub fn frame(&self) -> MicroFrame {
        match self {
            Self::Anode(sim) => MicroFrame::Anode(sim.frame()),
            Self::Cathode(sim) => MicroFrame::Cathode(sim.frame()),
        }
    }

    pub fn cathode_mut(&mut self) -> Option<&mut CathodeSimulator> {
        match self {
            Self::Cathode(sim) => Some(sim),
            Self::Anode(_) => None,
        }
    }

    pub fn cathode(&self) -> Option<&CathodeSimulator> {
        match self {
            Self::Cathode(sim) => Some(sim),
            Self::Anode(_) => None,
        }
    }
}

impl Drop for MicroScene {
    fn drop(&mut self) {
        log::info!("leaving {} micro scene", self.kind().layer_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn kinds_map_to_layer_ids() {
        assert_eq!(MicroKind::for_layer("anode"), Some(MicroKind::Anode));
        assert_eq!(MicroKind::for_layer("cathode"), Some(MicroKind::Cathode));
        assert_eq!(MicroKind::for_layer("separator"), None);
        for kind in [MicroKind::Anode, MicroKind::Cathode] {
            assert_eq!(MicroKind::for_layer(kind.layer_id()), Some(kind));
        }
    }

    #[test]
    fn entering_builds_the_matching_simulator() {
        let mut rng = StdRng::seed_from_u64(1);
        let anode = MicroScene::enter(MicroKind::Anode, &mut rng);
        assert!(matches!(anode.frame(), MicroFrame::Anode(_)));
        assert!(anode.cathode().is_none());
        let mut cathode = MicroScene::enter(MicroKind::Cathode, &mut rng);
        assert_eq!(cathode.kind(), MicroKind::Cathode);
        assert!(cathode.cathode_mut().is_some());
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let a = MicroScene::enter(MicroKind::Cathode, &mut StdRng::seed_from_u64(9)).frame();
        let b = MicroScene::enter(MicroKind::Cathode, &mut StdRng::seed_from_u64(9)).frame();
        assert_eq!(a, b);
    }
}
