//! Static benchmark figures for the dashboard and the bar geometry used to
//! draw them. Nothing here touches the view state.

use serde::Serialize;

use crate::color::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shrink by `amount` on every side, never below zero size.
    pub fn inset(&self, amount: f32) -> Self {
        let width = (self.width - amount * 2.0).max(0.0);
        let height = (self.height - amount * 2.0).max(0.0);
        Self::new(self.x + amount, self.y + amount, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub name: &'static str,
    pub baseline: f32,
    pub improved: f32,
    pub unit: &'static str,
}

pub const BASELINE_NAME: &str = "Lithium-Ion (2021)";
pub const IMPROVED_NAME: &str = "JES Glass Battery";
pub const BASELINE_COLOR: Rgb = Rgb::from_u8(0x94, 0xA3, 0xB8);

pub const COMPARISONS: [Comparison; 3] = [
    Comparison {
        name: "Manufacturing Cost",
        baseline: 101.0,
        improved: 74.0,
        unit: "$/kWh",
    },
    Comparison {
        name: "Energy Density (Volumetric)",
        baseline: 700.0,
        improved: 1100.0,
        unit: "Wh/l",
    },
    Comparison {
        name: "Process Steps",
        baseline: 100.0,
        improved: 66.0,
        unit: "%",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyMetric {
    pub label: &'static str,
    pub value: &'static str,
    pub unit: Option<&'static str>,
    pub description: &'static str,
}

pub const KEY_METRICS: [KeyMetric; 4] = [
    KeyMetric {
        label: "Cost Reduction",
        value: "27%",
        unit: None,
        description: "Lower BoM & OpEx",
    },
    KeyMetric {
        label: "Energy Density",
        value: ">1100",
        unit: Some("Wh/l"),
        description: "Volumetric Density",
    },
    KeyMetric {
        label: "Stability",
        value: ">5V",
        unit: None,
        description: "Vs. Lithium",
    },
    KeyMetric {
        label: "Timeline",
        value: "30mo",
        unit: None,
        description: "To scaled prototype",
    },
];

/// One entry of a dashboard feature card. `accent` colours the heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardItem {
    pub heading: &'static str,
    pub detail: &'static str,
    pub accent: Option<Rgb>,
}

/// A titled card of short points shown beside the key metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureCard {
    pub title: &'static str,
    pub subtitle: Option<&'static str>,
    pub items: &'static [CardItem],
    /// Closing remark under a divider.
    pub note: Option<&'static str>,
    /// Drawn light-on-dark with the items as side-by-side tiles.
    pub dark: bool,
}

pub const MANUFACTURING_CARD: FeatureCard = FeatureCard {
    title: "Manufacturing Advantages",
    subtitle: Some("Streamlined production process"),
    items: &[
        CardItem {
            heading: "No Anode Casting",
            detail: "Eliminates one of the most capital-intensive steps in traditional Li-Ion manufacturing.",
            accent: None,
        },
        CardItem {
            heading: "No Degassing or Aging",
            detail: "Removes bottlenecks that typically require weeks of inventory hold time.",
            accent: None,
        },
    ],
    note: None,
    dark: false,
};

pub const MATERIAL_CARD: FeatureCard = FeatureCard {
    title: "Material Innovation",
    subtitle: None,
    items: &[
        CardItem {
            heading: "ExpGr",
            detail: "Expanded Graphite Interlayers for sub-nano diffusion control.",
            accent: Some(Rgb::from_u8(0x60, 0xA5, 0xFA)),
        },
        CardItem {
            heading: "RedGO",
            detail: "Reduced Graphite Oxide tuned for oxygen content & capacity.",
            accent: Some(Rgb::from_u8(0xC0, 0x84, 0xFC)),
        },
    ],
    note: Some(
        "Graphite is more stable than Li-metal. JES optimizes it for fast-charging while maintaining safety.",
    ),
    dark: true,
};

pub const FEATURE_CARDS: [FeatureCard; 2] = [MANUFACTURING_CARD, MATERIAL_CARD];

pub const FOOTER_TITLE: &str = "Johnson Energy Storage Technology Explorer";
pub const FOOTER_NOTE: &str = "Visualization based on technical presentations regarding Oxy-Sulfide Glass Electrolytes. \
Data sources: JES Glass Battery Seminar & Exhibit. \
Comparisons are estimated based on scaled production projections.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Bars grow rightward from the left edge.
    Horizontal,
    /// Bars grow upward from the bottom edge.
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub comparison: Comparison,
    pub orientation: Orientation,
    pub improved_color: Rgb,
    /// Preferred bar thickness in pixels.
    pub bar_size: f32,
    pub baseline_legend: &'static str,
    pub improved_legend: &'static str,
}

pub const COST_CHART: ChartSpec = ChartSpec {
    title: "Cost Comparison",
    subtitle: "Estimated production cost at scale ($/kWh)",
    comparison: COMPARISONS[0],
    orientation: Orientation::Horizontal,
    improved_color: Rgb::from_u8(0x3B, 0x82, 0xF6),
    bar_size: 30.0,
    baseline_legend: "Li-Ion ($101/kWh)",
    improved_legend: "JES ($74/kWh)",
};

pub const DENSITY_CHART: ChartSpec = ChartSpec {
    title: "Energy Density",
    subtitle: "Volumetric Density (Wh/l)",
    comparison: COMPARISONS[1],
    orientation: Orientation::Vertical,
    improved_color: Rgb::from_u8(0xF9, 0x73, 0x16),
    bar_size: 60.0,
    baseline_legend: "~700 Wh/l",
    improved_legend: ">1100 Wh/l",
};

pub const CHARTS: [ChartSpec; 2] = [COST_CHART, DENSITY_CHART];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub rect: Rect,
    pub value: f32,
    pub color: Rgb,
    pub series: &'static str,
}

/// Headroom above the larger value so bars never touch the far edge.
const AXIS_HEADROOM: f32 = 1.1;
const BAR_GAP: f32 = 8.0;

/// Lay out the baseline and improved bars of `chart` inside `area`.
pub fn layout_bars(chart: &ChartSpec, area: Rect) -> Vec<Bar> {
    let comparison = chart.comparison;
    let max_value = comparison.baseline.max(comparison.improved) * AXIS_HEADROOM;
    if max_value <= 0.0 || area.width <= 0.0 || area.height <= 0.0 {
        return Vec::new();
    }
    let series = [
        (comparison.baseline, BASELINE_COLOR, BASELINE_NAME),
        (comparison.improved, chart.improved_color, IMPROVED_NAME),
    ];
    let cross_extent = match chart.orientation {
        Orientation::Horizontal => area.height,
        Orientation::Vertical => area.width,
    };
    let thickness = chart
        .bar_size
        .min((cross_extent - BAR_GAP) / 2.0)
        .max(1.0);
    let group = thickness * 2.0 + BAR_GAP;
    let start = (cross_extent - group) * 0.5;

    series
        .iter()
        .enumerate()
        .map(|(slot, &(value, color, name))| {
            let fraction = (value / max_value).clamp(0.0, 1.0);
            let along = start + slot as f32 * (thickness + BAR_GAP);
            let rect = match chart.orientation {
                Orientation::Horizontal => {
                    Rect::new(area.x, area.y + along, area.width * fraction, thickness)
                }
                Orientation::Vertical => {
                    let height = area.height * fraction;
                    Rect::new(area.x + along, area.bottom() - height, thickness, height)
                }
            };
            Bar {
                rect,
                value,
                color,
                series: name,
            }
        })
        .collect()
}
