use std::fmt;

use palette::{LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color stops
// ---------------------------------------------------------------------------

/// A color pinned at a normalized position in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f64,
    pub color: Srgb<u8>,
}

impl ColorStop {
    pub const fn new(position: f64, r: u8, g: u8, b: u8) -> Self {
        ColorStop {
            position,
            color: Srgb::new(r, g, b),
        }
    }
}

const DARK_BLUE: (u8, u8, u8) = (0, 0, 139);
const GREEN: (u8, u8, u8) = (0, 128, 0);
const ORANGE: (u8, u8, u8) = (255, 165, 0);
const DARK_RED: (u8, u8, u8) = (139, 0, 0);

/// Sample points of the perceptual scales (matplotlib definitions).
const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

const PLASMA: [(u8, u8, u8); 9] = [
    (13, 8, 135),
    (84, 2, 163),
    (139, 10, 165),
    (185, 50, 137),
    (219, 92, 104),
    (244, 136, 73),
    (254, 188, 43),
    (252, 206, 37),
    (240, 249, 33),
];

const CIVIDIS: [(u8, u8, u8); 9] = [
    (0, 32, 77),
    (0, 52, 110),
    (57, 72, 108),
    (87, 92, 109),
    (112, 113, 115),
    (138, 134, 120),
    (167, 157, 117),
    (198, 181, 104),
    (234, 208, 83),
];

// ---------------------------------------------------------------------------
// Scales
// ---------------------------------------------------------------------------

/// Built-in continuous color scales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContinuousScale {
    #[default]
    Viridis,
    Plasma,
    Cividis,
}

impl ContinuousScale {
    pub const ALL: [ContinuousScale; 3] = [
        ContinuousScale::Viridis,
        ContinuousScale::Plasma,
        ContinuousScale::Cividis,
    ];

    fn samples(self) -> &'static [(u8, u8, u8)] {
        match self {
            ContinuousScale::Viridis => &VIRIDIS,
            ContinuousScale::Plasma => &PLASMA,
            ContinuousScale::Cividis => &CIVIDIS,
        }
    }

    /// Evenly spaced stops over `[0, 1]`.
    pub fn stops(self) -> Vec<ColorStop> {
        let samples = self.samples();
        let last = (samples.len() - 1) as f64;
        samples
            .iter()
            .enumerate()
            .map(|(i, &(r, g, b))| ColorStop::new(i as f64 / last, r, g, b))
            .collect()
    }
}

impl fmt::Display for ContinuousScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContinuousScale::Viridis => "Viridis",
            ContinuousScale::Plasma => "Plasma",
            ContinuousScale::Cividis => "Cividis",
        };
        f.write_str(name)
    }
}

/// Maps a normalized value in `[0, 1]` to a color.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    Continuous(ContinuousScale),
    /// Custom ramp; stops sorted by position.
    Ramp(Vec<ColorStop>),
}

impl Default for ColorScale {
    fn default() -> Self {
        ColorScale::Continuous(ContinuousScale::default())
    }
}

impl ColorScale {
    /// Efficiency ramp: dark blue at 0, green at 0.5, orange at 0.7 and dark
    /// red from 0.9 up.
    pub fn emission_ramp() -> Self {
        let stop = |p: f64, (r, g, b): (u8, u8, u8)| ColorStop::new(p, r, g, b);
        ColorScale::Ramp(vec![
            stop(0.0, DARK_BLUE),
            stop(0.5, GREEN),
            stop(0.7, ORANGE),
            stop(0.9, DARK_RED),
            stop(1.0, DARK_RED),
        ])
    }

    /// Build a ramp from arbitrary stops; positions are clamped to `[0, 1]`
    /// and sorted. An empty list falls back to the default scale.
    pub fn ramp(mut stops: Vec<ColorStop>) -> Self {
        if stops.is_empty() {
            return ColorScale::default();
        }
        for s in &mut stops {
            s.position = if s.position.is_nan() { 0.0 } else { s.position.clamp(0.0, 1.0) };
        }
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        ColorScale::Ramp(stops)
    }

    pub fn stops(&self) -> Vec<ColorStop> {
        match self {
            ColorScale::Continuous(scale) => scale.stops(),
            ColorScale::Ramp(stops) => stops.clone(),
        }
    }

    /// Color at normalized position `t`.
    ///
    /// `t` is clamped into `[0, 1]`; NaN maps to the first stop. Between stops
    /// the color is mixed linearly in linear RGB.
    pub fn color_at(&self, t: f64) -> Srgb<u8> {
        let stops = self.stops();
        interpolate_stops(&stops, t)
    }

    /// Color for a value inside `[min, max]`.
    pub fn color_for_value(&self, value: f64, min: f64, max: f64) -> Srgb<u8> {
        let span = max - min;
        let t = if span > 0.0 { (value - min) / span } else { 0.0 };
        self.color_at(t)
    }

    pub fn label(&self) -> String {
        match self {
            ColorScale::Continuous(scale) => scale.to_string(),
            ColorScale::Ramp(_) => "Emission ramp".to_string(),
        }
    }
}

/// Serializable choice among the built-in scales and the emission ramp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScaleKind {
    #[default]
    Viridis,
    Plasma,
    Cividis,
    EmissionRamp,
}

impl ColorScaleKind {
    pub const ALL: [ColorScaleKind; 4] = [
        ColorScaleKind::Viridis,
        ColorScaleKind::Plasma,
        ColorScaleKind::Cividis,
        ColorScaleKind::EmissionRamp,
    ];

    pub fn scale(self) -> ColorScale {
        match self {
            ColorScaleKind::Viridis => ColorScale::Continuous(ContinuousScale::Viridis),
            ColorScaleKind::Plasma => ColorScale::Continuous(ContinuousScale::Plasma),
            ColorScaleKind::Cividis => ColorScale::Continuous(ContinuousScale::Cividis),
            ColorScaleKind::EmissionRamp => ColorScale::emission_ramp(),
        }
    }

    pub fn label(self) -> String {
        self.scale().label()
    }
}

fn interpolate_stops(stops: &[ColorStop], t: f64) -> Srgb<u8> {
    let Some(first) = stops.first() else {
        return Srgb::new(128, 128, 128);
    };
    if t.is_nan() || t <= first.position {
        return first.color;
    }
    let t = t.min(1.0);

    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.position {
            let span = hi.position - lo.position;
            if span <= 0.0 || t == hi.position {
                return hi.color;
            }
            let f = ((t - lo.position) / span) as f32;
            let a: LinSrgb = lo.color.into_format::<f32>().into_linear();
            let b: LinSrgb = hi.color.into_format::<f32>().into_linear();
            let encoded: Srgb = Srgb::from_linear(a.mix(b, f));
            return encoded.into_format();
        }
    }

    stops[stops.len() - 1].color
}
