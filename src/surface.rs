//! Renderable description of an efficiency surface.
//!
//! A [`Surface`] pairs a finished [`Grid`] with the labels and color scale a
//! renderer needs. The only computation here is color lookup.

use palette::Srgb;

use crate::analysis::efficiency::{EFFICIENCY_MAX, EFFICIENCY_MIN};
use crate::analysis::Grid;
use crate::color::ColorScale;
use crate::data::model::Pollutant;

pub const X_AXIS_TITLE: &str = "Flow (m³/h)";
pub const Y_AXIS_TITLE: &str = "Catalyst temperature (°C)";
pub const Z_AXIS_TITLE: &str = "Conversion efficiency (%)";

/// Surface opacity used by renderers that blend.
pub const DEFAULT_OPACITY: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub pollutant: Pollutant,
    pub title: String,
    pub grid: Grid,
    pub color_scale: ColorScale,
    /// Fixed value range of the color axis.
    pub z_range: (f64, f64),
    pub opacity: f32,
}

impl Surface {
    pub fn build(pollutant: Pollutant, grid: Grid, color_scale: ColorScale) -> Self {
        Surface {
            pollutant,
            title: format!("{} conversion efficiency", pollutant.label()),
            grid,
            color_scale,
            z_range: (EFFICIENCY_MIN, EFFICIENCY_MAX),
            opacity: DEFAULT_OPACITY,
        }
    }

    /// Color of a raw efficiency value on this surface's scale.
    pub fn color_for(&self, value: f64) -> Srgb<u8> {
        self.color_scale
            .color_for_value(value, self.z_range.0, self.z_range.1)
    }

    /// Color of grid cell `(row, col)`.
    pub fn cell_color(&self, row: usize, col: usize) -> Srgb<u8> {
        self.color_for(self.grid.z()[row][col])
    }
}
