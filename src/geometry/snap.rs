use std::fmt;
use std::num::NonZeroU32;

use crate::error::ConfigError;

pub const DEFAULT_GRID_SIZE: u32 = 10;

/// Grid spacing in image pixels. Zero is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize(NonZeroU32);

impl GridSize {
    pub fn new(size: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(size)
            .map(Self)
            .ok_or(ConfigError::InvalidGridSize(size))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_GRID_SIZE).unwrap_or(NonZeroU32::MIN))
    }
}

/// How raw coordinates are quantized before they reach the guide store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SnapMode {
    Off,
    #[default]
    Pixel,
    Grid(GridSize),
}

impl SnapMode {
    /// Builds a grid mode, rejecting a zero grid size.
    pub fn grid(size: u32) -> Result<Self, ConfigError> {
        GridSize::new(size).map(SnapMode::Grid)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SnapMode::Off => "Off",
            SnapMode::Pixel => "Pixel",
            SnapMode::Grid(_) => "Grid",
        }
    }
}

impl fmt::Display for SnapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapMode::Off | SnapMode::Pixel => f.write_str(self.label()),
            SnapMode::Grid(size) => write!(f, "Grid ({} px)", size.get()),
        }
    }
}

/// Quantizes `raw_y` according to `mode`. Rounds half away from zero.
pub fn snap(raw_y: f64, mode: SnapMode) -> f64 {
    match mode {
        SnapMode::Off => raw_y,
        SnapMode::Pixel => raw_y.round(),
        SnapMode::Grid(size) => {
            let step = f64::from(size.get());
            (raw_y / step).round() * step
        }
    }
}

/// Clamps `value` into `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_off_is_identity() {
        assert_eq!(snap(17.25, SnapMode::Off), 17.25);
        assert_eq!(snap(-3.5, SnapMode::Off), -3.5);
    }

    #[test]
    fn test_snap_pixel_rounds() {
        assert_eq!(snap(17.4, SnapMode::Pixel), 17.0);
        assert_eq!(snap(17.5, SnapMode::Pixel), 18.0);
        assert_eq!(snap(-5.0, SnapMode::Pixel), -5.0);
    }

    #[test]
    fn test_snap_grid_rounds_to_nearest_multiple() {
        let grid = SnapMode::grid(10).unwrap();
        assert_eq!(snap(17.0, grid), 20.0);
        assert_eq!(snap(14.9, grid), 10.0);
        assert_eq!(snap(0.0, grid), 0.0);

        let grid = SnapMode::grid(25).unwrap();
        assert_eq!(snap(60.0, grid), 50.0);
        assert_eq!(snap(63.0, grid), 75.0);
    }

    #[test]
    fn test_zero_grid_is_rejected() {
        assert_eq!(SnapMode::grid(0), Err(ConfigError::InvalidGridSize(0)));
        assert_eq!(GridSize::new(0), Err(ConfigError::InvalidGridSize(0)));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-5.0, 0.0, 100.0), 0.0);
        assert_eq!(clamp(150.0, 0.0, 100.0), 100.0);
        assert_eq!(clamp(42.0, 0.0, 100.0), 42.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(SnapMode::Pixel.to_string(), "Pixel");
        assert_eq!(SnapMode::grid(8).unwrap().to_string(), "Grid (8 px)");
        assert_eq!(GridSize::default().get(), DEFAULT_GRID_SIZE);
    }
}
