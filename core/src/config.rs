use serde::{Deserialize, Serialize};

use crate::{Coord, Error, GoBoard, Player, Result, TileBoard};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicTacToeConfig {
    pub first_player: Player,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Tiles per side.
    pub width: Coord,
    /// Seed for the shuffle.
    pub seed: u64,
}

impl TileConfig {
    pub fn new(width: Coord, seed: u64) -> Self {
        let clamped = width.clamp(TileBoard::MIN_WIDTH, TileBoard::MAX_WIDTH);
        if clamped != width {
            log::warn!("Tile board width {} out of range, using {}", width, clamped);
        }
        Self {
            width: clamped,
            seed,
        }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            width: TileBoard::DEFAULT_WIDTH,
            seed: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoConfig {
    pub width: Coord,
    pub seed: u64,
    /// Share of intersections the demo board gives to white.
    pub white_ratio: f64,
}

impl GoConfig {
    pub fn new(width: Coord, seed: u64, white_ratio: f64) -> Self {
        let clamped = width.clamp(GoBoard::MIN_WIDTH, GoBoard::MAX_WIDTH);
        if clamped != width {
            log::warn!("Go board width {} out of range, using {}", width, clamped);
        }
        let white_ratio = if white_ratio.is_nan() {
            log::warn!("Go white ratio is NaN, using default");
            Self::default().white_ratio
        } else {
            white_ratio.clamp(0.0, 1.0)
        };
        Self {
            width: clamped,
            seed,
            white_ratio,
        }
    }
}

impl Default for GoConfig {
    fn default() -> Self {
        Self {
            width: GoBoard::DEFAULT_WIDTH,
            seed: 0,
            white_ratio: 0.7,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub default_rating: u8,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { default_rating: 5 }
    }
}

/// Settings for every demo page, usually parsed from a JSON blob handed over
/// by the host page.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub tictactoe: TicTacToeConfig,
    pub tiles: TileConfig,
    pub go: GoConfig,
    pub toggle: ToggleConfig,
    /// Seed for the coin flips of the mock points data source.
    pub mock_seed: u64,
}

impl DemoConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| Error::InvalidConfig {
            line: err.line(),
            column: err.column(),
        })?;
        Ok(config.normalized())
    }

    /// Clamp every field into its supported range.
    pub fn normalized(self) -> Self {
        Self {
            tiles: TileConfig::new(self.tiles.width, self.tiles.seed),
            go: GoConfig::new(self.go.width, self.go.seed, self.go.white_ratio),
            ..self
        }
    }
}
