//! Gemeinsame Farbpaletten-Tabellen.
//!
//! Himmel, Boden und Fahrbahn sind globale Tabellen, auf die Levels per
//! Index zeigen. Die Einträge sind für diesen Kern opak (rohe
//! Hardware-Farbworte) — bearbeitet werden sie vom Paletteneditor,
//! gefüllt vom ROM-Import.

use serde::{Deserialize, Serialize};

pub const SKY_PALS: usize = 15;
pub const SKY_LENGTH: usize = 32;
pub const GND_PALS: usize = 16;
pub const GND_LENGTH: usize = 8;
pub const ROAD_PALS: usize = 18;
pub const ROAD_LENGTH: usize = 8;

/// Indizes in die acht Fahrbahnfarben eines Levels.
pub const ROAD1: usize = 0;
pub const SIDE1: usize = 1;
pub const STRIPE1: usize = 2;
pub const CENTRE1: usize = 3;
pub const ROAD2: usize = 4;
pub const SIDE2: usize = 5;
pub const STRIPE2: usize = 6;
pub const CENTRE2: usize = 7;

/// Globale Paletten-Tabellen eines Projekts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteTable {
    pub sky: [[u32; SKY_LENGTH]; SKY_PALS],
    pub gnd: [[u32; GND_LENGTH]; GND_PALS],
    pub road: [[u32; ROAD_LENGTH]; ROAD_PALS],
}

impl Default for PaletteTable {
    fn default() -> Self {
        Self {
            sky: [[0; SKY_LENGTH]; SKY_PALS],
            gnd: [[0; GND_LENGTH]; GND_PALS],
            road: [[0; ROAD_LENGTH]; ROAD_PALS],
        }
    }
}
