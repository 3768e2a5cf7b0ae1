//! Szenerie-Bibliothek: wiederverwendbare Sprite-Muster am Streckenrand.
//!
//! Ein Szenerie-Control-Point referenziert per `value2` ein Muster dieser
//! globalen Bibliothek; `value1` gibt an, wie viele Samples lang es
//! wiederholt wird.

use serde::{Deserialize, Serialize};

/// Anzahl der Muster in der Original-Bibliothek.
pub const SCENERY_ENTRIES: usize = 230;

/// Ein einzelnes Sprite innerhalb eines Musters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenerySprite {
    /// Draw-Flags der Hardware (Spiegelung, Shadow, Priorität)
    pub props: i32,
    /// Horizontaler Versatz von der Streckenmitte
    pub x: i32,
    /// Vertikaler Versatz
    pub y: i32,
    /// Sprite-Typ (Index in die Grafikbank)
    pub kind: i32,
    /// Palettenindex des Sprites
    pub pal: i32,
}

/// Ein Sprite-Muster; `frequency` steuert, jedes wievielte Sample die
/// Hardware das Muster zeichnet (Bitmaske).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneryPattern {
    pub frequency: i32,
    pub sprites: Vec<ScenerySprite>,
}
