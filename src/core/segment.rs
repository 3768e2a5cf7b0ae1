//! Ein Pfadsegment: konstante Winkeländerung über eine feste Länge.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Ein Abschnitt des Streckenpfads.
///
/// `pos` und `anchor` sind abgeleitete Werte und werden bei jeder
/// Integration neu geschrieben; editierbar sind nur `angle_inc` und `length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathSegment {
    /// Startsample dieses Segments (Index in die Sample-Arrays)
    pub pos: i32,
    /// Winkeländerung pro Sample in 1/10000 der Winkeleinheit (0 = gerade)
    pub angle_inc: i32,
    /// Länge des Segments in Samples
    pub length: i32,
    /// Gecachter Render-Anker: Weltkoordinate des Startsamples
    pub anchor: IVec2,
}

impl PathSegment {
    /// Erstellt ein Segment; Position und Anker setzt die Integration.
    pub fn new(angle_inc: i32, length: i32) -> Self {
        Self {
            pos: 0,
            angle_inc,
            length,
            anchor: IVec2::ZERO,
        }
    }

    /// Endsample (exklusiv) dieses Segments.
    pub fn end(&self) -> i32 {
        self.pos + self.length
    }
}
