//! Generische geordnete Positionsliste für Breiten-, Höhen- und Szenerie-Punkte.

use serde::{Deserialize, Serialize};

use crate::error::{TrackError, TrackResult};

/// Ein Control-Point: markiert, wo sich ein skalarer Verlauf ändert.
///
/// Die Bedeutung von `value1`/`value2` hängt von der Liste ab:
/// - Breite: Zielbreite / Rampengeschwindigkeit
/// - Höhe: Index in die Höhenprofil-Bibliothek / ungenutzt
/// - Szenerie: Sprite-Anzahl / Index in die Szenerie-Bibliothek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Position der Änderung (Index in die Sample-Arrays)
    pub pos: i32,
    pub value1: i32,
    pub value2: i32,
}

impl ControlPoint {
    pub fn new(pos: i32, value1: i32, value2: i32) -> Self {
        Self { pos, value1, value2 }
    }
}

/// Nach `pos` aufsteigend geordnete Liste von Control-Points.
///
/// Alle drei Listen eines Levels (Breite, Höhe, Szenerie) laufen über diesen
/// Typ, damit Pfad-Edits sie mit derselben Shift/Delete-Routine konsistent
/// halten — die Quelle dupliziert diese Schleifen pro Liste.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPointList {
    points: Vec<ControlPoint>,
}

impl ControlPointList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ControlPoint> {
        self.points.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ControlPoint> {
        self.points.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ControlPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Hängt einen Punkt unverändert an; für Decoder, deren Datensätze
    /// bereits in Positionsreihenfolge vorliegen.
    pub fn push(&mut self, cp: ControlPoint) {
        self.points.push(cp);
    }

    /// Fügt sortiert ein und gibt den Einfügeindex zurück.
    /// Bei Positionsgleichheit landet der neue Punkt vor den vorhandenen.
    pub fn insert_sorted(&mut self, cp: ControlPoint) -> usize {
        let index = self
            .points
            .iter()
            .take_while(|p| p.pos < cp.pos)
            .count();
        self.points.insert(index, cp);
        index
    }

    /// Entfernt den Punkt am Index.
    pub fn remove(&mut self, index: usize) -> TrackResult<ControlPoint> {
        if index >= self.points.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(self.points.remove(index))
    }

    /// Letzter Punkt vor `pos`; dient als Basis für neue Punkte.
    pub fn basis_before(&self, pos: i32) -> Option<&ControlPoint> {
        let index = self.points.iter().take_while(|p| p.pos < pos).count();
        index.checked_sub(1).and_then(|i| self.points.get(i))
    }

    /// Verschiebt alle Punkte hinter `start_pos` um `change`.
    pub fn shift_after(&mut self, start_pos: i32, change: i32) {
        for p in &mut self.points {
            if p.pos > start_pos {
                p.pos += change;
            }
        }
    }

    /// Entfernt alle Punkte in `[start_pos, end_pos)` und verschiebt die
    /// verbleibenden Punkte hinter `start_pos` um `-change`.
    pub fn remove_range_and_shift(&mut self, start_pos: i32, end_pos: i32, change: i32) {
        self.points.retain(|p| p.pos < start_pos || p.pos >= end_pos);
        self.shift_after(start_pos, -change);
    }
}

impl<'a> IntoIterator for &'a ControlPointList {
    type Item = &'a ControlPoint;
    type IntoIter = std::slice::Iter<'a, ControlPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<ControlPoint> for ControlPointList {
    fn from_iter<I: IntoIterator<Item = ControlPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
