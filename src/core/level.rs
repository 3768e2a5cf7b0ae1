//! Ein einzelnes Level: Control-Point-Listen, Palettenzuordnung und die
//! daraus abgeleitete Geometrie.
//!
//! Die Segmentliste gehört dem Level bewusst NICHT — Endsektionen teilen
//! sich einen Pfad, deshalb liegt sie im [`LevelSet`](crate::core::level_set::LevelSet)
//! und wird jeder Operation explizit übergeben.

use serde::{Deserialize, Serialize};

use crate::core::control_point::{ControlPoint, ControlPointList};
use crate::core::geometry::{TrackGeometry, LEVEL_LENGTH};
use crate::core::segment::PathSegment;
use crate::error::{TrackError, TrackResult};

/// Standard-Startbreite eines Levels.
pub const START_WIDTH: i32 = 0xD4;

/// Breitere Startbreite des ersten Levels (doppelte Startgerade).
pub const START_WIDTH_L1: i32 = 0x1C2;

/// Länge des Standardsegments beim Einfügen an Position 0.
const DEFAULT_SEGMENT_LENGTH: i32 = 200;

/// Sektionstyp; bestimmt Kapazität und Exportformat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    /// Normales Level fester Länge
    Normal,
    /// Zieleinlauf; alle Endsektionen teilen sich einen Pfad
    End,
    /// Streckengabelung am Checkpoint
    Split,
}

impl SectionKind {
    /// Maximale Sektion-Länge in Samples.
    pub fn capacity(self) -> usize {
        match self {
            SectionKind::Normal => LEVEL_LENGTH,
            SectionKind::End => 400,
            SectionKind::Split => 440,
        }
    }
}

/// Level-Datensatz mit abgeleiteter Geometrie.
#[derive(Debug, Clone)]
pub struct TrackLevel {
    kind: SectionKind,
    pub start_width: i32,
    pub width_points: ControlPointList,
    pub height_points: ControlPointList,
    pub scenery_points: ControlPointList,
    /// Index in die gemeinsame Himmelspaletten-Tabelle
    pub sky_pal: i32,
    /// Index in die gemeinsame Bodenpaletten-Tabelle
    pub gnd_pal: i32,
    /// Index in die gemeinsame Fahrbahnpaletten-Tabelle
    pub road_pal: i32,
    geometry: TrackGeometry,
}

impl TrackLevel {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            start_width: START_WIDTH,
            width_points: ControlPointList::new(),
            height_points: ControlPointList::new(),
            scenery_points: ControlPointList::new(),
            sky_pal: 0,
            gnd_pal: 0,
            road_pal: 0,
            geometry: TrackGeometry::new(kind.capacity()),
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn geometry(&self) -> &TrackGeometry {
        &self.geometry
    }

    /// Setzt Listen, Paletten und Startbreite zurück. Der Pfad bleibt
    /// unangetastet, weil er geteilt sein kann.
    pub fn clear(&mut self) {
        self.width_points.clear();
        self.height_points.clear();
        self.scenery_points.clear();
        self.sky_pal = 0;
        self.gnd_pal = 0;
        self.road_pal = 0;
        self.start_width = START_WIDTH;
    }

    /// Integriert die Segmentliste neu; nach jedem Edit aufzurufen.
    pub fn update_track(&mut self, segments: &mut [PathSegment]) {
        self.geometry
            .update_path_data(segments, self.start_width, &self.width_points);
    }

    /// Nur die Fahrbahnkanten neu berechnen (nach Breiten-Edits).
    pub fn update_width(&mut self) {
        self.geometry
            .update_width_data(self.start_width, &self.width_points);
    }

    fn total_length(segments: &[PathSegment]) -> i32 {
        segments.iter().map(|s| s.length).sum()
    }

    fn check_capacity(&self, requested: i32) -> TrackResult<()> {
        let capacity = self.kind.capacity() as i32;
        if requested > capacity {
            log::warn!("Edit abgewiesen: {requested} Samples bei Kapazität {capacity}");
            return Err(TrackError::CapacityExceeded {
                requested,
                capacity,
            });
        }
        Ok(())
    }

    // ─── Pfad-Operationen ───────────────────────────────────────────────

    /// Fügt vor `index` ein Segment ein: Klon des Vorgängers, an Position 0
    /// ein gerades Standardsegment. Alle drei Listen rücken hinter der
    /// Einfügestelle mit.
    pub fn insert_path_segment(
        &mut self,
        segments: &mut Vec<PathSegment>,
        index: usize,
    ) -> TrackResult<()> {
        if index > segments.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: segments.len(),
            });
        }

        let new_segment = if index == 0 {
            PathSegment::new(0, DEFAULT_SEGMENT_LENGTH)
        } else {
            segments[index - 1]
        };

        self.check_capacity(Self::total_length(segments) + new_segment.length)?;

        let insert_sample = if index == 0 {
            0
        } else {
            segments[index - 1].end()
        };

        segments.insert(index, new_segment);

        self.width_points.shift_after(insert_sample, new_segment.length);
        self.height_points.shift_after(insert_sample, new_segment.length);
        self.scenery_points.shift_after(insert_sample, new_segment.length);

        self.update_track(segments);
        Ok(())
    }

    /// Entfernt das Segment am Index samt aller Control-Points in seinem
    /// Bereich; nachfolgende Punkte rücken auf.
    pub fn delete_path_segment(
        &mut self,
        segments: &mut Vec<PathSegment>,
        index: usize,
    ) -> TrackResult<()> {
        if index >= segments.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: segments.len(),
            });
        }

        let segment = segments.remove(index);

        self.width_points
            .remove_range_and_shift(segment.pos, segment.end(), segment.length);
        self.height_points
            .remove_range_and_shift(segment.pos, segment.end(), segment.length);
        self.scenery_points
            .remove_range_and_shift(segment.pos, segment.end(), segment.length);

        self.update_track(segments);
        Ok(())
    }

    /// Ändert die Länge eines Segments. Beim Kürzen verschwinden die
    /// Control-Points im abgeschnittenen Bereich, beim Verlängern rückt
    /// alles hinter dem alten Segmentende nach hinten.
    pub fn resize_path_segment(
        &mut self,
        segments: &mut [PathSegment],
        index: usize,
        new_length: i32,
    ) -> TrackResult<()> {
        if index >= segments.len() {
            return Err(TrackError::IndexOutOfRange {
                index,
                len: segments.len(),
            });
        }

        let old_length = segments[index].length;
        if new_length == old_length {
            return Ok(());
        }

        let pos = segments[index].pos;

        if new_length < old_length {
            let change = old_length - new_length;
            self.width_points
                .remove_range_and_shift(pos + new_length, pos + old_length, change);
            self.height_points
                .remove_range_and_shift(pos + new_length, pos + old_length, change);
            self.scenery_points
                .remove_range_and_shift(pos + new_length, pos + old_length, change);
        } else {
            let change = new_length - old_length;
            self.check_capacity(Self::total_length(segments) + change)?;
            self.width_points.shift_after(pos + old_length, change);
            self.height_points.shift_after(pos + old_length, change);
            self.scenery_points.shift_after(pos + old_length, change);
        }

        segments[index].length = new_length;
        self.update_track(segments);
        Ok(())
    }

    /// Teilt das Segment unter `sample` in zwei Segmente gleicher Krümmung.
    /// Gesamtlänge und Control-Points bleiben unverändert. Gibt den Index
    /// des neuen zweiten Teils zurück.
    pub fn split_path_segment(
        &mut self,
        segments: &mut Vec<PathSegment>,
        sample: i32,
    ) -> TrackResult<usize> {
        let index = segments
            .iter()
            .take_while(|s| s.pos < sample)
            .count()
            .checked_sub(1)
            .ok_or(TrackError::IndexOutOfRange {
                index: 0,
                len: segments.len(),
            })?;

        let segment = segments[index];
        if sample >= segment.end() {
            return Err(TrackError::IndexOutOfRange {
                index: sample as usize,
                len: segment.end() as usize,
            });
        }

        let first_length = sample - segment.pos;
        segments[index].length = first_length;

        let mut remainder = PathSegment::new(segment.angle_inc, segment.length - first_length);
        remainder.pos = sample;
        segments.insert(index + 1, remainder);

        self.update_track(segments);
        Ok(index + 1)
    }

    // ─── Control-Point-Operationen ──────────────────────────────────────

    /// Neuer Breitenpunkt an `pos`: Klon des Vorgängers oder
    /// Startbreite mit Standard-Rampe.
    pub fn insert_width_point(&mut self, pos: i32) -> usize {
        let basis = self
            .width_points
            .basis_before(pos)
            .copied()
            .unwrap_or(ControlPoint::new(0, self.start_width, 64));
        self.width_points
            .insert_sorted(ControlPoint::new(pos, basis.value1, basis.value2))
    }

    /// Neuer Höhenpunkt an `pos`: Klon des Vorgängers oder flaches Profil.
    pub fn insert_height_point(&mut self, pos: i32) -> usize {
        let basis = self
            .height_points
            .basis_before(pos)
            .copied()
            .unwrap_or(ControlPoint::new(0, 0, 0));
        self.height_points
            .insert_sorted(ControlPoint::new(pos, basis.value1, basis.value2))
    }

    /// Neuer Szeneriepunkt an `pos`: Klon des Vorgängers oder leeres Muster.
    pub fn insert_scenery_point(&mut self, pos: i32) -> usize {
        let basis = self
            .scenery_points
            .basis_before(pos)
            .copied()
            .unwrap_or(ControlPoint::new(0, 0xFF, 0));
        self.scenery_points
            .insert_sorted(ControlPoint::new(pos, basis.value1, basis.value2))
    }
}
