//! Verwaltung aller Sektionen eines Projekts.
//!
//! Pfade liegen in einer Arena und werden per [`PathId`] referenziert,
//! denn Endsektionen teilen sich einen gemeinsamen Master-Pfad: ein Edit
//! an einer Endsektion verformt alle. Es gibt keinen impliziten
//! "aktuellen Level"-Zustand; jede Operation benennt ihre Sektion explizit.

use serde::{Deserialize, Serialize};

use crate::core::control_point::ControlPoint;
use crate::core::level::{SectionKind, TrackLevel, START_WIDTH_L1};
use crate::core::segment::PathSegment;
use crate::error::{TrackError, TrackResult};

/// Anzahl der Stage-Slots der Streckenkarte: 15 normale Stages plus
/// 5 Zieleinläufe.
pub const MAP_SLOTS: usize = 20;

/// Anzahl der normalen Stage-Slots.
pub const NORMAL_STAGES: usize = 15;

/// Position des fest verdrahteten Checkpoint-Szeneriepunkts der Gabelung.
const SPLIT_CHECKPOINT_POS: i32 = 398;

/// Handle auf einen Pfad in der Arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathId(usize);

/// Alle Sektionen eines Projekts samt Stage-Zuordnung.
#[derive(Debug, Clone)]
pub struct LevelSet {
    paths: Vec<Vec<PathSegment>>,
    levels: Vec<TrackLevel>,
    level_paths: Vec<PathId>,
    end_levels: Vec<TrackLevel>,
    /// Von allen Endsektionen geteilter Master-Pfad
    end_path: PathId,
    split_level: TrackLevel,
    split_path: PathId,
    /// Stage-Zuordnung: Slots `0..NORMAL_STAGES` indizieren normale
    /// Levels, die restlichen Slots Endsektionen
    map: [usize; MAP_SLOTS],
    /// Startlinien-Grafik im ersten Level zeichnen
    pub display_start_line: bool,
}

impl LevelSet {
    /// Ein frisches Projekt: ein normales Level (mit der breiten
    /// Startgerade), eine Endsektion, die Gabelung mit ihrem festen
    /// Checkpoint-Szeneriepunkt.
    pub fn new() -> Self {
        let mut set = Self {
            paths: Vec::new(),
            levels: Vec::new(),
            level_paths: Vec::new(),
            end_levels: Vec::new(),
            end_path: PathId(0),
            split_level: TrackLevel::new(SectionKind::Split),
            split_path: PathId(0),
            map: [0; MAP_SLOTS],
            display_start_line: true,
        };

        let first = set.add_level();
        set.levels[first].start_width = START_WIDTH_L1;

        set.end_path = set.new_path();
        set.add_end_section();

        set.split_path = set.new_path();
        set.split_level
            .scenery_points
            .push(ControlPoint::new(SPLIT_CHECKPOINT_POS, 4, 0));

        set
    }

    fn new_path(&mut self) -> PathId {
        self.paths.push(Vec::new());
        PathId(self.paths.len() - 1)
    }

    // ─── Sektionen anlegen ──────────────────────────────────────────────

    /// Legt ein normales Level mit eigenem Pfad an; gibt den Index zurück.
    pub fn add_level(&mut self) -> usize {
        let path = self.new_path();
        self.levels.push(TrackLevel::new(SectionKind::Normal));
        self.level_paths.push(path);
        log::debug!("level {} angelegt", self.levels.len() - 1);
        self.levels.len() - 1
    }

    /// Legt eine Endsektion an; sie hängt am geteilten Master-Pfad.
    pub fn add_end_section(&mut self) -> usize {
        self.end_levels.push(TrackLevel::new(SectionKind::End));
        self.end_levels.len() - 1
    }

    // ─── Zugriff ────────────────────────────────────────────────────────

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn end_count(&self) -> usize {
        self.end_levels.len()
    }

    pub fn level(&self, index: usize) -> TrackResult<&TrackLevel> {
        self.levels.get(index).ok_or(TrackError::IndexOutOfRange {
            index,
            len: self.levels.len(),
        })
    }

    pub fn end_section(&self, index: usize) -> TrackResult<&TrackLevel> {
        self.end_levels
            .get(index)
            .ok_or(TrackError::IndexOutOfRange {
                index,
                len: self.end_levels.len(),
            })
    }

    pub fn split_section(&self) -> &TrackLevel {
        &self.split_level
    }

    pub fn level_segments(&self, index: usize) -> TrackResult<&[PathSegment]> {
        let id = *self
            .level_paths
            .get(index)
            .ok_or(TrackError::IndexOutOfRange {
                index,
                len: self.level_paths.len(),
            })?;
        Ok(&self.paths[id.0])
    }

    pub fn end_segments(&self) -> &[PathSegment] {
        &self.paths[self.end_path.0]
    }

    pub fn split_segments(&self) -> &[PathSegment] {
        &self.paths[self.split_path.0]
    }

    /// Level samt Segmentliste zum Editieren; der Split-Borrow ist nötig,
    /// weil jede Pfad-Operation beide Hälften gleichzeitig braucht.
    pub fn level_mut(
        &mut self,
        index: usize,
    ) -> TrackResult<(&mut TrackLevel, &mut Vec<PathSegment>)> {
        let len = self.levels.len();
        let id = *self
            .level_paths
            .get(index)
            .ok_or(TrackError::IndexOutOfRange { index, len })?;
        Ok((&mut self.levels[index], &mut self.paths[id.0]))
    }

    /// Endsektion samt geteiltem Master-Pfad.
    pub fn end_section_mut(
        &mut self,
        index: usize,
    ) -> TrackResult<(&mut TrackLevel, &mut Vec<PathSegment>)> {
        let len = self.end_levels.len();
        let level = self
            .end_levels
            .get_mut(index)
            .ok_or(TrackError::IndexOutOfRange { index, len })?;
        Ok((level, &mut self.paths[self.end_path.0]))
    }

    pub fn split_section_mut(&mut self) -> (&mut TrackLevel, &mut Vec<PathSegment>) {
        (&mut self.split_level, &mut self.paths[self.split_path.0])
    }

    /// Integriert nach einem Edit am Master-Pfad alle übrigen Endsektionen
    /// nach, damit deren abgeleitete Geometrie konsistent bleibt.
    pub fn refresh_end_sections(&mut self) {
        let path = &mut self.paths[self.end_path.0];
        for level in &mut self.end_levels {
            level.update_track(path);
        }
    }

    // ─── Stage-Zuordnung ────────────────────────────────────────────────

    /// Level-Index des Stage-Slots (normal oder Endsektion, je nach Slot).
    pub fn stage_mapping(&self, slot: usize) -> usize {
        self.map[slot]
    }

    /// Ordnet einem Stage-Slot eine Sektion zu.
    pub fn set_stage_mapping(&mut self, slot: usize, index: usize) -> TrackResult<()> {
        if slot >= MAP_SLOTS {
            return Err(TrackError::IndexOutOfRange {
                index: slot,
                len: MAP_SLOTS,
            });
        }
        let len = if slot < NORMAL_STAGES {
            self.levels.len()
        } else {
            self.end_levels.len()
        };
        if index >= len {
            return Err(TrackError::IndexOutOfRange { index, len });
        }
        self.map[slot] = index;
        Ok(())
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_layout() {
        let set = LevelSet::new();

        assert_eq!(set.level_count(), 1);
        assert_eq!(set.end_count(), 1);
        assert_eq!(set.level(0).unwrap().start_width, START_WIDTH_L1);
        assert!(set.display_start_line);

        // Gabelung trägt den festen Checkpoint
        let cp = set.split_section().scenery_points.get(0).unwrap();
        assert_eq!((cp.pos, cp.value1, cp.value2), (SPLIT_CHECKPOINT_POS, 4, 0));

        // Alle Slots zeigen auf die erste Sektion ihrer Art
        for slot in 0..MAP_SLOTS {
            assert_eq!(set.stage_mapping(slot), 0);
        }
    }

    #[test]
    fn test_end_sections_share_master_path() {
        let mut set = LevelSet::new();
        set.add_end_section();

        {
            let (level, path) = set.end_section_mut(0).unwrap();
            level.insert_path_segment(path, 0).unwrap();
            level.resize_path_segment(path, 0, 150).unwrap();
        }
        set.refresh_end_sections();

        // Der Edit an Sektion 0 ist auch über Sektion 1 sichtbar
        assert_eq!(set.end_segments().len(), 1);
        assert_eq!(set.end_segments()[0].length, 150);
        assert_eq!(set.end_section(1).unwrap().geometry().end_pos(), 150);
    }

    #[test]
    fn test_levels_have_independent_paths() {
        let mut set = LevelSet::new();
        let second = set.add_level();

        {
            let (level, path) = set.level_mut(0).unwrap();
            level.insert_path_segment(path, 0).unwrap();
        }

        assert_eq!(set.level_segments(0).unwrap().len(), 1);
        assert!(set.level_segments(second).unwrap().is_empty());
    }

    #[test]
    fn test_stage_mapping_bounds() {
        let mut set = LevelSet::new();
        assert!(set.set_stage_mapping(MAP_SLOTS, 0).is_err());
        assert!(set.set_stage_mapping(0, 1).is_err());

        let second = set.add_level();
        set.set_stage_mapping(3, second).unwrap();
        assert_eq!(set.stage_mapping(3), second);

        // Endslots indizieren Endsektionen, nicht Levels
        assert!(set.set_stage_mapping(NORMAL_STAGES, second).is_err());
    }
}
