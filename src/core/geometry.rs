//! Ableitung der dichten Sample-Arrays aus dem Control-Point-Modell.
//!
//! Die Integration reproduziert die Fixed-Point-Arithmetik der originalen
//! Arcade-Hardware Bit für Bit. Mehrere Konstanten hier sind kalibrierte
//! Werte aus dem Reverse-Engineering (`WIDTH_RAMP_STEP`, Suchbereich des
//! Winkelcodes); die Binärkompatibilität der Exporte hängt an ihrer exakten
//! Reproduktion.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::core::control_point::ControlPointList;
use crate::core::segment::PathSegment;

/// Fixed-Point-Darstellung von 1.0 (Q12).
pub const FIXED_ONE: i32 = 0x1000;

/// Feste Länge eines normalen Levels in Samples.
pub const LEVEL_LENGTH: usize = 0x79C;

/// Zusätzliche Samples, damit der verzögerte zweite Konsument über das
/// Levelende hinaus in den Horizont rendern kann. 90 * 4 Bytes.
pub const CPU1_EXTRA_LENGTH: usize = 90 * 4;

/// Level-Länge inklusive Look-Ahead.
pub const LEVEL_LENGTH_CPU1: usize = LEVEL_LENGTH + CPU1_EXTRA_LENGTH;

/// Feste Länge der Streckengabelung.
pub const SPLIT_LENGTH: usize = 384;

/// Gabelungs-Länge inklusive Look-Ahead (0x962 / 4 Positionen).
pub const SPLIT_LENGTH_CPU1: usize = SPLIT_LENGTH + CPU1_EXTRA_LENGTH;

/// Endsektions-Länge inklusive Look-Ahead (0x9C2 / 4 Positionen).
pub const END_LENGTH_CPU1: usize = 624;

/// Look-Ahead beim Plotten paralleler Fahrbahnkanten.
pub const EDGES_OFFSET: usize = 8;

/// Maximale Länge eines einzelnen Segments. Längere Segmente werden beim
/// Import geteilt; der Editor erzwingt die Grenze über seine Eingabefelder.
pub const SECTION_LENGTH_MAX: i32 = 350;

/// Maximaler Winkelcode eines Segments (Editor-Grenze, ±).
pub const SECTION_ANGLE_MAX: i32 = 252;

/// Skalierung der Breitenberechnung; erhöht die Genauigkeit der Parallelen.
const SCALE: i64 = 8;

/// Konstante Breite einer Einzelfahrbahn. Erst die Separation der beiden
/// Fahrbahnen erzeugt die Illusion einer variablen Streckenbreite.
const ROAD_WIDTH: i64 = 32 * SCALE;

/// Kalibrierte Rampenkonstante der Originalhardware.
const WIDTH_RAMP_STEP: i64 = 0xD5;

/// Ab dieser Breite gelten die Fahrbahnen als vollständig getrennt.
const SPLIT_THRESHOLD: i64 = 250 * SCALE;

/// Innenabstand beim Begrenzungsrechteck des gerenderten Pfads.
const BOUNDS_PADDING: i32 = 40;

/// Fahrbahnkanten an einem einzelnen Sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthRender {
    /// Fahrbahnen sind an diesem Punkt getrennt; der Renderer kann die
    /// innere Trennlinie überspringen.
    pub split: bool,
    pub road1_lhs: IVec2,
    pub road1_rhs: IVec2,
    pub road2_lhs: IVec2,
    pub road2_rhs: IVec2,
}

/// Abgeleitete dichte Geometrie eines Levels.
///
/// Wird bei jedem Pfad-Edit vollständig neu berechnet — bei ≈2000 Samples
/// und menschlichem Editiertempo ist kein inkrementelles Update nötig.
#[derive(Debug, Clone)]
pub struct TrackGeometry {
    /// Kapazität der Sektion in Samples
    capacity: usize,
    /// Richtungssamples `(sin, cos) * FIXED_ONE`
    path: Vec<IVec2>,
    /// Weltkoordinaten der Mittellinie (Präfixsumme der Richtungen)
    path_render: Vec<IVec2>,
    /// Fahrbahnkanten pro Sample
    width_render: Vec<WidthRender>,
    /// Endsample des Levels (immer <= Kapazität)
    end_pos: usize,
}

impl TrackGeometry {
    /// Legt leere Sample-Arrays inklusive Look-Ahead-Reserve an.
    pub fn new(capacity: usize) -> Self {
        let samples = capacity + CPU1_EXTRA_LENGTH;
        Self {
            capacity,
            path: vec![IVec2::ZERO; samples + 1],
            path_render: vec![IVec2::ZERO; samples + 1],
            width_render: vec![WidthRender::default(); samples + 1],
            end_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn end_pos(&self) -> usize {
        self.end_pos
    }

    /// Richtungssample an `pos`.
    pub fn direction(&self, pos: usize) -> IVec2 {
        self.path[pos]
    }

    /// Weltkoordinate der Mittellinie an `pos`.
    pub fn render_point(&self, pos: usize) -> IVec2 {
        self.path_render[pos]
    }

    /// Fahrbahnkanten an `pos`.
    pub fn width_at(&self, pos: usize) -> &WidthRender {
        &self.width_render[pos]
    }

    /// Integriert die Segmentliste zu Richtungs- und Positionssamples.
    ///
    /// Streng sequenziell: die Segmentreihenfolge ist die einzige Quelle der
    /// Winkelakkumulation. Überschreitet die Segmentsumme die Kapazität,
    /// wird stumm bei `capacity` abgeschnitten — der Aufrufer hält die
    /// Summe im Rahmen. Schreibt `pos` und `anchor` jedes Segments neu.
    pub fn update_path_data(
        &mut self,
        segments: &mut [PathSegment],
        start_width: i32,
        width_points: &ControlPointList,
    ) {
        let mut angle = 0.0_f64;
        let mut pos: usize = 0;

        for segment in segments.iter_mut() {
            segment.pos = pos as i32;

            let angle_inc = f64::from(-segment.angle_inc) / 10000.0;

            for _ in 0..segment.length {
                let x = (angle.sin() * f64::from(FIXED_ONE)) as i32;
                let y = (angle.cos() * f64::from(FIXED_ONE)) as i32;
                self.path[pos] = IVec2::new(x, y);

                angle += angle_inc;

                // Erlaubte Levellänge nicht überschreiten
                pos += 1;
                if pos > self.capacity {
                    self.end_pos = self.capacity;
                    self.update_render_data(segments, start_width, width_points);
                    return;
                }
            }
        }

        self.end_pos = pos;
        self.update_render_data(segments, start_width, width_points);
    }

    /// Präfixsumme der Richtungssamples zu Weltkoordinaten; aktualisiert
    /// danach die Render-Anker der Segmente und die Fahrbahnkanten.
    fn update_render_data(
        &mut self,
        segments: &mut [PathSegment],
        start_width: i32,
        width_points: &ControlPointList,
    ) {
        let mut xinc: i32 = 0;
        let mut yinc: i32 = 0;

        for i in 0..self.end_pos {
            xinc += self.path[i].x;
            yinc += -self.path[i].y;

            self.path_render[i] = IVec2::new(xinc / (FIXED_ONE / 2), yinc / (FIXED_ONE / 2));
        }

        let last = self.path_render.len() - 1;
        let mut pos: usize = 0;
        for segment in segments.iter_mut() {
            segment.anchor = self.path_render[pos.min(last)];
            pos += segment.length.max(0) as usize;
        }

        self.update_width_data(start_width, width_points);
    }

    /// Interpolierter Breitenverlauf über alle Samples (Fixed-Point,
    /// vorskaliert mit `SCALE << 16`).
    ///
    /// Rampen-Invariante: die Breite nähert sich dem Ziel monoton und wird
    /// beim Erreichen oder Überschreiten exakt auf das Ziel geklemmt.
    fn width_profile(&self, start_width: i32, width_points: &ControlPointList) -> Vec<i64> {
        let mut next_width = (i64::from(start_width) * SCALE) << 16;
        let mut width = next_width;
        let mut change: i64 = 0;
        let mut point = 0usize;

        let mut profile = Vec::with_capacity(self.end_pos);

        for i in 0..self.end_pos {
            if let Some(cp) = width_points.get(point) {
                if i as i32 == cp.pos {
                    next_width = (i64::from(cp.value1) * SCALE) << 16;
                    change = i64::from(cp.value2) * SCALE;
                    // Liegt das Ziel hinter uns, Richtung invertieren,
                    // damit die Konvergenz garantiert bleibt
                    if next_width <= width {
                        change = -change;
                    }
                    point += 1;
                }
            }

            if change != 0 {
                width += (WIDTH_RAMP_STEP * change) << 4;

                if change > 0 && width > next_width {
                    width = next_width;
                    change = 0;
                } else if change < 0 && width < next_width {
                    width = next_width;
                    change = 0;
                }
            }

            profile.push(width);
        }

        profile
    }

    /// Berechnet die parallelen Fahrbahnkanten aus Mittellinie und
    /// interpoliertem Breitenverlauf.
    pub fn update_width_data(&mut self, start_width: i32, width_points: &ControlPointList) {
        let profile = self.width_profile(start_width, width_points);

        for i in 0..self.end_pos {
            let width = profile[i];

            // Für die Parallele brauchen wir die Richtung: Tangente über
            // EDGES_OFFSET Samples voraus, am Levelende eines zurück
            let mut render_start = i;
            let mut render_end = i + EDGES_OFFSET;
            if render_end >= self.end_pos {
                render_end = self.end_pos - 1;
            }
            if render_end == i {
                render_start = render_start.saturating_sub(1);
            }

            let x1 = i64::from(self.path_render[render_start].x) * SCALE;
            let y1 = i64::from(self.path_render[render_start].y) * SCALE;
            let x2 = i64::from(self.path_render[render_end].x) * SCALE;
            let y2 = i64::from(self.path_render[render_end].y) * SCALE;

            let l = (((x1 - x2) * (x1 - x2) + (y1 - y2) * (y1 - y2)) as f64).sqrt() as i64;

            if l != 0 {
                // Abstand zwischen den beiden Fahrbahnen
                let gap = (width / 15) >> 16;

                let road1_x1 = x1 - (gap - (ROAD_WIDTH >> 1)) * (y2 - y1) / l;
                let road1_y1 = y1 - (gap - (ROAD_WIDTH >> 1)) * (x1 - x2) / l;
                let road1_x2 = x1 - (gap + (ROAD_WIDTH >> 1)) * (y2 - y1) / l;
                let road1_y2 = y1 - (gap + (ROAD_WIDTH >> 1)) * (x1 - x2) / l;

                let road2_x1 = x1 + (gap - (ROAD_WIDTH >> 1)) * (y2 - y1) / l;
                let road2_y1 = y1 + (gap - (ROAD_WIDTH >> 1)) * (x1 - x2) / l;
                let road2_x2 = x1 + (gap + (ROAD_WIDTH >> 1)) * (y2 - y1) / l;
                let road2_y2 = y1 + (gap + (ROAD_WIDTH >> 1)) * (x1 - x2) / l;

                let wr = &mut self.width_render[i];
                wr.road1_lhs = IVec2::new((road1_x1 / SCALE) as i32, (road1_y1 / SCALE) as i32);
                wr.road1_rhs = IVec2::new((road1_x2 / SCALE) as i32, (road1_y2 / SCALE) as i32);
                wr.road2_lhs = IVec2::new((road2_x1 / SCALE) as i32, (road2_y1 / SCALE) as i32);
                wr.road2_rhs = IVec2::new((road2_x2 / SCALE) as i32, (road2_y2 / SCALE) as i32);
                wr.split = (width >> 16) >= SPLIT_THRESHOLD;
            }
        }
    }

    /// Begrenzungsrechteck `(min, max)` des gerenderten Pfads, mit festem
    /// Innenabstand. `None` bei leerem Pfad.
    pub fn path_bounds(&self) -> Option<(IVec2, IVec2)> {
        if self.end_pos == 0 {
            return None;
        }

        let mut min = IVec2::new(i32::MAX, i32::MAX);
        let mut max = IVec2::new(i32::MIN, i32::MIN);

        for p in &self.path_render[..self.end_pos] {
            min = min.min(*p);
            max = max.max(*p);
        }

        Some((
            min - IVec2::splat(BOUNDS_PADDING),
            max + IVec2::splat(BOUNDS_PADDING),
        ))
    }
}
