//! Fehler-Taxonomie für Geometrie-, Editor-, Import- und Export-Operationen.
//!
//! Die Originaldaten kennen keine Fehlerbehandlung — korrupte Streams laufen
//! dort in Endlosschleifen, ungültige Indizes in undefiniertes Verhalten.
//! Diese Varianten sitzen genau an den gehärteten Stellen; das numerische
//! Ergebnis des Normalpfads bleibt unverändert.

use thiserror::Error;

/// Ergebnis-Alias für die Core-Operationen.
pub type TrackResult<T> = Result<T, TrackError>;

#[derive(Debug, Error)]
pub enum TrackError {
    /// Terminator fehlt oder Stream endet mitten in einem Datensatz.
    /// Bricht den gesamten Import ab; es entsteht kein teilbefülltes Level.
    #[error("malformed record at 0x{address:06X}: {reason}")]
    MalformedRecord { address: u32, reason: &'static str },

    /// Die Segmentsumme würde die Kapazität der Sektion überschreiten.
    /// Die Quelle schneidet stattdessen stumm ab; Editor-Operationen
    /// weisen die Änderung hier ab und lassen den Zustand unangetastet.
    #[error("capacity exceeded: {requested} samples, section holds {capacity}")]
    CapacityExceeded { requested: i32, capacity: i32 },

    /// Editor-Operation auf einem Segment oder Control-Point, den es nicht gibt.
    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Pass 1 und Pass 2 des Exports widersprechen sich — interner
    /// Invariantenbruch, kein Benutzerfehler.
    #[error("export layout mismatch in {section}: planned offset {planned}, wrote at {actual}")]
    LayoutMismatch {
        section: &'static str,
        planned: usize,
        actual: usize,
    },
}
