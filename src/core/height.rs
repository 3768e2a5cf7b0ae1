//! Höhenprofil-Bibliothek.
//!
//! Ein Höhen-Control-Point referenziert per `value1` ein Profil dieser
//! globalen Bibliothek. Die Profile selbst stammen aus dem ROM-Import und
//! werden vom Export unverändert wieder serialisiert.

use serde::{Deserialize, Serialize};

/// Anzahl der Profile in der Original-Bibliothek.
pub const HEIGHT_ENTRIES: usize = 225;

/// Ein Eintrag der Höhenprofil-Bibliothek.
///
/// `kind` bestimmt das Serialisierungsformat: Typ 0 trägt zwei Bytewerte,
/// Typ 4 hat gar keine Datenliste, alle anderen einen 16-Bit-Wert plus
/// Datenliste.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightSegment {
    pub kind: i32,
    pub step: i32,
    pub value1: i32,
    pub value2: i32,
    pub data: Vec<i32>,
}
