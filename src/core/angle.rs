//! Umrechnung zwischen Editor-Winkelcodes und dem ROM-Krümmungsmaß.
//!
//! Das ROM speichert Krümmung als Sehnenmaß zweier aufeinanderfolgender
//! Richtungssamples, der Editor als Winkelinkrement pro Sample. Die
//! Hinrichtung ist exakt; die Rückrichtung ist eine beschränkte Suche über
//! alle gültigen Codes.

use glam::IVec2;

use crate::core::geometry::FIXED_ONE;

/// Obergrenze (exklusiv) der Winkelcode-Suche. Kalibriert: oberhalb davon
/// erzeugt das Originalspiel keine Kurven mehr.
pub const ANGLE_CODE_RANGE: i32 = 300;

/// Krümmungsmaß zweier Richtungssamples: skalierter Kehrwert des
/// Sehnenabstands. `0` bei identischen Samples (gerade Strecke).
pub fn curve_info_between(p1: IVec2, p2: IVec2) -> i32 {
    let dx = f64::from(p1.x - p2.x);
    let dy = f64::from(p1.y - p2.y);
    let l = (dx * dx + dy * dy).sqrt();

    if l == 0.0 {
        0
    } else {
        ((1.0 / l) * f64::from(FIXED_ONE)) as i32
    }
}

/// Krümmungsmaß eines Winkelcodes, ausgewertet bei Winkel 0.
///
/// Das Maß ist rotationsinvariant, daher genügt die Auswertung am
/// Nullwinkel: erstes Sample `(0, FIXED_ONE)`, zweites um ein Inkrement
/// weitergedreht.
pub fn curve_info(angle_inc: i32) -> i32 {
    let inc = f64::from(angle_inc) / 10000.0;

    let p1 = IVec2::new(0, FIXED_ONE);
    let p2 = IVec2::new(
        (inc.sin() * f64::from(FIXED_ONE)) as i32,
        (inc.cos() * f64::from(FIXED_ONE)) as i32,
    );

    curve_info_between(p1, p2)
}

/// Rekonstruiert den Winkelcode zu einem ROM-Krümmungsmaß.
///
/// Lineare Suche über `[0, ANGLE_CODE_RANGE)` nach dem Code mit minimaler
/// absoluter Abweichung. Bei gleicher Abweichung gewinnt der kleinste Code;
/// ein exakter Treffer beendet die Suche sofort.
pub fn guess_angle(curve_info_target: i32) -> i32 {
    let mut best_code = 0;
    let mut min_diff = i32::MAX;

    for code in 0..ANGLE_CODE_RANGE {
        let diff = (curve_info(code) - curve_info_target).abs();
        if diff == 0 {
            return code;
        }
        if diff < min_diff {
            min_diff = diff;
            best_code = code;
        }
    }

    best_code
}
