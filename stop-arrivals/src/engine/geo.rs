//! Nearest-stop estimation from raw coordinates.
//!
//! Distances are squared planar distances over latitude/longitude. Within a
//! city the distortion of treating degrees as a flat grid does not change
//! which stop is nearest, and it keeps the comparison to a few multiplies.

use super::index::ScheduleIndex;

/// Index into `ordered_stop_ids` of the stop nearest to `position`.
///
/// Stops without coordinates (or unknown to the index) are skipped.
/// Returns `None` when `position` is absent or no stop has coordinates.
/// On equal distance the earlier stop wins.
pub fn nearest_stop_index(
    index: &ScheduleIndex,
    position: Option<(f64, f64)>,
    ordered_stop_ids: &[String],
) -> Option<usize> {
    let (lat, lon) = position?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, stop_id) in ordered_stop_ids.iter().enumerate() {
        let Some((stop_lat, stop_lon)) = index.stop(stop_id).and_then(|s| s.position()) else {
            continue;
        };
        let d = squared_distance((lat, lon), (stop_lat, stop_lon));
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

fn squared_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dlat = a.0 - b.0;
    let dlon = a.1 - b.1;
    dlat * dlat + dlon * dlon
}
