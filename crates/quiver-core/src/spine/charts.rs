//! Spine lookup charts keyed by draw weight (lbs) then arrow length (in)
//!
//! Rows and columns are sorted ascending; lookups depend on that order.

pub(crate) type Chart = &'static [(f64, &'static [(f64, f64)])];

pub(crate) const COMPOUND: Chart = &[
    (50.0, &[(26.0, 500.0), (27.0, 500.0), (28.0, 400.0), (29.0, 400.0), (30.0, 340.0), (31.0, 340.0)]),
    (55.0, &[(26.0, 500.0), (27.0, 400.0), (28.0, 400.0), (29.0, 340.0), (30.0, 340.0), (31.0, 300.0)]),
    (60.0, &[(26.0, 400.0), (27.0, 400.0), (28.0, 340.0), (29.0, 340.0), (30.0, 300.0), (31.0, 300.0)]),
    (65.0, &[(26.0, 400.0), (27.0, 340.0), (28.0, 340.0), (29.0, 300.0), (30.0, 300.0), (31.0, 250.0)]),
    (70.0, &[(26.0, 340.0), (27.0, 340.0), (28.0, 300.0), (29.0, 300.0), (30.0, 250.0), (31.0, 250.0)]),
    (75.0, &[(26.0, 340.0), (27.0, 300.0), (28.0, 300.0), (29.0, 250.0), (30.0, 250.0), (31.0, 200.0)]),
];

pub(crate) const RECURVE: Chart = &[
    (20.0, &[(24.0, 2000.0), (25.0, 1900.0), (26.0, 1800.0), (27.0, 1700.0), (28.0, 1600.0), (29.0, 1500.0), (30.0, 1400.0), (31.0, 1300.0), (32.0, 1200.0)]),
    (25.0, &[(24.0, 1800.0), (25.0, 1700.0), (26.0, 1600.0), (27.0, 1500.0), (28.0, 1400.0), (29.0, 1300.0), (30.0, 1200.0), (31.0, 1100.0), (32.0, 1000.0)]),
    (30.0, &[(24.0, 1400.0), (25.0, 1300.0), (26.0, 1200.0), (27.0, 1100.0), (28.0, 1000.0), (29.0, 900.0), (30.0, 800.0), (31.0, 750.0), (32.0, 700.0)]),
    (35.0, &[(24.0, 1000.0), (25.0, 900.0), (26.0, 800.0), (27.0, 750.0), (28.0, 700.0), (29.0, 650.0), (30.0, 600.0), (31.0, 550.0), (32.0, 500.0)]),
    (40.0, &[(24.0, 800.0), (25.0, 750.0), (26.0, 700.0), (27.0, 650.0), (28.0, 600.0), (29.0, 550.0), (30.0, 500.0), (31.0, 450.0), (32.0, 400.0)]),
    (45.0, &[(24.0, 700.0), (25.0, 650.0), (26.0, 600.0), (27.0, 550.0), (28.0, 500.0), (29.0, 450.0), (30.0, 400.0), (31.0, 370.0), (32.0, 340.0)]),
    (50.0, &[(24.0, 600.0), (25.0, 550.0), (26.0, 500.0), (27.0, 450.0), (28.0, 400.0), (29.0, 370.0), (30.0, 340.0), (31.0, 320.0), (32.0, 300.0)]),
    (55.0, &[(24.0, 500.0), (25.0, 450.0), (26.0, 400.0), (27.0, 370.0), (28.0, 340.0), (29.0, 320.0), (30.0, 300.0), (31.0, 280.0), (32.0, 260.0)]),
    (60.0, &[(24.0, 450.0), (25.0, 400.0), (26.0, 370.0), (27.0, 340.0), (28.0, 320.0), (29.0, 300.0), (30.0, 280.0), (31.0, 260.0), (32.0, 240.0)]),
    (65.0, &[(24.0, 400.0), (25.0, 370.0), (26.0, 340.0), (27.0, 320.0), (28.0, 300.0), (29.0, 280.0), (30.0, 260.0), (31.0, 240.0), (32.0, 220.0)]),
];

/// Wood shaft spine in pounds (middle of each chart band)
pub(crate) const WOOD: Chart = &[
    (30.0, &[(26.0, 32.5), (27.0, 32.5), (28.0, 35.0), (29.0, 37.5), (30.0, 42.5), (31.0, 47.5), (32.0, 47.5)]),
    (35.0, &[(26.0, 35.0), (27.0, 35.0), (28.0, 37.5), (29.0, 42.5), (30.0, 47.5), (31.0, 52.5), (32.0, 52.5)]),
    (40.0, &[(26.0, 37.5), (27.0, 37.5), (28.0, 42.5), (29.0, 47.5), (30.0, 52.5), (31.0, 57.5), (32.0, 62.5)]),
    (45.0, &[(26.0, 42.5), (27.0, 42.5), (28.0, 47.5), (29.0, 52.5), (30.0, 57.5), (31.0, 62.5), (32.0, 67.5)]),
    (50.0, &[(26.0, 47.5), (27.0, 47.5), (28.0, 52.5), (29.0, 57.5), (30.0, 62.5), (31.0, 67.5), (32.0, 77.5)]),
    (55.0, &[(26.0, 52.5), (27.0, 52.5), (28.0, 57.5), (29.0, 62.5), (30.0, 67.5), (31.0, 72.5), (32.0, 77.5)]),
    (60.0, &[(26.0, 57.5), (27.0, 57.5), (28.0, 62.5), (29.0, 67.5), (30.0, 72.5), (31.0, 77.5), (32.0, 82.5)]),
    (65.0, &[(26.0, 62.5), (27.0, 62.5), (28.0, 67.5), (29.0, 72.5), (30.0, 77.5), (31.0, 82.5), (32.0, 87.5)]),
];

/// Point weight (grains) to chart adjustment step; 100 gr is the baseline
pub(crate) const WOOD_POINT_STEPS: [(f64, f64); 4] = [(30.0, 1.0), (70.0, 2.0), (100.0, 3.0), (125.0, 4.0)];

/// Index of the first key closest to `target`; ties go to the earlier key
pub(crate) fn closest_index<I>(keys: I, target: f64) -> usize
where
    I: IntoIterator<Item = f64>,
{
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, key) in keys.into_iter().enumerate() {
        let distance = (key - target).abs();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

fn value_at(row: &[(f64, f64)], length: f64) -> Option<f64> {
    row.iter().find(|(l, _)| *l == length).map(|(_, v)| *v)
}

/// Chart lookup with interpolation toward the neighbouring weight row
/// when the draw weight is more than 2.5 lbs from the nearest row, and
/// optionally toward the neighbouring length column when the arrow is more
/// than half an inch from the nearest column.
pub(crate) fn lookup(chart: Chart, draw_weight: f64, arrow_length: f64, interpolate_length: bool) -> f64 {
    let wi = closest_index(chart.iter().map(|(w, _)| *w), draw_weight);
    let (closest_weight, row) = chart[wi];
    let li = closest_index(row.iter().map(|(l, _)| *l), arrow_length);
    let (closest_length, chart_value) = row[li];

    let mut base = chart_value;

    if (draw_weight - closest_weight).abs() > 2.5 {
        if draw_weight > closest_weight {
            if let Some((next_weight, next_row)) = chart.get(wi + 1) {
                let lower = chart_value;
                let upper = value_at(next_row, closest_length).unwrap_or(lower);
                let ratio = (draw_weight - closest_weight) / (next_weight - closest_weight);
                base = lower + (upper - lower) * ratio;
            }
        } else if wi > 0 {
            let (prev_weight, prev_row) = chart[wi - 1];
            let upper = chart_value;
            let lower = value_at(prev_row, closest_length).unwrap_or(upper);
            let ratio = (closest_weight - draw_weight) / (closest_weight - prev_weight);
            base = upper + (lower - upper) * ratio;
        }
    }

    // Length interpolation works on the nearest weight row and replaces
    // any weight-interpolated value.
    if interpolate_length && (arrow_length - closest_length).abs() > 0.5 {
        if arrow_length > closest_length {
            if let Some((next_length, upper)) = row.get(li + 1) {
                let lower = chart_value;
                let ratio = (arrow_length - closest_length) / (next_length - closest_length);
                base = lower + (upper - lower) * ratio;
            }
        } else if li > 0 {
            let (prev_length, lower) = row[li - 1];
            let upper = chart_value;
            let ratio = (closest_length - arrow_length) / (closest_length - prev_length);
            base = upper + (lower - upper) * ratio;
        }
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charts_sorted() {
        for chart in [COMPOUND, RECURVE, WOOD] {
            assert!(chart.windows(2).all(|w| w[0].0 < w[1].0));
            for (_, row) in chart {
                assert!(row.windows(2).all(|w| w[0].0 < w[1].0));
            }
        }
    }

    #[test]
    fn test_closest_index_ties_go_low() {
        assert_eq!(closest_index([50.0, 55.0, 60.0], 52.5), 0);
        assert_eq!(closest_index([50.0, 55.0, 60.0], 58.0), 2);
        assert_eq!(closest_index([26.0, 27.0], 40.0), 1);
    }

    #[test]
    fn test_exact_lookup() {
        assert_eq!(lookup(COMPOUND, 60.0, 28.0, false), 340.0);
        assert_eq!(lookup(WOOD, 45.0, 30.0, false), 57.5);
    }

    #[test]
    fn test_weight_interpolation() {
        // 73 lbs: nearest row 75 is 2 away, no interpolation
        assert_eq!(lookup(COMPOUND, 73.0, 28.0, false), 300.0);
        // 80 lbs: beyond the last row, nothing to interpolate toward
        assert_eq!(lookup(COMPOUND, 80.0, 28.0, false), 300.0);
        // 42 lbs: nearest row 40 (row 45 is 3 away); 2 away so exact
        assert_eq!(lookup(RECURVE, 42.0, 28.0, false), 600.0);
        // 47 lbs on wood chart at 28": nearest 45 row, 2 away
        assert_eq!(lookup(WOOD, 47.0, 28.0, false), 47.5);
    }

    #[test]
    fn test_length_interpolation_recurve() {
        // 28.75" rounds to 29 (0.25 away) - no interpolation
        assert_eq!(lookup(RECURVE, 40.0, 28.75, true), 550.0);
        // 40" is past the last column; value stays at 32"
        assert_eq!(lookup(RECURVE, 40.0, 40.0, true), 400.0);
    }
}
