//! Recorded meetings for replay.
use crate::{data::AudioSample, Result};
use anyhow::format_err;
use std::{fs, path::Path};

// (left dB, right dB, difference, timestamp ms, average dB)
const MEETING: [(f64, f64, f64, i64, f64); 52] = [
    // right side much louder
    (55.0, 70.0, -15.0, 31000, 62.5),
    (54.5, 72.5, -18.0, 31500, 63.5),
    (56.0, 74.0, -18.0, 32000, 65.0),
    (53.0, 71.0, -18.0, 32500, 62.0),
    (55.5, 73.5, -18.0, 33000, 64.5),
    (54.0, 69.0, -15.0, 33500, 61.5),
    (56.5, 75.0, -18.5, 34000, 65.75),
    (55.0, 73.0, -18.0, 34500, 64.0),

    // easing towards the middle
    (58.0, 68.0, -10.0, 35000, 63.0),
    (60.0, 65.0, -5.0, 35500, 62.5),
    (62.0, 64.0, -2.0, 36000, 63.0),

    // balanced
    (65.0, 65.1, -0.1, 36500, 65.05),
    (67.0, 67.2, -0.2, 37000, 67.1),
    (69.0, 68.8, 0.2, 37500, 68.9),
    (66.5, 66.3, 0.2, 38000, 66.4),
    (68.0, 68.1, -0.1, 38500, 68.05),
    (70.0, 70.0, 0.0, 39000, 70.0),
    (67.5, 67.6, -0.1, 39500, 67.55),
    (69.5, 69.4, 0.1, 40000, 69.45),
    (68.0, 65.0, 3.0, 40500, 66.5),
    (70.0, 62.0, 8.0, 41000, 66.0),

    // left side much louder
    (75.0, 57.0, 18.0, 41500, 66.0),
    (78.0, 55.0, 23.0, 42000, 66.5),
    (76.5, 56.5, 20.0, 42500, 66.5),
    (79.0, 54.0, 25.0, 43000, 66.5),
    (77.0, 58.0, 19.0, 43500, 67.5),
    (80.0, 55.5, 24.5, 44000, 67.75),
    (76.0, 57.5, 18.5, 44500, 66.75),
    (78.5, 56.0, 22.5, 45000, 67.25),

    // rapid back and forth
    (75.0, 58.0, 17.0, 45200, 66.5),
    (56.0, 73.0, -17.0, 45400, 64.5),
    (77.0, 55.0, 22.0, 45600, 66.0),
    (54.0, 75.0, -21.0, 45800, 64.5),
    (78.0, 56.0, 22.0, 46000, 67.0),
    (55.0, 76.0, -21.0, 46200, 65.5),
    (79.0, 57.0, 22.0, 46400, 68.0),
    (56.0, 77.0, -21.0, 46600, 66.5),
    (65.0, 70.0, -5.0, 47000, 67.5),
    (68.0, 69.0, -1.0, 47500, 68.5),
    (69.5, 69.8, -0.3, 48000, 69.65),
    (70.0, 70.0, 0.0, 48500, 70.0),

    // small spreads either side of the threshold
    (68.0, 72.0, -4.0, 49000, 70.0),
    (72.0, 68.0, 4.0, 49500, 70.0),
    (69.0, 71.0, -2.0, 50000, 70.0),
    (71.0, 69.0, 2.0, 50500, 70.0),
    (70.0, 70.5, -0.5, 51000, 70.25),
    (82.0, 54.0, 28.0, 51500, 68.0),
    (53.0, 81.0, -28.0, 52000, 67.0),
    (70.0, 70.0, 0.0, 52500, 70.0),
    (80.0, 55.0, 25.0, 53000, 67.5),
    (55.0, 80.0, -25.0, 53500, 67.5),
    (69.8, 70.2, -0.4, 54000, 70.0),
];

/// The built-in recording: a right-dominated opening, a balanced stretch, a left-dominated
/// stretch, rapid switching, then a mix of small and dramatic spreads.
pub fn meeting() -> Vec<AudioSample> {
    MEETING
        .iter()
        .map(
            |&(left_level, right_level, difference, timestamp_ms, average_level)| AudioSample {
                left_level,
                right_level,
                difference,
                average_level,
                timestamp_ms,
            },
        )
        .collect()
}

/// Load a recording from a RON file holding a list of samples, e.g.
///
/// ```ron
/// [
///     (leftLevel: 55.0, rightLevel: 70.0, difference: -15.0, averageLevel: 62.5, timestampMs: 0),
/// ]
/// ```
pub fn load(path: impl AsRef<Path>) -> Result<Vec<AudioSample>> {
    let path = path.as_ref();
    log::info!("loading replay fixture from \"{}\"", path.display());
    let raw = fs::read_to_string(path)?;
    let samples: Vec<AudioSample> = ron::de::from_str(&raw)
        .map_err(|e| format_err!("invalid fixture \"{}\": {}", path.display(), e))?;
    if samples.is_empty() {
        return Err(format_err!("fixture \"{}\" has no samples", path.display()));
    }
    Ok(samples.into_iter().map(AudioSample::sanitized).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use std::io::Write;

    #[test]
    fn builtin_meeting() {
        let m = meeting();
        assert_eq!(m.len(), 52);
        assert_eq!(
            m[0],
            AudioSample {
                left_level: 55.0,
                right_level: 70.0,
                difference: -15.0,
                average_level: 62.5,
                timestamp_ms: 31000,
            }
        );
        assert_eq!(m[51].timestamp_ms, 54000);
        assert!(m.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
        // every phase of a meeting is in there
        for dir in &[Direction::Left, Direction::Center, Direction::Right] {
            assert!(m.iter().any(|s| Direction::from_difference(s.difference) == *dir));
        }
    }

    #[test]
    fn load_ron() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[(leftLevel: 60.0, rightLevel: 50.0, difference: 10.0, averageLevel: 55.0, \
             timestampMs: 10), (leftLevel: 50.0, rightLevel: 50.0, difference: 0.0, \
             averageLevel: 50.0)]"
        )
        .unwrap();
        let samples = load(file.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].difference, 10.0);
        assert_eq!(samples[1].timestamp_ms, 0);
    }

    #[test]
    fn load_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path().join("missing.ron")).is_err());

        let empty = dir.path().join("empty.ron");
        fs::write(&empty, "[]").unwrap();
        assert!(load(&empty).is_err());

        let garbage = dir.path().join("garbage.ron");
        fs::write(&garbage, "{ not: ron").unwrap();
        assert!(load(&garbage).is_err());
    }
}
