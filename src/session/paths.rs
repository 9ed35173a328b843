use chrono::{DateTime, Local, TimeZone};
use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;

/// `ddMMyyyy-HHmmss`
pub const RECORDING_NAME_FORMAT: &str = "%d%m%Y-%H%M%S";

pub const RECORDING_EXTENSION: &str = "wav";

/// Base recording file name for a timestamp, e.g. `15102026-093000.wav`.
pub fn recording_file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}.{}", at.format(RECORDING_NAME_FORMAT), RECORDING_EXTENSION)
}

/// Generates destination paths for new recordings.
///
/// Names have one-second resolution. When a name is already taken, either
/// on disk or by an earlier path from this generator, a `-1`, `-2`, ...
/// suffix is added so that no two recordings share a file.
#[derive(Debug)]
pub struct RecordingPaths {
    dir: PathBuf,
    issued: HashSet<PathBuf>,
}

impl RecordingPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            issued: HashSet::new(),
        }
    }

    pub fn next(&mut self) -> PathBuf {
        self.next_at(&Local::now())
    }

    pub fn next_at<Tz>(&mut self, at: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let stem = at.format(RECORDING_NAME_FORMAT).to_string();
        let mut candidate = self.dir.join(recording_file_name(at));
        let mut suffix = 1;

        while candidate.exists() || self.issued.contains(&candidate) {
            candidate = self
                .dir
                .join(format!("{}-{}.{}", stem, suffix, RECORDING_EXTENSION));
            suffix += 1;
        }

        self.issued.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn name_uses_day_month_year_time() {
        let name = recording_file_name(&at("2026-10-15T09:05:07Z"));
        assert_eq!(name, "15102026-090507.wav");
    }

    #[test]
    fn same_second_yields_unique_paths() {
        let dir = TempDir::new().unwrap();
        let mut paths = RecordingPaths::new(dir.path());
        let t = at("2026-10-15T09:05:07Z");

        let first = paths.next_at(&t);
        let second = paths.next_at(&t);
        let third = paths.next_at(&t);

        assert_eq!(first, dir.path().join("15102026-090507.wav"));
        assert_eq!(second, dir.path().join("15102026-090507-1.wav"));
        assert_eq!(third, dir.path().join("15102026-090507-2.wav"));
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("15102026-090507.wav"), b"taken").unwrap();

        let mut paths = RecordingPaths::new(dir.path());
        let path = paths.next_at(&at("2026-10-15T09:05:07Z"));

        assert_eq!(path, dir.path().join("15102026-090507-1.wav"));
    }

    #[test]
    fn different_seconds_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let mut paths = RecordingPaths::new(dir.path());

        let a = paths.next_at(&at("2026-10-15T09:05:07Z"));
        let b = paths.next_at(&at("2026-10-15T09:05:08Z"));

        assert_ne!(a, b);
        assert!(b.ends_with("15102026-090508.wav"));
    }
}
