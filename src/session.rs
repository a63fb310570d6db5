// src/session.rs
use anyhow::Result;
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::controller::FrameReport;

#[derive(Debug, Serialize)]
struct FrameRecord {
    frame: usize,
    timestamp: f64,
    major: String,
    minor: String,
    acting: Option<&'static str>,
    acted: String,
    commands: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub total_frames: usize,
    pub acting_frames: usize,
    /// Frames per acted gesture name.
    pub gesture_counts: BTreeMap<String, usize>,
}

pub struct SessionRecorder {
    output_dir: PathBuf,
    session_name: String,
    reports: Vec<FrameReport>,
    timestamps: Vec<f64>,
}

impl SessionRecorder {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            reports: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn add_frame(&mut self, report: FrameReport, timestamp: f64) {
        self.reports.push(report);
        self.timestamps.push(timestamp);
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self
            .output_dir
            .join(&self.session_name)
            .join("gesture_log.csv");

        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);

        for (i, (report, timestamp)) in self.reports.iter().zip(&self.timestamps).enumerate() {
            writer.serialize(FrameRecord {
                frame: i,
                timestamp: *timestamp,
                major: report.major.name(),
                minor: report.minor.name(),
                acting: report.acting.map(|r| r.as_str()),
                acted: report.acted.name(),
                commands: report.commands,
            })?;
        }

        writer.flush()?;
        Ok(csv_path)
    }

    pub fn summary(&self) -> SessionSummary {
        let mut gesture_counts = BTreeMap::new();
        let mut acting_frames = 0;
        for report in &self.reports {
            if report.acting.is_some() {
                acting_frames += 1;
                *gesture_counts.entry(report.acted.name()).or_insert(0) += 1;
            }
        }
        SessionSummary {
            total_frames: self.reports.len(),
            acting_frames,
            gesture_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Gesture;
    use crate::hands::Role;

    fn report(acting: Option<Role>, acted: Gesture) -> FrameReport {
        FrameReport {
            major: acted.clone(),
            minor: Gesture::Palm,
            acting,
            acted,
            commands: 1,
        }
    }

    fn sample() -> SessionRecorder {
        let dir = std::env::temp_dir().join(format!("gesture_controller_session_{}", std::process::id()));
        let mut rec = SessionRecorder::new(dir, Some("test".into()));
        rec.add_frame(report(None, Gesture::Palm), 0.0);
        rec.add_frame(report(Some(Role::Major), Gesture::Fist), 16.0);
        rec.add_frame(report(Some(Role::Major), Gesture::Fist), 32.0);
        rec.add_frame(report(Some(Role::Major), Gesture::VSign), 48.0);
        rec
    }

    #[test]
    fn default_session_name_is_timestamped() {
        let rec = SessionRecorder::new(std::env::temp_dir(), None);
        assert!(rec.session_name().starts_with("session_"));
        assert_eq!(rec.session_name().len(), "session_20240101_120000".len());
    }

    #[test]
    fn summary_counts_acting_frames() {
        let summary = sample().summary();
        assert_eq!(summary.total_frames, 4);
        assert_eq!(summary.acting_frames, 3);
        assert_eq!(summary.gesture_counts.get(&Gesture::Fist.name()), Some(&2));
        assert_eq!(summary.gesture_counts.get(&Gesture::VSign.name()), Some(&1));
        assert!(!summary.gesture_counts.contains_key(&Gesture::Palm.name()));
    }

    #[test]
    fn exports_one_row_per_frame() {
        let rec = sample();
        let path = rec.export_csv().unwrap();
        assert!(path.ends_with("test/gesture_log.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["frame", "timestamp", "major", "minor", "acting", "acted", "commands"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][4], "");
        assert_eq!(&rows[1][4], "major");

        let _ = std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }
}
