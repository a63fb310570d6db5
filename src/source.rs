// src/source.rs - landmark frames from a replay file or a live detector pipe
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::landmarks::{HandObservation, Handedness};

#[derive(Debug, Deserialize)]
struct RawHand {
    handedness: Handedness,
    landmarks: Vec<[f64; 3]>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    timestamp_ms: Option<f64>,
    #[serde(default)]
    hands: Vec<RawHand>,
}

/// Detections for one camera frame. An empty `hands` means nothing was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub timestamp_ms: Option<f64>,
    pub hands: Vec<HandObservation>,
}

/// Parses one JSON line. Blank lines, bad JSON and hands without exactly
/// 21 landmarks are rejected with a warning.
pub fn parse_frame(line: &str, line_no: usize) -> Option<Frame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let raw: RawFrame = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Skipping malformed frame on line {}: {}", line_no, e);
            return None;
        }
    };

    let mut hands = Vec::with_capacity(raw.hands.len());
    for hand in raw.hands {
        match HandObservation::from_points(&hand.landmarks, hand.handedness) {
            Some(obs) => hands.push(obs),
            None => {
                warn!(
                    "Skipping frame on line {}: hand has {} landmarks",
                    line_no,
                    hand.landmarks.len()
                );
                return None;
            }
        }
    }
    Some(Frame {
        timestamp_ms: raw.timestamp_ms,
        hands,
    })
}

/// Preloaded recording, replayed frame by frame.
pub struct ReplayReader {
    path: PathBuf,
    current_frame: usize,
    frames: Vec<Frame>,
}

impl ReplayReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::open(&path)
            .with_context(|| format!("Cannot open frame file {}", path.display()))?;
        let frames = read_frames(BufReader::new(file))?;
        info!("Loaded {} frames from {}", frames.len(), path.display());
        Ok(Self {
            path,
            current_frame: 0,
            frames,
        })
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        Ok(Self {
            path: PathBuf::new(),
            current_frame: 0,
            frames: read_frames(reader)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn next_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.get(self.current_frame).cloned()?;
        self.current_frame += 1;
        Some(frame)
    }
}

fn read_frames(reader: impl BufRead) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read frame line")?;
        frames.extend(parse_frame(&line, i + 1));
    }
    Ok(frames)
}

/// Line reader over a live stream, typically an external detector
/// writing to our stdin.
pub struct StreamReader {
    reader: Box<dyn BufRead + Send>,
    line_no: usize,
}

impl StreamReader {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            line_no: 0,
        }
    }

    /// Blocks until a valid frame arrives; `None` at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if let Some(frame) = parse_frame(&line, self.line_no) {
                return Ok(Some(frame));
            }
        }
    }
}

pub enum FrameSource {
    File(ReplayReader),
    Stdin(StreamReader),
}

impl FrameSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(FrameSource::File(ReplayReader::new(path)?))
    }

    pub fn stdin() -> Self {
        FrameSource::Stdin(StreamReader::new(BufReader::new(std::io::stdin())))
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self {
            FrameSource::File(reader) => Ok(reader.next_frame()),
            FrameSource::Stdin(reader) => reader.next_frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hand_json(handedness: &str, points: usize) -> String {
        let pts: Vec<String> = (0..points).map(|i| format!("[{}, 0.5, 0.0]", i as f64 / 100.0)).collect();
        format!(r#"{{"handedness": "{}", "landmarks": [{}]}}"#, handedness, pts.join(","))
    }

    #[test]
    fn parses_well_formed_line() {
        let line = format!(r#"{{"timestamp_ms": 33.3, "hands": [{}]}}"#, hand_json("Left", 21));
        let frame = parse_frame(&line, 1).unwrap();
        assert_eq!(frame.timestamp_ms, Some(33.3));
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].handedness, Handedness::Left);
        assert_eq!(frame.hands[0].landmarks[20].x, 0.2);
    }

    #[test]
    fn empty_hands_is_a_frame() {
        let frame = parse_frame(r#"{"hands": []}"#, 1).unwrap();
        assert!(frame.hands.is_empty());
        assert_eq!(frame.timestamp_ms, None);
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(parse_frame("", 1).is_none());
        assert!(parse_frame("not json", 2).is_none());
        let short = format!(r#"{{"hands": [{}]}}"#, hand_json("Right", 20));
        assert!(parse_frame(&short, 3).is_none());
    }

    #[test]
    fn replay_skips_malformed_lines() {
        let text = format!(
            "{}\n{{oops\n\n{}\n",
            r#"{"hands": []}"#,
            format!(r#"{{"hands": [{}]}}"#, hand_json("Right", 21))
        );
        let mut replay = ReplayReader::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(replay.total_frames(), 2);
        assert!(replay.next_frame().unwrap().hands.is_empty());
        assert_eq!(replay.next_frame().unwrap().hands.len(), 1);
        assert!(replay.next_frame().is_none());
        assert_eq!(replay.current_frame(), 2);
    }

    #[test]
    fn stream_reads_until_eof() {
        let text = "garbage\n{\"hands\": []}\n";
        let mut stream = StreamReader::new(Cursor::new(text.as_bytes().to_vec()));
        assert!(stream.next_frame().unwrap().is_some());
        assert!(stream.next_frame().unwrap().is_none());
    }
}
