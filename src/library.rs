// src/library.rs - user recorded gesture templates
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::gesture::CommandId;
use crate::landmarks::HandObservation;

pub const DEFAULT_THRESHOLD: f64 = 0.85;
pub const MIN_SAMPLES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureTemplate {
    /// Mean wrist-relative landmark vector of the recorded samples.
    pub features: Vec<f64>,
    pub command: CommandId,
    pub threshold: f64,
    pub created_at: DateTime<Local>,
}

struct Recording {
    name: String,
    command: CommandId,
    samples: Vec<Vec<f64>>,
}

/// Named templates matched by cosine similarity, persisted as JSON.
#[derive(Default)]
pub struct GestureLibrary {
    path: Option<PathBuf>,
    templates: BTreeMap<String, GestureTemplate>,
    recording: Option<Recording>,
}

impl GestureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<data dir>/gesture-controller/gestures.json` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "gesture-controller")
            .map(|dirs| dirs.data_dir().join("gestures.json"))
    }

    /// Loads templates from `path`; a missing file gives an empty library
    /// that will save to `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let templates = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read gesture library {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid gesture library {}", path.display()))?
        } else {
            info!("No gesture library at {}, starting empty", path.display());
            BTreeMap::new()
        };
        info!("Loaded {} custom gestures", templates.len());
        Ok(Self {
            path: Some(path),
            templates,
            recording: None,
        })
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.templates)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write gesture library {}", path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn command_for(&self, name: &str) -> Option<CommandId> {
        self.templates.get(name).map(|t| t.command.clone())
    }

    /// Best template whose similarity clears its own threshold.
    pub fn recognize(&self, hand: &HandObservation) -> Option<(String, f64)> {
        let features = hand.wrist_relative_features();
        let mut best: Option<(String, f64)> = None;
        for (name, template) in &self.templates {
            let score = cosine_similarity(&features, &template.features);
            let beats_best = best.as_ref().map_or(true, |(_, s)| score > *s);
            if score > template.threshold && beats_best {
                best = Some((name.clone(), score));
            }
        }
        best
    }

    pub fn begin_recording(&mut self, name: impl Into<String>, command: CommandId) {
        let name = name.into();
        info!("Recording gesture '{}'", name);
        self.recording = Some(Recording {
            name,
            command,
            samples: Vec::new(),
        });
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Adds a sample to the current recording; returns the sample count.
    pub fn add_sample(&mut self, hand: &HandObservation) -> usize {
        match self.recording.as_mut() {
            Some(rec) => {
                rec.samples.push(hand.wrist_relative_features());
                rec.samples.len()
            }
            None => 0,
        }
    }

    /// Stores the mean of the recorded samples and saves the library.
    /// Returns false (keeping the recording open) when too few samples exist.
    pub fn finalize(&mut self) -> Result<bool> {
        let Some(rec) = self.recording.take() else {
            return Ok(false);
        };
        if rec.samples.len() < MIN_SAMPLES {
            warn!("Not enough samples for '{}': {}", rec.name, rec.samples.len());
            self.recording = Some(rec);
            return Ok(false);
        }

        let width = rec.samples[0].len();
        let mut mean = vec![0.0; width];
        for sample in &rec.samples {
            for (acc, v) in mean.iter_mut().zip(sample) {
                *acc += v;
            }
        }
        let n = rec.samples.len() as f64;
        mean.iter_mut().for_each(|v| *v /= n);

        self.templates.insert(
            rec.name.clone(),
            GestureTemplate {
                features: mean,
                command: rec.command,
                threshold: DEFAULT_THRESHOLD,
                created_at: Local::now(),
            },
        );
        self.save()?;
        info!("Gesture '{}' created", rec.name);
        Ok(true)
    }

    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let removed = self.templates.remove(name).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }
}

/// Cosine similarity; 0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
