// src/lib.rs
pub mod commands;
pub mod config;
pub mod controller;
pub mod cursor;
pub mod debounce;
pub mod error;
pub mod finger;
pub mod gesture;
pub mod hands;
pub mod landmarks;
pub mod library;
pub mod output;
pub mod pinch;
pub mod runner;
pub mod session;
pub mod source;

pub use config::ControllerConfig;
pub use controller::{ControlFlags, FrameReport, GestureController};
pub use error::ControlError;
pub use gesture::{CommandId, Gesture};
pub use hands::Role;
pub use landmarks::{HandObservation, Handedness};
pub use output::{InputSink, OutputCommand, RecordingSink, SoftwareLevels, SystemControl};
pub use runner::ControlLoop;
pub use source::{Frame, FrameSource};
