// src/runner.rs - frame loop driving the controller until input ends or shutdown
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::controller::GestureController;
use crate::output::{InputSink, SystemControl};
use crate::session::SessionRecorder;
use crate::source::{Frame, FrameSource};

pub struct ControlLoop<S, C> {
    source: FrameSource,
    controller: GestureController,
    sink: S,
    system: C,
    running: Arc<AtomicBool>,
    session: Option<SessionRecorder>,
}

impl<S: InputSink, C: SystemControl> ControlLoop<S, C> {
    pub fn new(source: FrameSource, controller: GestureController, sink: S, system: C) -> Self {
        Self {
            source,
            controller,
            sink,
            system,
            running: Arc::new(AtomicBool::new(true)),
            session: None,
        }
    }

    pub fn with_session(mut self, session: SessionRecorder) -> Self {
        self.session = Some(session);
        self
    }

    /// Shares an externally owned run flag, e.g. one a signal handler clears.
    pub fn with_run_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Clearing this flag stops the loop before the next frame.
    pub fn run_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn system(&self) -> &C {
        &self.system
    }

    pub fn session(&self) -> Option<&SessionRecorder> {
        self.session.as_ref()
    }

    pub fn into_session(self) -> Option<SessionRecorder> {
        self.session
    }

    /// Processes one frame per iteration and returns the frame count.
    /// Any held drag is released on the way out, including on error.
    pub fn run(&mut self) -> Result<usize> {
        let origin = Instant::now();
        let mut processed = 0;

        let result = loop {
            if !self.running.load(Ordering::SeqCst) {
                info!("Shutdown requested");
                break Ok(processed);
            }
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("End of input after {} frames", processed);
                    break Ok(processed);
                }
                Err(e) => break Err(e),
            };
            self.step(&frame, origin);
            processed += 1;
        };

        self.controller.release(&mut self.sink);
        result
    }

    fn step(&mut self, frame: &Frame, origin: Instant) {
        // recorded timestamps keep cooldowns deterministic on replay
        let now = match frame.timestamp_ms {
            Some(ms) => frame_instant(origin, ms).unwrap_or_else(|| {
                warn!("Timestamp {} ms out of range, using wall time", ms);
                Instant::now()
            }),
            None => Instant::now(),
        };
        let report = self
            .controller
            .process_frame(&frame.hands, now, &mut self.sink, &mut self.system);
        debug!(?report, "frame processed");

        if let Some(session) = self.session.as_mut() {
            let timestamp = (now - origin).as_secs_f64() * 1000.0;
            session.add_frame(report, timestamp);
        }
    }
}

fn frame_instant(origin: Instant, ms: f64) -> Option<Instant> {
    let offset = Duration::try_from_secs_f64(ms.max(0.0) / 1000.0).ok()?;
    origin.checked_add(offset)
}
