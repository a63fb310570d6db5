// src/controller.rs - per-frame gesture pipeline and control dispatch
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::commands::CommandRegistry;
use crate::config::ControllerConfig;
use crate::cursor::CursorMapper;
use crate::debounce::GestureFilter;
use crate::error::ControlError;
use crate::finger::FingerEncoder;
use crate::gesture::{Gesture, GestureClassifier};
use crate::hands::{Role, RoleResolver};
use crate::landmarks::{HandObservation, INDEX_TIP, PALM_CENTER};
use crate::library::GestureLibrary;
use crate::output::{InputSink, Key, MouseButton, OutputCommand, SystemControl};
use crate::pinch::{PinchAxis, PinchControl};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFlags {
    /// Left button is held for a drag.
    pub dragging: bool,
    /// A V-sign was seen; the next Mid/Index/TwoFingerClosed clicks.
    pub click_armed: bool,
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub major: Gesture,
    pub minor: Gesture,
    pub acting: Option<Role>,
    pub acted: Gesture,
    pub commands: usize,
}

impl FrameReport {
    fn idle() -> Self {
        Self {
            major: Gesture::Palm,
            minor: Gesture::Palm,
            acting: None,
            acted: Gesture::Palm,
            commands: 0,
        }
    }
}

/// Owns all state of one control session.
pub struct GestureController {
    classifier: GestureClassifier,
    resolver: RoleResolver,
    major: GestureFilter,
    minor: GestureFilter,
    pinch: PinchControl,
    cursor: CursorMapper,
    flags: ControlFlags,
    commands: CommandRegistry,
    scroll_step: i32,
    cooldown: Duration,
    cooldown_until: Option<Instant>,
    sent: usize,
}

impl GestureController {
    pub fn new(config: &ControllerConfig, screen: (u32, u32)) -> Self {
        let classifier = GestureClassifier::new(
            config.classifier(),
            FingerEncoder::new(config.finger_open_ratio),
        )
        .with_patterns(config.custom_patterns.clone());

        Self {
            classifier,
            resolver: RoleResolver::new(config.dominant_hand),
            major: GestureFilter::new(config.debounce_frames),
            minor: GestureFilter::new(config.debounce_frames),
            pinch: PinchControl::new(config.pinch),
            cursor: CursorMapper::new(config.cursor, screen),
            flags: ControlFlags::default(),
            commands: CommandRegistry::new(config.commands.clone()),
            scroll_step: config.scroll_step,
            cooldown: config.custom_cooldown(),
            cooldown_until: None,
            sent: 0,
        }
    }

    pub fn with_library(mut self, library: GestureLibrary) -> Self {
        self.classifier = self.classifier.with_library(library);
        self
    }

    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    pub fn pinch(&self) -> &PinchControl {
        &self.pinch
    }

    pub fn cursor(&self) -> &CursorMapper {
        &self.cursor
    }

    pub fn stable(&self, role: Role) -> &Gesture {
        match role {
            Role::Major => self.major.stable(),
            Role::Minor => self.minor.stable(),
        }
    }

    /// Runs classification, debouncing and dispatch for one frame of
    /// detections. Output failures are logged, never returned.
    pub fn process_frame(
        &mut self,
        hands: &[HandObservation],
        now: Instant,
        sink: &mut dyn InputSink,
        system: &mut dyn SystemControl,
    ) -> FrameReport {
        self.sent = 0;

        if hands.is_empty() {
            self.release(sink);
            let mut report = FrameReport::idle();
            report.commands = self.sent;
            return report;
        }

        let roles = self.resolver.resolve(hands);
        let major = Self::observe(&self.classifier, &mut self.major, roles.major, Role::Major);
        let minor = Self::observe(&self.classifier, &mut self.minor, roles.minor, Role::Minor);

        if let Some(until) = self.cooldown_until {
            if now < until {
                debug!("custom command cooldown active");
                self.cursor.clear();
                self.settle_flags(&Gesture::Palm, sink);
                return FrameReport {
                    major,
                    minor,
                    commands: self.sent,
                    ..FrameReport::idle()
                };
            }
            self.cooldown_until = None;
        }

        let acting = if minor == Gesture::PinchMinor {
            Some(Role::Minor)
        } else if major != Gesture::Palm {
            Some(Role::Major)
        } else if minor != Gesture::Palm {
            Some(Role::Minor)
        } else {
            None
        };

        let acted = match acting {
            Some(Role::Major) => major.clone(),
            Some(Role::Minor) => minor.clone(),
            None => {
                self.cursor.clear();
                Gesture::Palm
            }
        };
        let hand = acting.and_then(|role| roles.get(role).map(|h| (h, role)));

        self.handle(&acted, hand, now, sink, system);

        FrameReport {
            major,
            minor,
            acting,
            acted,
            commands: self.sent,
        }
    }

    /// Releases any held button and returns every piece of state to idle.
    pub fn release(&mut self, sink: &mut dyn InputSink) {
        if self.flags.dragging {
            info!("releasing drag");
            self.emit(sink, OutputCommand::ButtonUp(MouseButton::Left));
        }
        self.flags = ControlFlags::default();
        self.major.reset();
        self.minor.reset();
        self.pinch.reset();
        self.cursor.clear();
    }

    fn observe(
        classifier: &GestureClassifier,
        filter: &mut GestureFilter,
        hand: Option<&HandObservation>,
        role: Role,
    ) -> Gesture {
        match hand {
            Some(hand) => {
                let raw = classifier.classify(hand, role);
                debug!(role = role.as_str(), raw = %raw, "classified");
                filter.update(raw).clone()
            }
            None => {
                filter.reset();
                Gesture::Palm
            }
        }
    }

    fn handle(
        &mut self,
        gesture: &Gesture,
        hand: Option<(&HandObservation, Role)>,
        now: Instant,
        sink: &mut dyn InputSink,
        system: &mut dyn SystemControl,
    ) {
        let target = match hand {
            Some((hand, _)) if *gesture != Gesture::Palm => {
                let palm = hand.point(PALM_CENTER);
                Some(self.cursor.update((palm.x, palm.y), sink.cursor_position()))
            }
            _ => None,
        };

        self.settle_flags(gesture, sink);

        match gesture {
            Gesture::Custom(id) => {
                match self.commands.execute(id, sink, system) {
                    Ok(()) => self.cooldown_until = now.checked_add(self.cooldown),
                    Err(e @ ControlError::UnmappedCommand(_)) => {
                        warn!("{}", e);
                    }
                    Err(e) => {
                        warn!(command = %id, "custom command failed: {}", e);
                        self.cooldown_until = now.checked_add(self.cooldown);
                    }
                }
            }
            Gesture::VSign => {
                self.flags.click_armed = true;
                self.move_to(sink, target);
            }
            Gesture::Fist => {
                if !self.flags.dragging {
                    info!("drag started");
                    self.flags.dragging = true;
                    self.emit(sink, OutputCommand::ButtonDown(MouseButton::Left));
                }
                self.move_to(sink, target);
            }
            Gesture::Mid if self.flags.click_armed => {
                info!("left click");
                self.emit(sink, OutputCommand::Click(MouseButton::Left));
                self.flags.click_armed = false;
            }
            Gesture::Index if self.flags.click_armed => {
                info!("right click");
                self.emit(sink, OutputCommand::Click(MouseButton::Right));
                self.flags.click_armed = false;
            }
            Gesture::TwoFingerClosed if self.flags.click_armed => {
                info!("double click");
                self.emit(sink, OutputCommand::DoubleClick);
                self.flags.click_armed = false;
            }
            Gesture::PinchMajor | Gesture::PinchMinor => {
                if let Some((hand, role)) = hand {
                    let tip = hand.point(INDEX_TIP);
                    if !self.pinch.is_active(role) {
                        self.pinch.begin(role, (tip.x, tip.y));
                    }
                    if let Some(axis) = self.pinch.update((tip.x, tip.y)) {
                        self.apply_pinch(role, axis, sink, system);
                    }
                }
            }
            _ => {}
        }
    }

    /// Releases a drag or ends a pinch that `gesture` no longer sustains.
    fn settle_flags(&mut self, gesture: &Gesture, sink: &mut dyn InputSink) {
        if *gesture != Gesture::Fist && self.flags.dragging {
            info!("drag released");
            self.flags.dragging = false;
            self.emit(sink, OutputCommand::ButtonUp(MouseButton::Left));
        }
        if *gesture != Gesture::PinchMajor && self.pinch.is_active(Role::Major) {
            self.pinch.end(Role::Major);
        }
        if *gesture != Gesture::PinchMinor && self.pinch.is_active(Role::Minor) {
            self.pinch.end(Role::Minor);
        }
    }

    fn apply_pinch(
        &mut self,
        role: Role,
        axis: PinchAxis,
        sink: &mut dyn InputSink,
        system: &mut dyn SystemControl,
    ) {
        let level = self.pinch.applied_level();
        let step = self.scroll_step;
        match (role, axis) {
            (Role::Minor, PinchAxis::Vertical) => {
                self.emit(sink, OutputCommand::Scroll(if level > 0.0 { step } else { -step }));
            }
            (Role::Minor, PinchAxis::Horizontal) => {
                self.emit(sink, OutputCommand::KeyDown(Key::Shift));
                self.emit(sink, OutputCommand::KeyDown(Key::Control));
                self.emit(sink, OutputCommand::Scroll(if level > 0.0 { -step } else { step }));
                self.emit(sink, OutputCommand::KeyUp(Key::Control));
                self.emit(sink, OutputCommand::KeyUp(Key::Shift));
            }
            (Role::Major, PinchAxis::Vertical) => {
                let result = system
                    .volume()
                    .and_then(|v| system.set_volume((v + level / 50.0).clamp(0.0, 1.0)));
                if let Err(e) = result {
                    warn!("volume change failed: {}", e);
                }
            }
            (Role::Major, PinchAxis::Horizontal) => {
                let result = system.brightness().and_then(|b| {
                    let next = (b as f64 / 100.0 + level / 50.0).clamp(0.0, 1.0);
                    system.set_brightness((100.0 * next).round() as u8)
                });
                if let Err(e) = result {
                    warn!("brightness change failed: {}", e);
                }
            }
        }
    }

    fn move_to(&mut self, sink: &mut dyn InputSink, target: Option<(i32, i32)>) {
        if let Some((x, y)) = target {
            self.emit(sink, OutputCommand::MoveTo { x, y });
        }
    }

    fn emit(&mut self, sink: &mut dyn InputSink, command: OutputCommand) {
        self.sent += 1;
        if let Err(e) = sink.send(command) {
            warn!(?command, "{}", e);
        }
    }
}
