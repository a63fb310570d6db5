// src/output.rs - input injection and system level boundaries
use serde::Serialize;
use std::str::FromStr;
use tracing::info;

use crate::error::ControlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Key {
    Shift,
    Control,
    Alt,
    Meta,
    Enter,
    Tab,
    Escape,
    Space,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    PlayPause,
    NextTrack,
    PrevTrack,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    Char(char),
}

impl Key {
    pub fn is_modifier(self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }
}

/// Parses names as written in hotkey strings: `ctrl`, `shift`, `enter`,
/// `playpause`, or a single character.
impl FromStr for Key {
    type Err = ControlError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lower = name.trim().to_lowercase();
        let key = match lower.as_str() {
            "shift" => Key::Shift,
            "ctrl" | "control" => Key::Control,
            "alt" | "option" => Key::Alt,
            "meta" | "cmd" | "command" | "win" | "super" => Key::Meta,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "esc" | "escape" => Key::Escape,
            "space" => Key::Space,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            "playpause" => Key::PlayPause,
            "nexttrack" => Key::NextTrack,
            "prevtrack" => Key::PrevTrack,
            "volumeup" => Key::VolumeUp,
            "volumedown" => Key::VolumeDown,
            "volumemute" => Key::VolumeMute,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(ControlError::InvalidKey(name.to_string())),
                }
            }
        };
        Ok(key)
    }
}

/// One fire-and-forget command for the pointer/keyboard injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputCommand {
    MoveTo { x: i32, y: i32 },
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Click(MouseButton),
    DoubleClick,
    KeyDown(Key),
    KeyUp(Key),
    /// Press and release.
    KeyClick(Key),
    /// Wheel delta, positive scrolls up. 120 is one notch.
    Scroll(i32),
}

pub trait InputSink {
    fn screen_size(&self) -> (u32, u32);

    fn cursor_position(&self) -> (i32, i32);

    fn send(&mut self, command: OutputCommand) -> Result<(), ControlError>;

    fn type_text(&mut self, text: &str) -> Result<(), ControlError>;
}

/// Volume as a scalar in [0, 1], brightness as a percentage.
pub trait SystemControl {
    fn volume(&self) -> Result<f64, ControlError>;

    fn set_volume(&mut self, level: f64) -> Result<(), ControlError>;

    fn brightness(&self) -> Result<u8, ControlError>;

    fn set_brightness(&mut self, percent: u8) -> Result<(), ControlError>;
}

/// Sink that keeps every command and tracks the pointer it would have moved.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    screen: (u32, u32),
    position: (i32, i32),
    commands: Vec<OutputCommand>,
    typed: Vec<String>,
    log: bool,
}

impl RecordingSink {
    pub fn new(screen: (u32, u32)) -> Self {
        Self {
            screen,
            position: (screen.0 as i32 / 2, screen.1 as i32 / 2),
            commands: Vec::new(),
            typed: Vec::new(),
            log: false,
        }
    }

    /// Reports each command through tracing instead of keeping it; used for
    /// dry runs.
    pub fn logging(screen: (u32, u32)) -> Self {
        Self {
            log: true,
            ..Self::new(screen)
        }
    }

    pub fn commands(&self) -> &[OutputCommand] {
        &self.commands
    }

    pub fn typed(&self) -> &[String] {
        &self.typed
    }

    pub fn take(&mut self) -> Vec<OutputCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, wanted: OutputCommand) -> usize {
        self.commands.iter().filter(|c| **c == wanted).count()
    }
}

impl InputSink for RecordingSink {
    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn cursor_position(&self) -> (i32, i32) {
        self.position
    }

    fn send(&mut self, command: OutputCommand) -> Result<(), ControlError> {
        if let OutputCommand::MoveTo { x, y } = command {
            self.position = (x, y);
        }
        if self.log {
            info!(?command, "output");
        } else {
            self.commands.push(command);
        }
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), ControlError> {
        if self.log {
            info!(text, "typed");
        } else {
            self.typed.push(text.to_string());
        }
        Ok(())
    }
}

/// In-process volume and brightness levels, for hosts without a mixer or
/// backlight binding.
#[derive(Debug, Clone)]
pub struct SoftwareLevels {
    pub volume: f64,
    pub brightness: u8,
}

impl Default for SoftwareLevels {
    fn default() -> Self {
        Self {
            volume: 0.5,
            brightness: 50,
        }
    }
}

impl SystemControl for SoftwareLevels {
    fn volume(&self) -> Result<f64, ControlError> {
        Ok(self.volume)
    }

    fn set_volume(&mut self, level: f64) -> Result<(), ControlError> {
        if !level.is_finite() {
            return Err(ControlError::System(format!("volume level {} is not finite", level)));
        }
        self.volume = level.clamp(0.0, 1.0);
        info!(volume = self.volume, "volume set");
        Ok(())
    }

    fn brightness(&self) -> Result<u8, ControlError> {
        Ok(self.brightness)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), ControlError> {
        self.brightness = percent.min(100);
        info!(brightness = self.brightness, "brightness set");
        Ok(())
    }
}

#[cfg(feature = "enigo-backend")]
pub use self::enigo_sink::EnigoSink;

#[cfg(feature = "enigo-backend")]
mod enigo_sink {
    use enigo::{Axis, Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

    use super::{InputSink, Key, MouseButton, OutputCommand};
    use crate::error::ControlError;

    const WHEEL_NOTCH: i32 = 120;

    /// Injects commands into the running desktop session.
    pub struct EnigoSink {
        enigo: Enigo,
        screen: (u32, u32),
    }

    impl EnigoSink {
        pub fn new() -> anyhow::Result<Self> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| anyhow::anyhow!("failed to connect to input backend: {:?}", e))?;
            let (w, h) = enigo
                .main_display()
                .map_err(|e| anyhow::anyhow!("failed to query display size: {:?}", e))?;
            Ok(Self {
                enigo,
                screen: (w.max(0) as u32, h.max(0) as u32),
            })
        }
    }

    fn button(b: MouseButton) -> Button {
        match b {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
        }
    }

    fn key(k: Key) -> enigo::Key {
        match k {
            Key::Shift => enigo::Key::Shift,
            Key::Control => enigo::Key::Control,
            Key::Alt => enigo::Key::Alt,
            Key::Meta => enigo::Key::Meta,
            Key::Enter => enigo::Key::Return,
            Key::Tab => enigo::Key::Tab,
            Key::Escape => enigo::Key::Escape,
            Key::Space => enigo::Key::Space,
            Key::Backspace => enigo::Key::Backspace,
            Key::Delete => enigo::Key::Delete,
            Key::Up => enigo::Key::UpArrow,
            Key::Down => enigo::Key::DownArrow,
            Key::Left => enigo::Key::LeftArrow,
            Key::Right => enigo::Key::RightArrow,
            Key::Home => enigo::Key::Home,
            Key::End => enigo::Key::End,
            Key::PageUp => enigo::Key::PageUp,
            Key::PageDown => enigo::Key::PageDown,
            Key::PlayPause => enigo::Key::MediaPlayPause,
            Key::NextTrack => enigo::Key::MediaNextTrack,
            Key::PrevTrack => enigo::Key::MediaPrevTrack,
            Key::VolumeUp => enigo::Key::VolumeUp,
            Key::VolumeDown => enigo::Key::VolumeDown,
            Key::VolumeMute => enigo::Key::VolumeMute,
            Key::Char(c) => enigo::Key::Unicode(c),
        }
    }

    impl InputSink for EnigoSink {
        fn screen_size(&self) -> (u32, u32) {
            self.screen
        }

        fn cursor_position(&self) -> (i32, i32) {
            self.enigo.location().unwrap_or((0, 0))
        }

        fn send(&mut self, command: OutputCommand) -> Result<(), ControlError> {
            let result = match command {
                OutputCommand::MoveTo { x, y } => self.enigo.move_mouse(x, y, Coordinate::Abs),
                OutputCommand::ButtonDown(b) => self.enigo.button(button(b), Direction::Press),
                OutputCommand::ButtonUp(b) => self.enigo.button(button(b), Direction::Release),
                OutputCommand::Click(b) => self.enigo.button(button(b), Direction::Click),
                OutputCommand::DoubleClick => {
                    match self.enigo.button(Button::Left, Direction::Click) {
                        Ok(()) => self.enigo.button(Button::Left, Direction::Click),
                        Err(e) => Err(e),
                    }
                }
                OutputCommand::KeyDown(m) => self.enigo.key(key(m), Direction::Press),
                OutputCommand::KeyUp(m) => self.enigo.key(key(m), Direction::Release),
                OutputCommand::KeyClick(m) => self.enigo.key(key(m), Direction::Click),
                OutputCommand::Scroll(delta) => {
                    // enigo scrolls down for positive lengths
                    let notches = if delta == 0 {
                        0
                    } else {
                        (delta.abs() / WHEEL_NOTCH).max(1) * delta.signum()
                    };
                    self.enigo.scroll(-notches, Axis::Vertical)
                }
            };
            result.map_err(|e| ControlError::Injection(format!("{:?}", e)))
        }

        fn type_text(&mut self, text: &str) -> Result<(), ControlError> {
            self.enigo
                .text(text)
                .map_err(|e| ControlError::Injection(format!("{:?}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_tracks_pointer() {
        let mut sink = RecordingSink::new((800, 600));
        assert_eq!(sink.cursor_position(), (400, 300));
        sink.send(OutputCommand::MoveTo { x: 10, y: 20 }).unwrap();
        sink.send(OutputCommand::Click(MouseButton::Left)).unwrap();
        assert_eq!(sink.cursor_position(), (10, 20));
        assert_eq!(sink.count(OutputCommand::Click(MouseButton::Left)), 1);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn logging_sink_keeps_nothing() {
        let mut sink = RecordingSink::logging((800, 600));
        sink.send(OutputCommand::MoveTo { x: 1, y: 2 }).unwrap();
        assert_eq!(sink.cursor_position(), (1, 2));
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn typed_text_is_kept_apart_from_commands() {
        let mut sink = RecordingSink::new((800, 600));
        sink.type_text("hello").unwrap();
        assert_eq!(sink.typed(), &["hello".to_string()]);
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn key_names_parse() {
        assert_eq!("ctrl".parse::<Key>().unwrap(), Key::Control);
        assert_eq!(" Shift ".parse::<Key>().unwrap(), Key::Shift);
        assert_eq!("playpause".parse::<Key>().unwrap(), Key::PlayPause);
        assert_eq!("C".parse::<Key>().unwrap(), Key::Char('c'));
        assert_eq!("enter".parse::<Key>().unwrap(), Key::Enter);
        assert!(Key::Alt.is_modifier());
        assert!(!Key::Char('a').is_modifier());
        let err = "hyper".parse::<Key>().unwrap_err();
        assert!(matches!(err, ControlError::InvalidKey(ref k) if k == "hyper"));
        assert!("".parse::<Key>().is_err());
    }

    #[test]
    fn non_finite_volume_is_rejected() {
        let mut levels = SoftwareLevels::default();
        let err = levels.set_volume(f64::NAN).unwrap_err();
        assert!(matches!(err, ControlError::System(_)));
        assert_eq!(levels.volume, 0.5);
    }

    #[test]
    fn software_levels_clamp() {
        let mut levels = SoftwareLevels::default();
        levels.set_volume(1.7).unwrap();
        assert_eq!(levels.volume().unwrap(), 1.0);
        levels.set_brightness(140).unwrap();
        assert_eq!(levels.brightness().unwrap(), 100);
    }
}
