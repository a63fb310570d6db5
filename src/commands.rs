// src/commands.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::process::Command;
use tracing::info;

use crate::error::ControlError;
use crate::gesture::CommandId;
use crate::output::{InputSink, Key, MouseButton, OutputCommand, SystemControl};

const VOLUME_STEP: f64 = 0.1;
const BRIGHTNESS_STEP: i16 = 10;
const SCROLL_DELTA: i32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseAction {
    ClickLeft,
    ClickRight,
    DoubleClick,
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemAction {
    VolumeUp,
    VolumeDown,
    BrightnessUp,
    BrightnessDown,
}

/// Hotkey such as `ctrl+shift+t`: modifiers held in order around the last key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCombo {
    names: Vec<String>,
    keys: Vec<Key>,
}

impl KeyCombo {
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn commands(&self) -> Vec<OutputCommand> {
        let Some((last, held)) = self.keys.split_last() else {
            return Vec::new();
        };
        let mut commands: Vec<OutputCommand> = held.iter().map(|k| OutputCommand::KeyDown(*k)).collect();
        commands.push(OutputCommand::KeyClick(*last));
        commands.extend(held.iter().rev().map(|k| OutputCommand::KeyUp(*k)));
        commands
    }
}

impl TryFrom<String> for KeyCombo {
    type Error = ControlError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        let names: Vec<String> = text.split('+').map(|n| n.trim().to_string()).collect();
        let keys = names
            .iter()
            .map(|n| n.parse::<Key>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names, keys })
    }
}

impl From<KeyCombo> for String {
    fn from(combo: KeyCombo) -> Self {
        combo.to_string()
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join("+"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardAction {
    /// Press a hotkey, e.g. `ctrl+c` or `playpause`.
    Press(KeyCombo),
    /// Type literal text.
    Type(String),
}

/// What a custom command does when its gesture fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CommandAction {
    Mouse(MouseAction),
    Keyboard(KeyboardAction),
    System(SystemAction),
    Spawn {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Log(String),
}

/// Maps command ids to actions.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    actions: HashMap<String, CommandAction>,
}

impl CommandRegistry {
    pub fn new(actions: HashMap<String, CommandAction>) -> Self {
        Self { actions }
    }

    pub fn register(&mut self, id: impl Into<String>, action: CommandAction) {
        self.actions.insert(id.into(), action);
    }

    pub fn contains(&self, id: &CommandId) -> bool {
        self.actions.contains_key(id.as_str())
    }

    pub fn execute(
        &self,
        id: &CommandId,
        sink: &mut dyn InputSink,
        system: &mut dyn SystemControl,
    ) -> Result<(), ControlError> {
        let action = self
            .actions
            .get(id.as_str())
            .ok_or_else(|| ControlError::UnmappedCommand(id.to_string()))?;
        info!(command = %id, ?action, "executing custom command");

        match action {
            CommandAction::Mouse(mouse) => {
                let command = match mouse {
                    MouseAction::ClickLeft => OutputCommand::Click(MouseButton::Left),
                    MouseAction::ClickRight => OutputCommand::Click(MouseButton::Right),
                    MouseAction::DoubleClick => OutputCommand::DoubleClick,
                    MouseAction::ScrollUp => OutputCommand::Scroll(SCROLL_DELTA),
                    MouseAction::ScrollDown => OutputCommand::Scroll(-SCROLL_DELTA),
                };
                sink.send(command)
            }
            CommandAction::Keyboard(KeyboardAction::Press(combo)) => {
                for command in combo.commands() {
                    sink.send(command)?;
                }
                Ok(())
            }
            CommandAction::Keyboard(KeyboardAction::Type(text)) => sink.type_text(text),
            CommandAction::System(action) => match action {
                SystemAction::VolumeUp => adjust_volume(system, VOLUME_STEP),
                SystemAction::VolumeDown => adjust_volume(system, -VOLUME_STEP),
                SystemAction::BrightnessUp => adjust_brightness(system, BRIGHTNESS_STEP),
                SystemAction::BrightnessDown => adjust_brightness(system, -BRIGHTNESS_STEP),
            },
            CommandAction::Spawn { program, args } => {
                // not waited on
                Command::new(program).args(args).spawn()?;
                Ok(())
            }
            CommandAction::Log(message) => {
                info!(command = %id, "{}", message);
                Ok(())
            }
        }
    }
}

fn adjust_volume(system: &mut dyn SystemControl, delta: f64) -> Result<(), ControlError> {
    let current = system.volume()?;
    system.set_volume((current + delta).clamp(0.0, 1.0))
}

fn adjust_brightness(system: &mut dyn SystemControl, delta: i16) -> Result<(), ControlError> {
    let current = system.brightness()? as i16;
    system.set_brightness((current + delta).clamp(0, 100) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{RecordingSink, SoftwareLevels};
    use approx::assert_relative_eq;

    #[test]
    fn unknown_command_is_reported() {
        let registry = CommandRegistry::default();
        let mut sink = RecordingSink::new((100, 100));
        let mut levels = SoftwareLevels::default();
        let err = registry
            .execute(&CommandId::new("launch"), &mut sink, &mut levels)
            .unwrap_err();
        assert!(matches!(err, ControlError::UnmappedCommand(ref id) if id == "launch"));
    }

    #[test]
    fn mouse_and_system_actions() {
        let mut registry = CommandRegistry::default();
        registry.register("click", CommandAction::Mouse(MouseAction::ClickRight));
        registry.register("louder", CommandAction::System(SystemAction::VolumeUp));
        registry.register("dimmer", CommandAction::System(SystemAction::BrightnessDown));

        let mut sink = RecordingSink::new((100, 100));
        let mut levels = SoftwareLevels::default();
        registry.execute(&CommandId::new("click"), &mut sink, &mut levels).unwrap();
        registry.execute(&CommandId::new("louder"), &mut sink, &mut levels).unwrap();
        registry.execute(&CommandId::new("dimmer"), &mut sink, &mut levels).unwrap();

        assert_eq!(sink.commands(), &[OutputCommand::Click(MouseButton::Right)]);
        assert_relative_eq!(levels.volume, 0.6, epsilon = 1e-12);
        assert_eq!(levels.brightness, 40);
    }

    #[test]
    fn hotkey_holds_modifiers_around_last_key() {
        let mut registry = CommandRegistry::default();
        let combo = KeyCombo::try_from("ctrl+shift+t".to_string()).unwrap();
        registry.register("reopen", CommandAction::Keyboard(KeyboardAction::Press(combo)));
        registry.register(
            "media",
            CommandAction::Keyboard(KeyboardAction::Press(KeyCombo::try_from("playpause".to_string()).unwrap())),
        );
        registry.register("greet", CommandAction::Keyboard(KeyboardAction::Type("hi there".into())));

        let mut sink = RecordingSink::new((100, 100));
        let mut levels = SoftwareLevels::default();
        registry.execute(&CommandId::new("reopen"), &mut sink, &mut levels).unwrap();
        registry.execute(&CommandId::new("media"), &mut sink, &mut levels).unwrap();
        registry.execute(&CommandId::new("greet"), &mut sink, &mut levels).unwrap();

        assert_eq!(
            sink.commands(),
            &[
                OutputCommand::KeyDown(Key::Control),
                OutputCommand::KeyDown(Key::Shift),
                OutputCommand::KeyClick(Key::Char('t')),
                OutputCommand::KeyUp(Key::Shift),
                OutputCommand::KeyUp(Key::Control),
                OutputCommand::KeyClick(Key::PlayPause),
            ]
        );
        assert_eq!(sink.typed(), &["hi there".to_string()]);
    }

    #[test]
    fn keyboard_actions_parse_from_json() {
        let json = r#"{
            "copy": {"type": "keyboard", "value": {"press": "ctrl+c"}},
            "sign": {"type": "keyboard", "value": {"type": "Regards"}}
        }"#;
        let actions: HashMap<String, CommandAction> = serde_json::from_str(json).unwrap();
        match &actions["copy"] {
            CommandAction::Keyboard(KeyboardAction::Press(combo)) => {
                assert_eq!(combo.keys(), &[Key::Control, Key::Char('c')]);
                assert_eq!(combo.to_string(), "ctrl+c");
            }
            other => panic!("unexpected action {:?}", other),
        }
        assert_eq!(actions["sign"], CommandAction::Keyboard(KeyboardAction::Type("Regards".into())));

        let bad = r#"{"type": "keyboard", "value": {"press": "ctrl+nope"}}"#;
        assert!(serde_json::from_str::<CommandAction>(bad).is_err());
    }

    #[test]
    fn actions_parse_from_json() {
        let json = r#"{
            "media": {"type": "spawn", "value": {"program": "playerctl", "args": ["play-pause"]}},
            "hello": {"type": "log", "value": "hi"},
            "up": {"type": "mouse", "value": "scroll_up"}
        }"#;
        let actions: HashMap<String, CommandAction> = serde_json::from_str(json).unwrap();
        assert_eq!(actions["up"], CommandAction::Mouse(MouseAction::ScrollUp));
        assert_eq!(
            actions["media"],
            CommandAction::Spawn {
                program: "playerctl".into(),
                args: vec!["play-pause".into()]
            }
        );
        assert!(CommandRegistry::new(actions).contains(&CommandId::new("hello")));
    }
}
