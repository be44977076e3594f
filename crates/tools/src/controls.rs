use vitrine_common::Color;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("no control named {0:?}")]
    Unknown(String),
    #[error("control {key:?} is not a {expected}")]
    WrongKind { key: String, expected: &'static str },
    #[error("choice {index} out of range for {key:?}")]
    ChoiceOutOfRange { key: String, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Number { min: f32, max: f32, step: f32 },
    Toggle,
    Color,
    Choice { options: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Number(f32),
    Toggle(bool),
    Color(Color),
    Choice(usize),
}

/// One tweakable value.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub key: String,
    pub label: String,
    pub folder: Option<String>,
    pub kind: ControlKind,
    value: ControlValue,
}

impl Control {
    pub fn in_folder(&mut self, folder: &str) -> &mut Self {
        self.folder = Some(folder.to_string());
        self
    }

    pub fn labeled(&mut self, label: &str) -> &mut Self {
        self.label = label.to_string();
        self
    }

    pub fn value(&self) -> ControlValue {
        self.value
    }
}

/// A flat list of debug controls, grouped into folders for display.
///
/// Hosts write through the `set_*` methods; each change that actually
/// alters a value is queued and handed out once by [`take_changes`].
///
/// [`take_changes`]: ControlPanel::take_changes
#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    controls: Vec<Control>,
    changed: Vec<String>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Folder names in first-use order. Controls without one come first.
    pub fn folders(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for name in self.controls.iter().filter_map(|c| c.folder.as_deref()) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    fn push(&mut self, key: &str, kind: ControlKind, value: ControlValue) -> &mut Control {
        self.controls.retain(|c| c.key != key);
        self.controls.push(Control {
            key: key.to_string(),
            label: key.to_string(),
            folder: None,
            kind,
            value,
        });
        let last = self.controls.len() - 1;
        &mut self.controls[last]
    }

    pub fn add_number(&mut self, key: &str, value: f32, min: f32, max: f32, step: f32) -> &mut Control {
        let value = value.clamp(min, max);
        self.push(key, ControlKind::Number { min, max, step }, ControlValue::Number(value))
    }

    pub fn add_toggle(&mut self, key: &str, value: bool) -> &mut Control {
        self.push(key, ControlKind::Toggle, ControlValue::Toggle(value))
    }

    pub fn add_color(&mut self, key: &str, value: impl Into<Color>) -> &mut Control {
        self.push(key, ControlKind::Color, ControlValue::Color(value.into()))
    }

    pub fn add_choice(&mut self, key: &str, options: &[&str], selected: usize) -> &mut Control {
        let options: Vec<String> = options.iter().map(|s| s.to_string()).collect();
        let selected = selected.min(options.len().saturating_sub(1));
        self.push(key, ControlKind::Choice { options }, ControlValue::Choice(selected))
    }

    pub fn get(&self, key: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.key == key)
    }

    pub fn number(&self, key: &str) -> Option<f32> {
        match self.get(key)?.value {
            ControlValue::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn toggle(&self, key: &str) -> Option<bool> {
        match self.get(key)?.value {
            ControlValue::Toggle(v) => Some(v),
            _ => None,
        }
    }

    pub fn color(&self, key: &str) -> Option<Color> {
        match self.get(key)?.value {
            ControlValue::Color(v) => Some(v),
            _ => None,
        }
    }

    pub fn choice(&self, key: &str) -> Option<usize> {
        match self.get(key)?.value {
            ControlValue::Choice(v) => Some(v),
            _ => None,
        }
    }

    /// Label of the selected option of a choice control.
    pub fn choice_label(&self, key: &str) -> Option<&str> {
        let control = self.get(key)?;
        match (&control.kind, control.value) {
            (ControlKind::Choice { options }, ControlValue::Choice(i)) => {
                options.get(i).map(String::as_str)
            }
            _ => None,
        }
    }

    fn control_mut(&mut self, key: &str) -> Result<&mut Control, ControlError> {
        self.controls
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| ControlError::Unknown(key.to_string()))
    }

    fn update(&mut self, key: &str, value: ControlValue) {
        let Some(control) = self.controls.iter_mut().find(|c| c.key == key) else {
            return;
        };
        if control.value == value {
            return;
        }
        control.value = value;
        tracing::debug!(control = key, ?value, "control changed");
        if !self.changed.iter().any(|k| k == key) {
            self.changed.push(key.to_string());
        }
    }

    /// Set a number, clamped to its range and snapped to its step.
    pub fn set_number(&mut self, key: &str, value: f32) -> Result<(), ControlError> {
        let control = self.control_mut(key)?;
        let ControlKind::Number { min, max, step } = control.kind else {
            return Err(wrong(key, "number"));
        };
        self.update(key, ControlValue::Number(snap(value, min, max, step)));
        Ok(())
    }

    pub fn set_toggle(&mut self, key: &str, value: bool) -> Result<(), ControlError> {
        if self.control_mut(key)?.kind != ControlKind::Toggle {
            return Err(wrong(key, "toggle"));
        }
        self.update(key, ControlValue::Toggle(value));
        Ok(())
    }

    pub fn set_color(&mut self, key: &str, value: impl Into<Color>) -> Result<(), ControlError> {
        if self.control_mut(key)?.kind != ControlKind::Color {
            return Err(wrong(key, "color"));
        }
        self.update(key, ControlValue::Color(value.into()));
        Ok(())
    }

    pub fn set_choice(&mut self, key: &str, index: usize) -> Result<(), ControlError> {
        let ControlKind::Choice { options } = &self.control_mut(key)?.kind else {
            return Err(wrong(key, "choice"));
        };
        if index >= options.len() {
            return Err(ControlError::ChoiceOutOfRange {
                key: key.to_string(),
                index,
            });
        }
        self.update(key, ControlValue::Choice(index));
        Ok(())
    }

    /// Keys changed since the last call, in first-change order.
    pub fn take_changes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.changed)
    }
}

fn wrong(key: &str, expected: &'static str) -> ControlError {
    ControlError::WrongKind {
        key: key.to_string(),
        expected,
    }
}

fn snap(value: f32, min: f32, max: f32, step: f32) -> f32 {
    let v = if step > 0.0 {
        min + ((value - min) / step).round() * step
    } else {
        value
    };
    v.clamp(min, max)
}
