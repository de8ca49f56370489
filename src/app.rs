//! Application state and key handling for the claim mapping wizard

use crate::claims;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use formwright::forms::{
    FieldDescriptor, FieldKind, FormInstance, Snapshot, WizardCoordinator, WizardProgress,
};
use formwright::EngineConfig;

/// Main application struct
pub struct App {
    pub wizard: WizardCoordinator,
    /// Index into the focusable fields of the current step
    pub active_field: usize,
    /// Highlighted option of the active checkbox/radio/dropdown field
    pub option_cursor: usize,
    /// One-line feedback shown in the status bar
    pub status_message: Option<String>,
    result: Option<Snapshot>,
    quit: bool,
}

impl App {
    /// Create a new App using the configuration on disk
    pub fn new() -> Result<Self> {
        let config = EngineConfig::load()?;
        Self::with_config(&config)
    }

    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            wizard: claims::build_wizard(config)?,
            active_field: 0,
            option_cursor: 0,
            status_message: None,
            result: None,
            quit: false,
        })
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The finished wizard's values, once
    pub fn take_result(&mut self) -> Option<Snapshot> {
        self.result.take()
    }

    pub fn form(&self) -> Option<&FormInstance> {
        self.wizard.current_step().map(|step| &step.form)
    }

    /// Fields of the current step that can take focus, in order
    pub fn focusable_fields(&self) -> Vec<FieldDescriptor> {
        self.form()
            .map(|form| {
                form.fields()
                    .into_iter()
                    .filter(|field| !matches!(field.kind, FieldKind::Divider))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn active(&self) -> Option<FieldDescriptor> {
        self.focusable_fields().into_iter().nth(self.active_field)
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        self.status_message = None;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let on_options = self
            .active()
            .is_some_and(|field| field.kind.options().is_some());

        match key.code {
            KeyCode::Esc => self.cancel(),
            KeyCode::Char('p') if ctrl => self.retreat(),
            KeyCode::Char('r') if ctrl => self.reset(),
            KeyCode::Tab => self.move_focus(true).await?,
            KeyCode::BackTab => self.move_focus(false).await?,
            KeyCode::Enter => self.activate().await?,
            KeyCode::Left if on_options => self.move_option(false),
            KeyCode::Right if on_options => self.move_option(true),
            KeyCode::Char(' ') if on_options => self.select_option()?,
            KeyCode::Char(c) if !ctrl => self.input_char(c)?,
            KeyCode::Backspace => self.backspace()?,
            _ => {}
        }
        Ok(())
    }

    /// Validate the field losing focus, then move
    async fn move_focus(&mut self, forward: bool) -> Result<()> {
        let count = self.focusable_fields().len();
        if count == 0 {
            return Ok(());
        }
        if let (Some(form), Some(field)) = (self.form().cloned(), self.active()) {
            if field.holds_value() {
                form.validate_one(&field.name).await?;
            }
        }
        self.active_field = if forward {
            (self.active_field + 1) % count
        } else {
            (self.active_field + count - 1) % count
        };
        self.option_cursor = 0;
        Ok(())
    }

    async fn activate(&mut self) -> Result<()> {
        let (Some(form), Some(field)) = (self.form().cloned(), self.active()) else {
            return self.advance().await;
        };
        if form.is_disabled(&field.name) {
            self.status_message = Some(format!("{} is disabled", field.label));
            return Ok(());
        }
        match field.kind {
            FieldKind::ResetButton { .. } => self.reset(),
            FieldKind::Button { .. } => Self::press(&form, &field.name)?,
            _ => return self.advance().await,
        }
        Ok(())
    }

    /// Host actions behind generic buttons
    fn press(form: &FormInstance, name: &str) -> Result<()> {
        match name {
            claims::CLEAR_FLAGS => form.set_value("flags", Vec::<String>::new())?,
            _ => tracing::debug!("no action bound to button {}", name),
        }
        Ok(())
    }

    async fn advance(&mut self) -> Result<()> {
        match self.wizard.advance().await {
            Ok(WizardProgress::Advanced { step }) => {
                self.active_field = 0;
                self.option_cursor = 0;
                self.status_message = Some(format!("Step {} of {}", step + 1, self.wizard.len()));
            }
            Ok(WizardProgress::Stayed(report)) => {
                let failing = report.errors().count();
                self.status_message = Some(format!("{failing} field(s) need attention"));
            }
            Ok(WizardProgress::Finished(result)) => {
                self.result = Some(result);
                self.quit = true;
            }
            Ok(WizardProgress::Ignored) => {}
            Err(err) if err.is_programmer_error() => return Err(err.into()),
            Err(err) => self.status_message = Some(err.to_string()),
        }
        Ok(())
    }

    fn retreat(&mut self) {
        if self.wizard.retreat().is_ok() {
            self.active_field = 0;
            self.option_cursor = 0;
        }
    }

    fn reset(&mut self) {
        let Some(form) = self.form() else {
            return;
        };
        if !form.reset() {
            self.status_message = Some("Submission in progress".to_string());
        }
    }

    fn cancel(&mut self) {
        if let Err(err) = self.wizard.cancel() {
            tracing::debug!("cancel ignored: {}", err);
        }
        self.quit = true;
    }

    fn move_option(&mut self, forward: bool) {
        let count = self
            .active()
            .and_then(|field| field.kind.options().map(<[_]>::len))
            .unwrap_or(0);
        if count == 0 {
            return;
        }
        self.option_cursor = if forward {
            (self.option_cursor + 1) % count
        } else {
            (self.option_cursor + count - 1) % count
        };
    }

    /// Toggle (checkbox) or pick (radio, dropdown) the highlighted option
    fn select_option(&mut self) -> Result<()> {
        let (Some(form), Some(field)) = (self.form(), self.active()) else {
            return Ok(());
        };
        let Some(option) = field
            .kind
            .options()
            .and_then(|options| options.get(self.option_cursor))
        else {
            return Ok(());
        };
        if field.kind.is_multi() {
            form.toggle(&field.name, &option.value)?;
        } else {
            form.set_value(&field.name, option.value.as_str())?;
        }
        Ok(())
    }

    fn input_char(&mut self, c: char) -> Result<()> {
        self.edit_text(|text| text.push(c))
    }

    fn backspace(&mut self) -> Result<()> {
        self.edit_text(|text| {
            text.pop();
        })
    }

    fn edit_text(&mut self, edit: impl FnOnce(&mut String)) -> Result<()> {
        let (Some(form), Some(field)) = (self.form(), self.active()) else {
            return Ok(());
        };
        if !field.kind.is_text_input() {
            return Ok(());
        }
        let mut text = form
            .get_value(&field.name)
            .map(|value| value.as_text().to_string())
            .unwrap_or_default();
        edit(&mut text);
        form.set_value(&field.name, text)?;
        Ok(())
    }
}
