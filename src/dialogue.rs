//! Dialogue module: multi-turn field collection driven by step tables.
//!
//! Every dialog is a linear sequence of [`Step`]s. [`DialogEngine`] keeps
//! the user's position and collected values in the session store and moves
//! one step per accepted input until the last step, at which point the
//! collected values are handed back as a typed [`Submission`].

use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::UserId;
use tracing::{debug, error};

use crate::models::{PlantingRecord, RegistrationForm};
use crate::session::SessionStore;

/// Named dialogs the bot can run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Login,
    Registration,
    Planting,
}

/// Value slots a dialog step can fill
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    Password,
    FirstName,
    LastName,
    PhoneNumber,
    Region,
    BirthDate,
    Bucket,
    Location,
    Photo,
}

/// Kind of message a step accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Location,
    Image,
}

/// One step of a dialog
#[derive(Debug, PartialEq)]
pub struct Step {
    pub field: Field,
    pub input: InputKind,
    /// Localization key of the prompt asking for this field
    pub prompt: &'static str,
    /// Localization key sent when the input has the wrong kind
    pub reprompt: &'static str,
}

const fn text_step(field: Field, prompt: &'static str) -> Step {
    Step {
        field,
        input: InputKind::Text,
        prompt,
        reprompt: prompt,
    }
}

static LOGIN_STEPS: [Step; 2] = [
    text_step(Field::Username, "login-username-prompt"),
    text_step(Field::Password, "login-password-prompt"),
];

static REGISTRATION_STEPS: [Step; 7] = [
    text_step(Field::Username, "register-username-prompt"),
    text_step(Field::Password, "register-password-prompt"),
    text_step(Field::FirstName, "register-first-name-prompt"),
    text_step(Field::LastName, "register-last-name-prompt"),
    text_step(Field::PhoneNumber, "register-phone-prompt"),
    text_step(Field::Region, "register-region-prompt"),
    text_step(Field::BirthDate, "register-birth-date-prompt"),
];

static PLANTING_STEPS: [Step; 3] = [
    text_step(Field::Bucket, "plant-bucket-prompt"),
    Step {
        field: Field::Location,
        input: InputKind::Location,
        prompt: "plant-location-prompt",
        reprompt: "plant-location-invalid",
    },
    Step {
        field: Field::Photo,
        input: InputKind::Image,
        prompt: "plant-photo-prompt",
        reprompt: "plant-photo-invalid",
    },
];

impl DialogKind {
    pub fn steps(self) -> &'static [Step] {
        match self {
            DialogKind::Login => &LOGIN_STEPS,
            DialogKind::Registration => &REGISTRATION_STEPS,
            DialogKind::Planting => &PLANTING_STEPS,
        }
    }

    /// Whether the dialog may only be started with a stored credential
    pub fn requires_credential(self) -> bool {
        matches!(self, DialogKind::Planting)
    }

    pub fn first_step(self) -> &'static Step {
        &self.steps()[0]
    }
}

/// A value captured from one user message
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Coordinate { latitude: f64, longitude: f64 },
    Image(Vec<u8>),
}

/// A dialog in progress
#[derive(Clone, Debug, PartialEq)]
pub struct PendingDialog {
    pub kind: DialogKind,
    /// Index of the step waiting for input
    pub step: usize,
    pub fields: HashMap<Field, FieldValue>,
}

impl PendingDialog {
    fn new(kind: DialogKind) -> Self {
        Self {
            kind,
            step: 0,
            fields: HashMap::new(),
        }
    }

    pub fn current_step(&self) -> &'static Step {
        &self.kind.steps()[self.step]
    }

    fn take_text(&mut self, field: Field) -> Result<String, DialogError> {
        match self.fields.remove(&field) {
            Some(FieldValue::Text(text)) => Ok(text),
            _ => Err(DialogError::MissingField(field)),
        }
    }

    fn into_submission(mut self) -> Result<Submission, DialogError> {
        let submission = match self.kind {
            DialogKind::Login => Submission::Login {
                username: self.take_text(Field::Username)?,
                password: self.take_text(Field::Password)?,
            },
            DialogKind::Registration => Submission::Registration(RegistrationForm {
                username: self.take_text(Field::Username)?,
                password: self.take_text(Field::Password)?,
                first_name: self.take_text(Field::FirstName)?,
                last_name: self.take_text(Field::LastName)?,
                phone_number: self.take_text(Field::PhoneNumber)?,
                region: self.take_text(Field::Region)?,
                birth_date: self.take_text(Field::BirthDate)?,
            }),
            DialogKind::Planting => {
                let bucket = self.take_text(Field::Bucket)?;
                let Some(FieldValue::Coordinate {
                    latitude,
                    longitude,
                }) = self.fields.remove(&Field::Location)
                else {
                    return Err(DialogError::MissingField(Field::Location));
                };
                let Some(FieldValue::Image(photo)) = self.fields.remove(&Field::Photo) else {
                    return Err(DialogError::MissingField(Field::Photo));
                };
                Submission::Planting(PlantingRecord {
                    bucket,
                    latitude,
                    longitude,
                    photo,
                })
            }
        };
        Ok(submission)
    }
}

/// A user message, reduced to what dialogs can consume
#[derive(Clone, Debug, PartialEq)]
pub enum DialogInput {
    Text(String),
    Location { latitude: f64, longitude: f64 },
    Image(Vec<u8>),
    /// Anything else (stickers, documents, ...)
    Other,
}

impl DialogInput {
    fn accept(self, kind: InputKind) -> Option<FieldValue> {
        match (kind, self) {
            (InputKind::Text, DialogInput::Text(text)) if !text.trim().is_empty() => {
                Some(FieldValue::Text(text))
            }
            (
                InputKind::Location,
                DialogInput::Location {
                    latitude,
                    longitude,
                },
            ) => Some(FieldValue::Coordinate {
                latitude,
                longitude,
            }),
            (InputKind::Image, DialogInput::Image(bytes)) if !bytes.is_empty() => {
                Some(FieldValue::Image(bytes))
            }
            _ => None,
        }
    }
}

/// Collected values of a completed dialog
#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Login { username: String, password: String },
    Registration(RegistrationForm),
    Planting(PlantingRecord),
}

/// Result of feeding one input to the engine
#[derive(Debug, PartialEq)]
pub enum Advance {
    /// No dialog in progress; the input is not dialog input
    Idle,
    /// Input accepted, ask for the next field
    Next(&'static Step),
    /// Input rejected, the same step is still waiting
    Reprompt(&'static Step),
    /// Last field collected; the dialog is over
    Submit(Submission),
    /// The dialog ended without a complete submission
    Aborted(DialogError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogError {
    /// The dialog needs a credential and the user has none
    Unauthenticated,
    /// A completed dialog lacks a value for this field
    MissingField(Field),
}

impl std::fmt::Display for DialogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogError::Unauthenticated => write!(f, "login required"),
            DialogError::MissingField(field) => write!(f, "no value collected for {field:?}"),
        }
    }
}

impl std::error::Error for DialogError {}

/// Generic step executor shared by all dialogs
#[derive(Clone)]
pub struct DialogEngine {
    sessions: Arc<dyn SessionStore>,
}

impl DialogEngine {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Start `kind` for `user`, discarding any unfinished dialog
    pub fn begin(&self, kind: DialogKind, user: UserId) -> Result<&'static Step, DialogError> {
        let mut session = self.sessions.get(user);
        if kind.requires_credential() && session.credential.is_none() {
            debug!(user_id = %user, dialog = ?kind, "Dialog refused without credential");
            return Err(DialogError::Unauthenticated);
        }

        if let Some(previous) = &session.pending {
            debug!(user_id = %user, discarded = ?previous.kind, "Discarding unfinished dialog");
        }
        session.pending = Some(PendingDialog::new(kind));
        self.sessions.set(user, session);

        debug!(user_id = %user, dialog = ?kind, "Dialog started");
        Ok(kind.first_step())
    }

    /// Feed one user message to the dialog in progress
    pub fn advance(&self, user: UserId, input: DialogInput) -> Advance {
        let mut session = self.sessions.get(user);
        let Some(mut pending) = session.pending.take() else {
            return Advance::Idle;
        };

        let step = pending.current_step();
        let Some(value) = input.accept(step.input) else {
            debug!(user_id = %user, field = ?step.field, "Input rejected, re-prompting");
            return Advance::Reprompt(step);
        };

        pending.fields.insert(step.field, value);
        pending.step += 1;

        if pending.step < pending.kind.steps().len() {
            let next = pending.current_step();
            session.pending = Some(pending);
            self.sessions.set(user, session);
            Advance::Next(next)
        } else {
            self.sessions.set(user, session);
            debug!(user_id = %user, dialog = ?pending.kind, "Dialog complete");
            match pending.into_submission() {
                Ok(submission) => Advance::Submit(submission),
                Err(e) => {
                    error!(user_id = %user, error = %e, "Dialog completed with missing fields");
                    Advance::Aborted(e)
                }
            }
        }
    }

    /// Drop the dialog in progress; returns whether there was one
    pub fn cancel(&self, user: UserId) -> bool {
        let mut session = self.sessions.get(user);
        let was_pending = session.pending.take().is_some();
        self.sessions.set(user, session);
        was_pending
    }

    /// Step currently waiting for `user`'s input
    pub fn current_step(&self, user: UserId) -> Option<&'static Step> {
        self.sessions
            .get(user)
            .pending
            .map(|pending| pending.current_step())
    }

    pub fn expected_input(&self, user: UserId) -> Option<InputKind> {
        self.current_step(user).map(|step| step.input)
    }
}
