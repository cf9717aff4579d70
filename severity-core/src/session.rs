//! Form session: one immutable snapshot per event.
//!
//! Every change (user input, geolocation, weather auto-fill, prediction
//! responses) goes through [`Session::reduce`]. Submissions are tagged with a
//! [`Ticket`]; a response is applied only while its ticket is the one being
//! waited on, so a slow answer to an earlier submit can never overwrite a newer one.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::{
    client::{Predictor, autofill_weather},
    model::{Coordinates, FormState, FormUpdate},
    payload::build_payload,
    provider::WeatherProvider,
    render::SeverityReport,
    weather::WeatherReading,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Submitting(Ticket),
    Success(i64),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Input(FormUpdate),
    Located(Coordinates),
    WeatherStarted,
    WeatherFilled(WeatherReading),
    WeatherFailed(String),
    SubmitStarted,
    PredictionReceived { ticket: Ticket, severity: i64 },
    PredictionFailed { ticket: Ticket, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub form: FormState,
    pub phase: Phase,
    /// A weather lookup is in flight.
    pub loading: bool,
    /// Last weather lookup error, shown inline.
    pub error: Option<String>,
    next_ticket: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(FormState::default())
    }
}

impl Session {
    pub fn new(form: FormState) -> Self {
        Self { form, phase: Phase::Idle, loading: false, error: None, next_ticket: 1 }
    }

    pub fn reduce(mut self, event: Event) -> Self {
        match event {
            Event::Input(update) => {
                self.form = self.form.apply(update);
                self.settle();
            }
            Event::Located(coords) => {
                self.form = self.form.with_coordinates(coords);
                self.settle();
            }
            Event::WeatherStarted => {
                self.loading = true;
                self.error = None;
            }
            Event::WeatherFilled(reading) => {
                self.loading = false;
                self.form = self.form.with_weather(&reading);
                self.settle();
            }
            Event::WeatherFailed(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            Event::SubmitStarted => return self.begin_submit().0,
            Event::PredictionReceived { ticket, severity } => {
                if self.awaiting(ticket) {
                    self.phase = Phase::Success(severity);
                } else {
                    tracing::debug!(?ticket, "discarding stale prediction");
                }
            }
            Event::PredictionFailed { ticket, message } => {
                if self.awaiting(ticket) {
                    self.phase = Phase::Failed(message);
                } else {
                    tracing::debug!(?ticket, "discarding stale prediction failure");
                }
            }
        }
        self
    }

    /// Start a submission and hand back the ticket its response must carry.
    pub fn begin_submit(mut self) -> (Self, Ticket) {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.error = None;
        self.phase = Phase::Submitting(ticket);
        (self, ticket)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, Phase::Submitting(_))
    }

    pub fn report(&self) -> Option<SeverityReport> {
        match self.phase {
            Phase::Success(severity) => Some(SeverityReport::new(severity)),
            _ => None,
        }
    }

    fn awaiting(&self, ticket: Ticket) -> bool {
        self.phase == Phase::Submitting(ticket)
    }

    /// A finished result is cleared by the next change to the form.
    fn settle(&mut self) {
        if matches!(self.phase, Phase::Success(_) | Phase::Failed(_)) {
            self.phase = Phase::Idle;
        }
    }
}

/// One-shot source of the device location.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self) -> anyhow::Result<Coordinates>;
}

/// Reports a fixed (usually configured) location, or fails when there is none.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator(pub Option<Coordinates>);

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> anyhow::Result<Coordinates> {
        self.0.ok_or_else(|| anyhow::anyhow!("No location available"))
    }
}

/// Fresh session stamped with `now`, located if the locator can manage it.
pub async fn initialize(locator: &dyn Locator, now: NaiveDateTime) -> Session {
    let session = Session::default().reduce(Event::Input(FormUpdate::DateTime(now)));

    match locator.locate().await {
        Ok(coords) => session.reduce(Event::Located(coords)),
        Err(err) => {
            tracing::debug!(error = %err, "geolocation unavailable, leaving coordinates empty");
            session
        }
    }
}

/// Run a weather lookup and merge the outcome into the session.
pub async fn run_autofill(
    session: Session,
    provider: &dyn WeatherProvider,
    use_form_time: bool,
) -> Session {
    let session = session.reduce(Event::WeatherStarted);

    let event = match autofill_weather(provider, &session.form, use_form_time).await {
        Ok(reading) => Event::WeatherFilled(reading),
        Err(err) => Event::WeatherFailed(err.to_string()),
    };

    session.reduce(event)
}

/// Build the payload from the current form, submit it, and record the answer.
pub async fn run_submit(session: Session, predictor: &dyn Predictor, now: NaiveDateTime) -> Session {
    let (session, ticket) = session.begin_submit();
    let payload = build_payload(&session.form, now);

    let event = match predictor.predict(&payload).await {
        Ok(severity) => Event::PredictionReceived { ticket, severity },
        Err(err) => Event::PredictionFailed { ticket, message: err.to_string() },
    };

    session.reduce(event)
}
