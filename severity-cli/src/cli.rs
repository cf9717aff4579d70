use anyhow::{Context, bail};
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Text};
use severity_core::{
    Config, Coordinates, Event, FormUpdate, InferenceClient, Phase, RoadFeature, Session,
    payload::build_payload,
    provider::provider_from_config,
    render::SeverityReport,
    session::{FixedLocator, initialize, run_autofill, run_submit},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "severity", version, about = "Accident severity prediction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the proxy URL, forecast URL and home location.
    Configure,

    /// Look up weather for a location and show it in form units.
    Weather {
        #[command(flatten)]
        location: LocationArgs,

        /// Local date/time to look up (e.g. 2024-05-01T14:30); if absent, current conditions.
        #[arg(long, value_parser = parse_datetime)]
        at: Option<NaiveDateTime>,
    },

    /// Print the feature payload that would be submitted.
    Payload {
        #[command(flatten)]
        form: FormArgs,
    },

    /// Submit the form and show the predicted severity.
    Predict {
        #[command(flatten)]
        form: FormArgs,

        /// Fill weather fields from the forecast service before submitting.
        #[arg(long)]
        autofill: bool,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude; defaults to the configured home location.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<String>,

    /// Longitude; defaults to the configured home location.
    #[arg(long, allow_hyphen_values = true)]
    pub lng: Option<String>,
}

#[derive(Debug, Args)]
pub struct FormArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Accident date & time (e.g. 2024-05-01T14:30); defaults to now.
    #[arg(long, value_parser = parse_datetime)]
    pub at: Option<NaiveDateTime>,

    /// Duration in minutes.
    #[arg(long)]
    pub duration: Option<String>,

    /// Temperature (°F).
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<String>,

    /// Humidity (%).
    #[arg(long)]
    pub humidity: Option<String>,

    /// Visibility (mi).
    #[arg(long)]
    pub visibility: Option<String>,

    /// Wind speed (mph).
    #[arg(long)]
    pub wind_speed: Option<String>,

    /// Pressure (in).
    #[arg(long)]
    pub pressure: Option<String>,

    /// Weather condition: Clear, Cloudy, Rain, Snow, Fog, Thunderstorm, Drizzle.
    #[arg(long)]
    pub condition: Option<String>,

    /// Road feature present at the scene; repeatable (e.g. --feature junction --feature stop).
    #[arg(long = "feature", value_parser = parse_feature)]
    pub features: Vec<RoadFeature>,
}

impl LocationArgs {
    fn updates(&self) -> Vec<FormUpdate> {
        let mut out = Vec::new();
        if let Some(lat) = &self.lat {
            out.push(FormUpdate::Latitude(lat.clone()));
        }
        if let Some(lng) = &self.lng {
            out.push(FormUpdate::Longitude(lng.clone()));
        }
        out
    }
}

impl FormArgs {
    /// Field edits in the order a user would make them on the form.
    fn updates(&self) -> Vec<FormUpdate> {
        let mut out = self.location.updates();

        if let Some(at) = self.at {
            out.push(FormUpdate::DateTime(at));
        }

        let text_fields: [(&Option<String>, fn(String) -> FormUpdate); 7] = [
            (&self.duration, FormUpdate::Duration),
            (&self.temperature, FormUpdate::Temperature),
            (&self.humidity, FormUpdate::Humidity),
            (&self.visibility, FormUpdate::Visibility),
            (&self.wind_speed, FormUpdate::WindSpeed),
            (&self.pressure, FormUpdate::Pressure),
            (&self.condition, FormUpdate::WeatherCondition),
        ];
        for (value, update) in text_fields {
            if let Some(v) = value {
                out.push(update(v.clone()));
            }
        }

        out.extend(self.features.iter().map(|f| FormUpdate::Flag(*f, true)));
        out
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] =
        ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s.trim(), fmt).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM, got '{s}'"))
}

fn parse_feature(s: &str) -> Result<RoadFeature, String> {
    RoadFeature::try_from(s).map_err(|e| e.to_string())
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Start a session the way the form does on load, then apply the user's edits.
async fn session_with(config: &Config, updates: Vec<FormUpdate>) -> Session {
    let session = initialize(&FixedLocator(config.home), now()).await;
    updates.into_iter().fold(session, |s, u| s.reduce(Event::Input(u)))
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Weather { location, at } => {
                let config = Config::load()?;
                let mut updates = location.updates();
                if let Some(at) = at {
                    updates.push(FormUpdate::DateTime(at));
                }
                let session = session_with(&config, updates).await;

                let provider = provider_from_config(&config);
                let session = run_autofill(session, provider.as_ref(), at.is_some()).await;
                if let Some(err) = &session.error {
                    bail!("{err}");
                }

                print_weather(&session);
                Ok(())
            }
            Command::Payload { form } => {
                let config = Config::load()?;
                let session = session_with(&config, form.updates()).await;

                let payload = build_payload(&session.form, now());
                let json = serde_json::to_string_pretty(&payload)
                    .context("Failed to serialize feature payload")?;
                println!("{json}");
                Ok(())
            }
            Command::Predict { form, autofill } => {
                let config = Config::load()?;
                let mut session = session_with(&config, form.updates()).await;

                if autofill {
                    let provider = provider_from_config(&config);
                    session = run_autofill(session, provider.as_ref(), form.at.is_some()).await;
                    if let Some(err) = &session.error {
                        eprintln!("warning: {err}; submitting with the values entered");
                    }
                }

                let client = InferenceClient::new(config.proxy_url().to_owned());
                tracing::info!(url = client.url(), "submitting prediction");
                eprintln!("Analyzing…");
                let session = run_submit(session, &client, now()).await;

                match session.phase {
                    Phase::Success(severity) => {
                        print_report(&SeverityReport::new(severity));
                        Ok(())
                    }
                    Phase::Failed(message) => bail!(message),
                    other => bail!("Prediction did not complete ({other:?})"),
                }
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let proxy = Text::new("Inference proxy URL:")
        .with_default(config.proxy_url())
        .prompt()
        .context("Failed to read proxy URL")?;
    config.set_proxy_url(proxy);

    let forecast = Text::new("Forecast service URL:")
        .with_default(config.forecast_url())
        .prompt()
        .context("Failed to read forecast URL")?;
    config.set_forecast_url(forecast);

    let set_home = Confirm::new("Set a home location (used when no --lat/--lng is given)?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?;

    if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;
        config.set_home(Some(Coordinates { latitude, longitude }));
    } else {
        config.set_home(None);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_weather(session: &Session) {
    let form = &session.form;
    let condition = form.weather_condition.map(|c| c.as_str()).unwrap_or("—");

    println!("Location:         {}, {}", form.latitude, form.longitude);
    println!("Temperature (°F): {}", form.temperature_f);
    println!("Humidity (%):     {}", form.humidity_pct);
    println!("Visibility (mi):  {}", form.visibility_mi);
    println!("Wind Speed (mph): {}", form.wind_speed_mph);
    println!("Pressure (in):    {}", form.pressure_in);
    println!("Condition:        {condition}");
}

fn print_report(report: &SeverityReport) {
    let (r, g, b) = report.rgb();
    // 24-bit background, dark foreground.
    println!("\x1b[48;2;{r};{g};{b}m\x1b[38;2;30;41;59m Severity: {} \x1b[0m", report.severity);
    println!("{}", report.explanation);
}
