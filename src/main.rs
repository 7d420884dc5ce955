//! VitalWatch CLI
//!
//! Command-line client for the VitalWatch backend:
//! - Register, log in and out
//! - View and edit the profile
//! - Link or unlink the monitoring device
//! - Show the latest vitals and history
//! - Watch the live dashboard
//! - Chat with the health assistant

use anyhow::{bail, Context};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use vitalwatch::api::{ApiClient, ApiError, ApiResult, DeviceApi, Preferences, RegisterRequest, UserProfile};
use vitalwatch::chart::{HistoryChart, TimeRange};
use vitalwatch::chat::{attachment_from_file, ChatSession, ChatSignal, Speaker, DISCLAIMER};
use vitalwatch::config::{generate_default_config, Config};
use vitalwatch::dashboard::{Dashboard, DashboardDriver, DashboardView, DriverExit, TerminalView};
use vitalwatch::device::{DeviceLink, LINKED_MESSAGE, LINK_FAILED_MESSAGE, UNLINKED_MESSAGE};
use vitalwatch::profile::{format_phone_number, Bmi, ProfileForm, BMI_PROMPT, PREFERENCES_UPDATED_MESSAGE, PROFILE_UPDATED_MESSAGE};
use vitalwatch::session::{FileStore, Session, SessionStore};
use vitalwatch::vitals::{VitalsPanel, PLACEHOLDER};
use vitalwatch::{logging, PushChannel};

const SESSION_EXPIRED: &str = "Session expired. Please log in again with `vitalwatch login`.";
const UNLINK_PROMPT: &str = "Are you sure you want to unlink your device? This will stop real-time monitoring.";

#[derive(Parser)]
#[command(name = "vitalwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time vital-signs monitoring client")]
#[command(long_about = "VitalWatch connects to your health monitoring backend.\nLink an ESP32 device, watch your vitals live and talk to the health assistant.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API server URL, including the /api prefix
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<String>,
        #[arg(long)]
        gender: Option<String>,
    },

    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// View or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Manage the linked monitoring device
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },

    /// Show the latest vital signs
    Vitals,

    /// Show recorded history
    History {
        /// Time range (1h, 6h, 24h, 7d)
        #[arg(short, long, default_value = "24h")]
        range: TimeRange,
    },

    /// Watch the live dashboard until Ctrl-C
    Watch,

    /// Chat with the health assistant
    Chat,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the profile
    Show,

    /// Update profile fields; omitted fields keep their value
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        date_of_birth: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        /// Height in centimetres
        #[arg(long)]
        height: Option<f64>,
        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        blood_type: Option<String>,
        #[arg(long)]
        allergies: Option<String>,
        #[arg(long)]
        medications: Option<String>,
        #[arg(long)]
        medical_conditions: Option<String>,
        #[arg(long)]
        emergency_name: Option<String>,
        #[arg(long)]
        emergency_relationship: Option<String>,
        #[arg(long)]
        emergency_phone: Option<String>,
    },

    /// Update privacy preferences
    Preferences {
        #[arg(long)]
        marketing_emails: Option<bool>,
        #[arg(long)]
        sms_notifications: Option<bool>,
        #[arg(long)]
        data_sharing: Option<bool>,
    },
}

#[derive(Subcommand)]
pub enum DeviceAction {
    /// Show the linked device
    Status,

    /// Link a device by its ID
    Link { device_id: String },

    /// Unlink the current device
    Unlink {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    logging::init(&config.logging);

    let json = cli.format.eq_ignore_ascii_case("json");
    let store = FileStore::open(config.session.data_path())
        .with_context(|| format!("Cannot open session store in {:?}", config.session.data_path()))?;
    let mut sessions = SessionStore::new(store);

    match cli.command {
        Commands::Register {
            email,
            name,
            password,
            phone,
            date_of_birth,
            gender,
        } => {
            let password = password_or_prompt(password, |label| rpassword::prompt_password(label))?;
            let request = RegisterRequest {
                email: email.trim().to_lowercase(),
                password,
                name: name.trim().to_string(),
                phone: phone.map(|p| format_phone_number(&p)),
                date_of_birth,
                gender,
            };

            let client = ApiClient::new(config.api.client_config())?;
            let auth = client.register(&request).await.map_err(|e| anyhow::anyhow!(e.user_message("Registration failed")))?;
            sessions.save(&Session::new(auth.token, Some(auth.user.clone())))?;
            println!("{}", auth.message.as_deref().unwrap_or("Registration successful"));
            println!("Logged in as {}", auth.user.display_name());
        }

        Commands::Login { email, password } => {
            let password = password_or_prompt(password, |label| rpassword::prompt_password(label))?;

            let client = ApiClient::new(config.api.client_config())?;
            let auth = match client.login(&email, &password).await {
                Ok(auth) => auth,
                Err(ApiError::Unauthorized) => bail!("Invalid email or password"),
                Err(e) => bail!(e.user_message("Login failed")),
            };
            sessions.save(&Session::new(auth.token, Some(auth.user.clone())))?;
            println!("Logged in as {}", auth.user.display_name());
        }

        Commands::Logout => {
            sessions.clear()?;
            println!("Logged out.");
        }

        Commands::Profile { action } => {
            let client = authed_client(&config, &sessions)?;
            match action {
                ProfileAction::Show => {
                    let profile = checked(&mut sessions, client.profile().await)?;
                    sessions.save_user(&profile)?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&profile)?);
                    } else {
                        print_profile(&profile);
                    }
                }

                ProfileAction::Update {
                    name,
                    phone,
                    date_of_birth,
                    gender,
                    height,
                    weight,
                    blood_type,
                    allergies,
                    medications,
                    medical_conditions,
                    emergency_name,
                    emergency_relationship,
                    emergency_phone,
                } => {
                    let current = checked(&mut sessions, client.profile().await)?;
                    let mut form = ProfileForm::from_profile(&current);
                    if let Some(v) = name {
                        form.name = v;
                    }
                    if let Some(v) = phone {
                        form.phone = format_phone_number(&v);
                    }
                    if let Some(v) = date_of_birth {
                        form.date_of_birth = v;
                    }
                    if let Some(v) = gender {
                        form.gender = v;
                    }

                    let meta = &mut form.metadata;
                    if height.is_some() {
                        meta.height = height;
                    }
                    if weight.is_some() {
                        meta.weight = weight;
                    }
                    if blood_type.is_some() {
                        meta.blood_type = blood_type;
                    }
                    if allergies.is_some() {
                        meta.allergies = allergies;
                    }
                    if medications.is_some() {
                        meta.medications = medications;
                    }
                    if medical_conditions.is_some() {
                        meta.medical_conditions = medical_conditions;
                    }
                    if emergency_name.is_some() || emergency_relationship.is_some() || emergency_phone.is_some() {
                        let contact = meta.emergency_contact.get_or_insert_with(Default::default);
                        if emergency_name.is_some() {
                            contact.name = emergency_name;
                        }
                        if emergency_relationship.is_some() {
                            contact.relationship = emergency_relationship;
                        }
                        if let Some(p) = emergency_phone {
                            contact.phone = Some(format_phone_number(&p));
                        }
                    }

                    let updated = checked(&mut sessions, client.update_profile(&form.into_update()).await)?;
                    sessions.save_user(&updated)?;
                    println!("{}", PROFILE_UPDATED_MESSAGE);
                    print_bmi(&updated);
                }

                ProfileAction::Preferences {
                    marketing_emails,
                    sms_notifications,
                    data_sharing,
                } => {
                    let current = checked(&mut sessions, client.profile().await)?;
                    let mut preferences = current
                        .metadata
                        .and_then(|m| m.preferences)
                        .unwrap_or_default();
                    if let Some(v) = marketing_emails {
                        preferences.marketing_emails = v;
                    }
                    if let Some(v) = sms_notifications {
                        preferences.sms_notifications = v;
                    }
                    if let Some(v) = data_sharing {
                        preferences.data_sharing = v;
                    }

                    checked(&mut sessions, client.update_preferences(preferences).await)?;
                    println!("{}", PREFERENCES_UPDATED_MESSAGE);
                    print_preferences(&preferences);
                }
            }
        }

        Commands::Device { action } => {
            let client = authed_client(&config, &sessions)?;
            match action {
                DeviceAction::Status => match checked(&mut sessions, client.device_info().await)? {
                    Some(device) if json => println!("{}", serde_json::to_string_pretty(&device)?),
                    Some(device) => {
                        println!("Device ID:   {}", device.device_id);
                        println!("Type:        {}", device.device_type.as_deref().unwrap_or("ESP32 Device"));
                        println!("Linked at:   {}", device.linked_at.as_deref().unwrap_or(PLACEHOLDER));
                    }
                    None => {
                        println!("No device linked.");
                        println!();
                        println!("Link your ESP32 with:");
                        println!("  vitalwatch device link <DEVICE_ID>");
                    }
                },

                DeviceAction::Link { device_id } => {
                    let mut link = DeviceLink::new();
                    let device_id = link.begin_link(&device_id)?;
                    match client.link_device(&device_id).await {
                        Ok(_) => println!("{}", LINKED_MESSAGE),
                        Err(e) => return Err(api_failure(&mut sessions, e, LINK_FAILED_MESSAGE)),
                    }
                }

                DeviceAction::Unlink { yes } => {
                    if !yes && !confirm(UNLINK_PROMPT)? {
                        println!("Cancelled.");
                        return Ok(());
                    }
                    checked(&mut sessions, client.unlink_device().await)?;
                    println!("{}", UNLINKED_MESSAGE);
                }
            }
        }

        Commands::Vitals => {
            let client = authed_client(&config, &sessions)?;
            if checked(&mut sessions, client.device_info().await)?.is_none() {
                println!("No device linked.");
                return Ok(());
            }

            let reading = checked(&mut sessions, client.latest_data().await)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reading)?);
                return Ok(());
            }

            let mut view = TerminalView::stdout();
            match reading {
                Some(reading) if !reading.is_empty() => {
                    view.render_vitals(&VitalsPanel::from_reading(&reading));
                    view.render_last_updated(reading.timestamp.or(Some(Utc::now())));
                }
                _ => {
                    view.render_vitals(&VitalsPanel::waiting());
                    view.render_last_updated(None);
                }
            }
        }

        Commands::History { range } => {
            let client = authed_client(&config, &sessions)?;
            let Some(series) = checked(&mut sessions, client.device_data(range.hours()).await)? else {
                println!("No device linked.");
                return Ok(());
            };

            let history = HistoryChart::from_series(range, &series);
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No data in the last {}.", range);
            } else {
                print_history(&history);
            }
        }

        Commands::Watch => {
            let session = require_session(&sessions)?;
            let client = ApiClient::new(config.api.client_config())?.with_token(session.token.clone());

            let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
            let push = if config.push.enabled {
                let channel_config = config.push.channel_config(config.api.request_timeout_secs);
                Some(PushChannel::spawn(channel_config, session.token, inbound_tx)?)
            } else {
                drop(inbound_tx);
                None
            };
            // Terminal input is not wired up; the sender keeps the action stream open.
            let (_actions_tx, actions_rx) = mpsc::unbounded_channel();

            let dashboard = Dashboard::new(TerminalView::stdout(), config.dashboard.settings());
            let mut driver = DashboardDriver::new(dashboard, client, config.dashboard.poll_interval());
            println!("Watching vitals. Press Ctrl-C to stop.");

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            let exit = driver.run(inbound_rx, actions_rx, shutdown).await;

            if let Some(push) = push {
                push.close().await;
            }
            if exit == DriverExit::SessionEnded {
                sessions.clear()?;
                bail!(SESSION_EXPIRED);
            }
        }

        Commands::Chat => {
            let session = require_session(&sessions)?;
            run_chat(&config, session, &mut sessions).await?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            if let Some(path) = output {
                std::fs::write(&path, &content)?;
                println!("Config written to {:?}", path);
            } else {
                println!("{}", content);
            }
        }
    }

    Ok(())
}

async fn run_chat(config: &Config, session: Session, sessions: &mut SessionStore<FileStore>) -> anyhow::Result<()> {
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let channel_config = config.push.channel_config(config.api.request_timeout_secs);
    let push = PushChannel::spawn(channel_config, session.token, inbound_tx)?;

    let mut chat = ChatSession::new(Utc::now());
    print_new_messages(&chat, 0);
    println!("({})", DISCLAIMER);
    println!("Commands: /attach <image>, /detach, /clear, /quit");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut expired = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                let seen = chat.transcript().len();

                match input {
                    "/quit" | "/exit" => break,
                    "/clear" => {
                        push.emit(chat.clear(Utc::now()))?;
                        print_new_messages(&chat, 0);
                    }
                    "/detach" => chat.detach(),
                    _ if input.starts_with("/attach ") => {
                        let path = Path::new(input["/attach ".len()..].trim());
                        match attachment_from_file(path).and_then(|a| chat.attach(a)) {
                            Ok(()) => println!("Attached {:?}", path),
                            Err(e) => eprintln!("{}", e),
                        }
                    }
                    _ => match chat.send(input, Utc::now()) {
                        Ok(event) => {
                            push.emit(event)?;
                            print_new_messages(&chat, seen);
                            println!("Assistant is typing...");
                        }
                        Err(e) => eprintln!("{}", e),
                    },
                }
            }

            message = inbound_rx.recv() => {
                let Some(message) = message else { break };
                let seen = chat.transcript().len();
                if chat.dispatch(message, Utc::now()) == ChatSignal::EndSession {
                    expired = true;
                    break;
                }
                print_new_messages(&chat, seen);
            }
        }
    }

    push.close().await;
    if expired {
        sessions.clear()?;
        bail!(SESSION_EXPIRED);
    }
    Ok(())
}

fn print_new_messages(chat: &ChatSession, from: usize) {
    for message in chat.transcript().iter().skip(from) {
        let who = match message.speaker {
            Speaker::User => "You",
            Speaker::Bot => "Assistant",
        };
        let time = message.at.with_timezone(&Local).format("%H:%M");
        match &message.attachment {
            Some(name) => println!("[{}] {}: {} [image: {}]", time, who, message.text, name),
            None => println!("[{}] {}: {}", time, who, message.text),
        }
    }
}

fn require_session(sessions: &SessionStore<FileStore>) -> anyhow::Result<Session> {
    sessions
        .require()
        .map_err(|_| anyhow::anyhow!("Not logged in. Run `vitalwatch login` first."))
}

fn authed_client(config: &Config, sessions: &SessionStore<FileStore>) -> anyhow::Result<ApiClient> {
    let session = require_session(sessions)?;
    Ok(ApiClient::new(config.api.client_config())?.with_token(session.token))
}

/// Unwrap an API result; an expired token also clears the stored session
fn checked<T>(sessions: &mut SessionStore<FileStore>, result: ApiResult<T>) -> anyhow::Result<T> {
    result.map_err(|e| api_failure(sessions, e, "Request failed"))
}

fn api_failure(sessions: &mut SessionStore<FileStore>, error: ApiError, fallback: &str) -> anyhow::Error {
    if error.is_unauthorized() {
        if let Err(e) = sessions.clear() {
            tracing::warn!("Failed to clear session: {}", e);
        }
        return anyhow::anyhow!(SESSION_EXPIRED);
    }
    anyhow::anyhow!(error.user_message(fallback))
}

/// Use the password given on the command line, otherwise read it without echo
fn password_or_prompt<F>(given: Option<String>, read: F) -> anyhow::Result<String>
where
    F: FnOnce(&str) -> std::io::Result<String>,
{
    match given {
        Some(password) => Ok(password),
        None => read("Password: ").context("Failed to read password"),
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_profile(profile: &UserProfile) {
    println!("Name:          {}", profile.display_name());
    println!("Email:         {}", profile.email.as_deref().unwrap_or(PLACEHOLDER));
    println!("Phone:         {}", profile.phone.as_deref().unwrap_or(PLACEHOLDER));
    println!("Date of birth: {}", profile.date_of_birth.as_deref().unwrap_or(PLACEHOLDER));
    println!("Gender:        {}", profile.gender.as_deref().unwrap_or(PLACEHOLDER));

    let Some(meta) = &profile.metadata else {
        print_bmi(profile);
        return;
    };
    println!();
    println!("Health:");
    let number = |v: Option<f64>, unit: &str| v.map(|v| format!("{} {}", v, unit)).unwrap_or_else(|| PLACEHOLDER.to_string());
    println!("  Height:      {}", number(meta.height, "cm"));
    println!("  Weight:      {}", number(meta.weight, "kg"));
    println!("  Blood type:  {}", meta.blood_type.as_deref().unwrap_or(PLACEHOLDER));
    println!("  Allergies:   {}", meta.allergies.as_deref().unwrap_or(PLACEHOLDER));
    println!("  Medications: {}", meta.medications.as_deref().unwrap_or(PLACEHOLDER));
    println!("  Conditions:  {}", meta.medical_conditions.as_deref().unwrap_or(PLACEHOLDER));
    print_bmi(profile);

    if let Some(contact) = &meta.emergency_contact {
        println!();
        println!("Emergency contact:");
        println!("  Name:         {}", contact.name.as_deref().unwrap_or(PLACEHOLDER));
        println!("  Relationship: {}", contact.relationship.as_deref().unwrap_or(PLACEHOLDER));
        println!("  Phone:        {}", contact.phone.as_deref().unwrap_or(PLACEHOLDER));
    }
    if let Some(preferences) = &meta.preferences {
        println!();
        print_preferences(preferences);
    }
}

fn print_bmi(profile: &UserProfile) {
    match Bmi::for_profile(profile) {
        Some(bmi) => println!("  BMI:         {:.1} ({})", bmi.value, bmi.category.label()),
        None => println!("  BMI:         {}", BMI_PROMPT),
    }
}

fn print_preferences(preferences: &Preferences) {
    let flag = |on: bool| if on { "on" } else { "off" };
    println!("Preferences:");
    println!("  Marketing emails:  {}", flag(preferences.marketing_emails));
    println!("  SMS notifications: {}", flag(preferences.sms_notifications));
    println!("  Data sharing:      {}", flag(preferences.data_sharing));
}

fn print_history(history: &HistoryChart) {
    let cell = |v: Option<f64>, precision: usize| {
        v.map(|v| format!("{:.*}", precision, v))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };

    println!("{:<18} {:>10} {:>8} {:>10}", "Time", "HR (BPM)", "SpO2 %", "Temp (°F)");
    println!("{}", "-".repeat(50));
    for point in &history.points {
        let time = point
            .at
            .map(|t: DateTime<Utc>| t.with_timezone(&Local).format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        println!(
            "{:<18} {:>10} {:>8} {:>10}",
            time,
            cell(point.heart_rate, 0),
            cell(point.spo2, 0),
            cell(point.temperature, 1)
        );
    }
    println!();
    println!("{} samples over {}", history.len(), history.range);
}
