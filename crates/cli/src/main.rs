use agapay_core::companion::{CitizenCompanion, SentinelSymptom};
use agapay_core::config::{barangay_from_env_value, data_dir_from_env_value};
use agapay_core::dashboard::{AdminDashboard, ChartView, DashboardData};
use agapay_core::history::PatientHistory;
use agapay_core::intake::IntakeFlow;
use agapay_core::store::FileStore;
use agapay_core::CoreConfig;
use agapay_gateway::{
    temperature_from_env_value, timeout_from_env_value, AgapayAssistant, GatewayConfig,
    OpenAiGateway, StubGateway, StubReply, DEFAULT_API_URL, DEFAULT_MODEL,
};
use agapay_types::{Demographics, Gender, Vitals};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agapay")]
#[command(about = "Agapay triage assistant CLI")]
struct Cli {
    /// Skip the model provider; every model call returns its fallback
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one intake: assess a patient and optionally store a referral
    Assess {
        /// Patient name
        name: String,
        /// Comma-separated symptoms
        #[arg(long)]
        symptoms: String,
        #[arg(long, default_value_t = 0)]
        age: u32,
        /// M or F
        #[arg(long, default_value = "M")]
        gender: String,
        /// Temperature in Celsius
        #[arg(long)]
        temp: Option<f64>,
        #[arg(long)]
        bp_systolic: Option<f64>,
        #[arg(long)]
        bp_diastolic: Option<f64>,
        /// Heart rate in beats per minute
        #[arg(long)]
        pulse: Option<f64>,
        /// SpO2 percentage
        #[arg(long)]
        oxygen: Option<f64>,
        /// Store the record and print the referral code
        #[arg(long)]
        refer: bool,
    },
    /// Show stored records for a patient, newest first
    History {
        /// Patient name
        name: String,
    },
    /// Send companion chat messages in order and print the transcript
    Chat {
        /// Messages to send
        #[arg(required = true)]
        messages: Vec<String>,
    },
    /// Show today's medication schedule
    Meds {
        /// Mark a dose as taken before listing
        #[arg(long)]
        take: Option<String>,
    },
    /// Report a symptom (Fever, Cough, Stomach Pain, Difficulty Breathing)
    ReportSymptom {
        symptom: String,
    },
    /// Show the admin dashboard datasets
    Dashboard {
        /// Also generate the logistics report
        #[arg(long)]
        report: bool,
    },
}

fn build_assistant(offline: bool) -> Result<AgapayAssistant, Box<dyn std::error::Error>> {
    if offline {
        return Ok(AgapayAssistant::new(Arc::new(StubGateway::new(
            Vec::new(),
            StubReply::MissingCredential,
        ))));
    }

    let cfg = GatewayConfig::new(std::env::var("API_KEY").ok())
        .with_api_url(std::env::var("AGAPAY_LLM_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()))
        .with_model(std::env::var("AGAPAY_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()))
        .with_temperature(temperature_from_env_value(
            std::env::var("AGAPAY_LLM_TEMPERATURE").ok(),
        )?)
        .with_timeout(timeout_from_env_value(
            std::env::var("AGAPAY_LLM_TIMEOUT_SECS").ok(),
        )?);
    Ok(AgapayAssistant::new(Arc::new(OpenAiGateway::new(cfg)?)))
}

fn print_chart(chart: &ChartView) {
    println!("{}", chart.title);
    for (i, category) in chart.categories.iter().enumerate() {
        let values: Vec<String> = chart
            .series
            .iter()
            .map(|s| format!("{}={}", s.name, s.values.get(i).copied().unwrap_or(0)))
            .collect();
        println!("  {:<12} {}", category, values.join("  "));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agapay=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = CoreConfig::new(
        data_dir_from_env_value(std::env::var("AGAPAY_DATA_DIR").ok()),
        &barangay_from_env_value(std::env::var("AGAPAY_BARANGAY").ok()),
    )?;

    match cli.command {
        Some(Commands::Assess {
            name,
            symptoms,
            age,
            gender,
            temp,
            bp_systolic,
            bp_diastolic,
            pulse,
            oxygen,
            refer,
        }) => {
            let assistant = build_assistant(cli.offline)?;
            let history = PatientHistory::new(Arc::new(FileStore::open(cfg.store_dir())?));
            let mut flow = IntakeFlow::new(history, cfg.barangay());

            let defaults = Vitals::default();
            flow.set_demographics(Demographics {
                name,
                age,
                gender: gender.parse::<Gender>()?,
                barangay: cfg.barangay().to_string(),
            })?;
            flow.set_vitals(Vitals {
                temp: temp.unwrap_or(defaults.temp),
                bp_systolic: bp_systolic.unwrap_or(defaults.bp_systolic),
                bp_diastolic: bp_diastolic.unwrap_or(defaults.bp_diastolic),
                pulse: pulse.unwrap_or(defaults.pulse),
                oxygen: oxygen.unwrap_or(defaults.oxygen),
            })?;
            flow.set_symptoms(symptoms)?;

            if !flow.history().is_empty() {
                println!("{} prior record(s) for this name", flow.history().len());
            }

            let assessment = flow.generate_assessment(&assistant).await?;
            println!(
                "{} ({}) - {}",
                assessment.risk_level,
                assessment.risk_level.care_setting(),
                assessment.provisional_classification
            );
            println!("{}", serde_json::to_string_pretty(assessment)?);

            if refer {
                let referral = flow.create_referral()?;
                println!("Referral code: {}", referral.encode()?);
            }
        }
        Some(Commands::History { name }) => {
            let history = PatientHistory::new(Arc::new(FileStore::open(cfg.store_dir())?));
            let records = history.load(&name);
            if records.is_empty() {
                println!("No records found.");
            } else {
                for record in records {
                    let risk = record
                        .assessment
                        .as_ref()
                        .map(|a| a.risk_level.to_string())
                        .unwrap_or_else(|| "-".into());
                    println!(
                        "ID: {}, Date: {}, Risk: {}, Symptoms: {}, Vitals: {}",
                        record.id,
                        record.timestamp.format("%Y-%m-%d %H:%M"),
                        risk,
                        record.symptoms.join(", "),
                        record.vitals
                    );
                }
            }
        }
        Some(Commands::Chat { messages }) => {
            let assistant = build_assistant(cli.offline)?;
            let mut companion = CitizenCompanion::seeded(cfg.barangay())?;
            for message in &messages {
                companion.chat.send(&assistant, message).await?;
            }
            for turn in companion.chat.transcript() {
                let who = match turn.role {
                    agapay_gateway::TurnRole::User => "Ikaw",
                    agapay_gateway::TurnRole::Model => "Agapay",
                };
                println!("{}: {}", who, turn.text);
            }
        }
        Some(Commands::Meds { take }) => {
            let mut companion = CitizenCompanion::seeded(cfg.barangay())?;
            if let Some(id) = take {
                let med = companion.medications.take(&id)?;
                println!("Took {} {}", med.name, med.dosage);
            }
            println!("Schedule for {}", companion.citizen());
            for med in companion.medications.medications() {
                println!(
                    "[{}] {} {} ({}) - {}/{} left{}",
                    if med.taken_today { "x" } else { " " },
                    med.name,
                    med.dosage,
                    med.frequency,
                    med.remaining,
                    med.total,
                    if med.needs_refill() { ", refill soon" } else { "" }
                );
            }
        }
        Some(Commands::ReportSymptom { symptom }) => {
            let symptom: SentinelSymptom = symptom.parse()?;
            let mut companion = CitizenCompanion::seeded(cfg.barangay())?;
            println!("{}", companion.reports.report(symptom));
        }
        Some(Commands::Dashboard { report }) => {
            let mut dashboard = AdminDashboard::new(DashboardData::mock()?);
            print_chart(&dashboard.resource_chart());
            print_chart(&dashboard.trend_chart());
            println!("Telehealth queue");
            for case in dashboard.triage_queue() {
                println!(
                    "  #{} {} ({}) {} - {}, waiting {}",
                    case.id, case.name, case.age, case.risk, case.condition, case.wait_time
                );
            }
            if report {
                let assistant = build_assistant(cli.offline)?;
                println!();
                println!("{}", dashboard.generate_report(&assistant).await?);
            }
        }
        None => {
            println!("Use 'agapay --help' for commands");
        }
    }

    Ok(())
}
