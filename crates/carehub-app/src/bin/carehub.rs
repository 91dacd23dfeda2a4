use anyhow::{bail, Context, Result};
use carehub_app::{init_tracing, AppContext, LogFormat, SubmitOutcome};
use carehub_backend::{CancellationToken, Section};
use carehub_core::assessment::AssessmentDraft;
use carehub_core::bmi::{compute_bmi, BmiCategory};
use carehub_core::cart::expand_package;
use carehub_core::config::AppConfig;
use carehub_core::pricing::{compose, BookingOptions, BookingType};
use carehub_core::risk::{AssessmentResult, PackageTier, RiskBand};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Command::new("carehub")
        .version(carehub_app::VERSION)
        .about("CareHub healthcare client")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (defaults to ./carehub.toml when present)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("bmi")
                .about("Compute BMI from weight and height")
                .arg(
                    Arg::new("weight")
                        .long("weight")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Weight in kilograms"),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Height in centimeters"),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify 0-100 risk scores")
                .arg(
                    Arg::new("scores")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(f64))
                        .help("Scores to classify"),
                ),
        )
        .subcommand(
            Command::new("quote")
                .about("Price a booking")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .required(true)
                        .value_parser(|s: &str| s.parse::<BookingType>())
                        .help("Booking type, e.g. doctor_consultation or lab_test"),
                )
                .arg(
                    Arg::new("base")
                        .long("base")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Base price in rupees"),
                )
                .arg(
                    Arg::new("home-visit")
                        .long("home-visit")
                        .action(ArgAction::SetTrue)
                        .help("Add the home visit fee"),
                )
                .arg(
                    Arg::new("home-collection")
                        .long("home-collection")
                        .action(ArgAction::SetTrue)
                        .help("Add the home sample collection fee"),
                )
                .arg(
                    Arg::new("add-on-staff")
                        .long("add-on-staff")
                        .action(ArgAction::SetTrue)
                        .help("Add the extra attendant fee"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Search medicines, doctors and lab tests")
                .arg(Arg::new("query").required(true).help("Search text")),
        )
        .subcommand(
            Command::new("expand-package")
                .about("Show the cart lines a recommended package expands to")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Assessment result JSON (defaults to the stored result)"),
                )
                .arg(
                    Arg::new("tier")
                        .long("tier")
                        .default_value("Basic")
                        .help("Package tier label, e.g. Basic, Advanced, Comprehensive or the label the engine returned"),
                ),
        )
        .subcommand(
            Command::new("assess")
                .about("Submit the questionnaire to the risk engine")
                .arg(
                    Arg::new("draft")
                        .long("draft")
                        .value_parser(value_parser!(PathBuf))
                        .help("Draft JSON (defaults to the stored draft)"),
                ),
        );

    let matches = cli.get_matches();
    let format = if matches.get_flag("json-logs") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format);

    let config_path = matches.get_one::<PathBuf>("config").cloned();
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;

    match matches.subcommand() {
        Some(("bmi", sub)) => run_bmi(sub),
        Some(("classify", sub)) => {
            for score in sub.get_many::<f64>("scores").into_iter().flatten() {
                println!("{score:>6.1}  {}", RiskBand::from_score(*score).label());
            }
            Ok(())
        }
        Some(("quote", sub)) => run_quote(sub, &config),
        Some(("search", sub)) => run_search(sub, config).await,
        Some(("expand-package", sub)) => run_expand(sub, config).await,
        Some(("assess", sub)) => run_assess(sub, config).await,
        _ => Ok(()),
    }
}

fn run_bmi(sub: &ArgMatches) -> Result<()> {
    let weight = sub.get_one::<f64>("weight").copied().unwrap_or_default();
    let height = sub.get_one::<f64>("height").copied().unwrap_or_default();
    let Some(bmi) = compute_bmi(weight, height) else {
        bail!("weight and height must both be positive");
    };
    println!("BMI {bmi:.1} ({})", BmiCategory::from_bmi(bmi).label());
    Ok(())
}

fn run_quote(sub: &ArgMatches, config: &AppConfig) -> Result<()> {
    let booking_type = sub
        .get_one::<BookingType>("type")
        .copied()
        .context("missing --type")?;
    let base = sub.get_one::<f64>("base").copied().unwrap_or_default();
    let options = BookingOptions {
        home_visit: sub.get_flag("home-visit"),
        home_collection: sub.get_flag("home-collection"),
        add_on_staff: sub.get_flag("add-on-staff"),
    };

    let quote = compose(booking_type, base, options, &config.fees);
    println!("{:<24}₹{:.2}", "Base", quote.base);
    for fee in &quote.fees {
        println!("{:<24}₹{:.2}", fee.label, fee.amount);
    }
    println!("{:<24}₹{:.2}", "Taxes", quote.tax);
    println!("{:<24}₹{:.2}", "Total", quote.total);
    Ok(())
}

async fn run_search(sub: &ArgMatches, config: AppConfig) -> Result<()> {
    let query = sub.get_one::<String>("query").cloned().unwrap_or_default();
    let min_chars = config.search.min_chars;
    let ctx = connect(config).await?;

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let Some(results) = ctx.search().everywhere(&query, &token).await else {
        println!("Type at least {min_chars} characters to search.");
        return Ok(());
    };
    if results.is_cancelled() {
        bail!("search cancelled");
    }

    print_section("Medicines", &results.medicines, |m| format!("{}  ₹{:.2}", m.name, m.price));
    print_section("Doctors", &results.doctors, |d| {
        format!("{}  {}  ₹{:.2}", d.name, d.specialization, d.consultation_fee)
    });
    print_section("Lab tests", &results.lab_tests, |t| format!("{}  ₹{:.2}", t.name, t.price));
    Ok(())
}

fn print_section<T>(title: &str, section: &Section<T>, line: impl Fn(&T) -> String) {
    println!("{title}");
    match section {
        Ok(rows) if rows.is_empty() => println!("  no matches"),
        Ok(rows) => rows.iter().for_each(|row| println!("  {}", line(row))),
        Err(error) => println!("  unavailable: {error}"),
    }
}

async fn run_expand(sub: &ArgMatches, config: AppConfig) -> Result<()> {
    let tier = PackageTier::from_label(sub.get_one::<String>("tier").map_or("Basic", String::as_str));
    let result: AssessmentResult = match sub.get_one::<PathBuf>("file") {
        Some(path) => read_json(path)?,
        None => {
            let ctx = AppContext::from_config(config).await?;
            ctx.assessment()
                .last_result()
                .await?
                .context("no stored assessment result; run `carehub assess` first")?
        }
    };

    let package = result
        .package(&tier)
        .with_context(|| format!("no {tier} package in this result"))?;
    println!(
        "{}: ₹{:.2} - ₹{:.2} = ₹{:.2}",
        package.name, package.price, package.discount, package.final_price
    );
    for line in expand_package(package) {
        println!("  {:<32} ₹{:>8.2}  (list ₹{:.2})", line.name, line.price, line.mrp);
    }
    Ok(())
}

async fn run_assess(sub: &ArgMatches, config: AppConfig) -> Result<()> {
    let ctx = connect(config).await?;
    let flow = ctx.assessment();
    if let Some(path) = sub.get_one::<PathBuf>("draft") {
        let draft: AssessmentDraft = read_json(path)?;
        ctx.questionnaire().replace(draft).await?;
    }
    if flow.draft().is_blank() {
        bail!("the questionnaire is empty; pass --draft FILE");
    }

    match flow.submit(&CancellationToken::new()).await? {
        SubmitOutcome::Scored { result, .. } => {
            println!("Overall risk: {}", result.risk_level.as_str());
            for (system, score, band) in result.bands() {
                println!("  {:<18} {score:>5.1}  {}", system.label(), band.label());
            }
            if let Some(mismatch) = result.classification_mismatch() {
                println!(
                    "  note: overall {} but {} is {}",
                    mismatch.overall.as_str(),
                    mismatch.worst_system.label(),
                    mismatch.worst_band.label()
                );
            }
            for package in &result.packages {
                println!("  {}: {} ₹{:.2}", package.tier, package.name, package.final_price);
            }
            Ok(())
        }
        SubmitOutcome::Failed { message, step } => bail!("{message} (stopped at {step:?})"),
    }
}

async fn connect(config: AppConfig) -> Result<AppContext> {
    if !config.has_backend() {
        bail!("no backend configured; set backend.url or CAREHUB_BACKEND_URL");
    }
    Ok(AppContext::from_config(config).await?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
