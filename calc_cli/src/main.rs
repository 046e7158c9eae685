//! # Calcverse CLI Application
//!
//! Runs the calculators from the terminal. Inputs are JSON (inline or a
//! file path); results print as a text report or as JSON.
//!
//! ```text
//! calc_cli spay --input '{"species":"dog","gender":"female","weight_tier":"10-25"}'
//! calc_cli amend --amendment compost --area 250
//! calc_cli bmi --weight 200 --height 70 --imperial
//! calc_cli compare spay-neuter region --input pet.json --values Northeast,Midwest
//! ```
//!
//! Set `RUST_LOG=calc_core=debug` to see engine stages on stderr.

use std::fs;
use std::process;

use calc_core::calculations::bmi::{self, BmiInput, BmiResult};
use calc_core::calculations::crop_rotation::{self, AmendmentAmount, CropRotationInput, RotationPlan};
use calc_core::calculations::spay_neuter::{self, SpayNeuterInput};
use calc_core::calculations::{CalculatorRequest, CalculatorResponse};
use calc_core::engine::{AdviceKind, ComparisonTable, Estimate};
use calc_core::input::{parse_number, sanitize_text};
use calc_core::rules::{self, RuleTables};
use calc_core::units::SquareFeet;
use calc_core::{CalcError, CalcResult};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Calculators that support comparison tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Comparable {
    SpayNeuter,
    CropRotation,
}

/// Calcverse calculators.
#[derive(Parser)]
#[command(name = "calc_cli", version, about = "Calcverse cost estimators and calculators")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a pet spay/neuter procedure
    Spay {
        /// Input JSON, inline or a path to a file
        #[arg(long)]
        input: String,
    },

    /// Price a garden season
    Crop {
        /// Input JSON, inline or a path to a file
        #[arg(long)]
        input: String,
    },

    /// Plan bed rotation over several years
    Rotation {
        /// Input JSON, inline or a path to a file
        #[arg(long)]
        input: String,
    },

    /// How much of a soil amendment an area needs
    Amend {
        /// Amendment key (compost, lime, gypsum, ...)
        #[arg(long)]
        amendment: String,
        /// Area in square feet
        #[arg(long)]
        area: String,
    },

    /// Body mass index
    Bmi {
        /// Weight in kg (lb with --imperial)
        #[arg(long)]
        weight: String,
        /// Height in cm (in with --imperial)
        #[arg(long)]
        height: String,
        #[arg(long)]
        imperial: bool,
    },

    /// Compare totals across one input dimension
    Compare {
        #[arg(value_enum)]
        calculator: Comparable,
        /// Input field to vary, e.g. clinic_tier or soil_type
        dimension: String,
        /// Input JSON, inline or a path to a file
        #[arg(long)]
        input: String,
        /// Comma-separated values to compare (default: every row)
        #[arg(long, value_delimiter = ',')]
        values: Option<Vec<String>>,
    },

    /// Run any calculator from a tagged request ({"calculator": ...})
    Run {
        /// Input JSON, inline or a path to a file
        #[arg(long)]
        input: String,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        if let Ok(json) = serde_json::to_string_pretty(&e) {
            eprintln!();
            eprintln!("Error JSON:");
            eprintln!("{}", json);
        }
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn run(cli: &Cli) -> CalcResult<()> {
    let tables = rules::builtin()?;

    match &cli.command {
        Commands::Spay { input } => {
            let input = spay_input(input)?;
            let estimate = spay_neuter::estimate(&input, &tables.spay_neuter)?;
            let title = if input.pet_name.is_empty() {
                "SPAY/NEUTER ESTIMATE".to_string()
            } else {
                format!("SPAY/NEUTER ESTIMATE - {}", input.pet_name)
            };
            emit(cli.output, &estimate, |e| print_estimate(&title, e))
        }
        Commands::Crop { input } => {
            let input: CropRotationInput = read_json(input)?;
            let estimate = crop_rotation::estimate(&input, &tables.crop_rotation)?;
            emit(cli.output, &estimate, |e| print_estimate("GARDEN SEASON BUDGET", e))
        }
        Commands::Rotation { input } => {
            let input: CropRotationInput = read_json(input)?;
            let plan = crop_rotation::plan_rotation(&input, &tables.crop_rotation)?;
            emit(cli.output, &plan, print_rotation)
        }
        Commands::Amend { amendment, area } => {
            let area = number("area", area)?;
            let amount = crop_rotation::soil_amendment(amendment, SquareFeet(area), &tables.crop_rotation)?;
            emit(cli.output, &amount, |a| print_amendment(a, area))
        }
        Commands::Bmi { weight, height, imperial } => {
            let weight = number("weight", weight)?;
            let height = number("height", height)?;
            let input = if *imperial {
                BmiInput::imperial(weight, height)
            } else {
                BmiInput::metric(weight, height)
            };
            let result = bmi::calculate(&input, &tables.bmi)?;
            emit(cli.output, &result, print_bmi)
        }
        Commands::Compare {
            calculator,
            dimension,
            input,
            values,
        } => {
            let table = compare(tables, *calculator, dimension, input, values.as_deref())?;
            emit(cli.output, &table, |t| {
                banner("COMPARISON");
                print_comparison(t);
                rule();
            })
        }
        Commands::Run { input } => {
            let mut request: CalculatorRequest = read_json(input)?;
            if let CalculatorRequest::SpayNeuter(pet) = &mut request {
                pet.pet_name = sanitize_text(&pet.pet_name);
            }
            tracing::debug!(calculator = request.calc_type(), "running tagged request");
            let response = request.run(tables)?;
            emit(cli.output, &response, |r| match r {
                CalculatorResponse::Estimate(e) => print_estimate(&e.calculator.to_uppercase(), e),
                CalculatorResponse::Bmi(b) => print_bmi(b),
            })
        }
    }
}

fn compare(
    tables: &RuleTables,
    calculator: Comparable,
    dimension: &str,
    input: &str,
    values: Option<&[String]>,
) -> CalcResult<ComparisonTable> {
    match (calculator, values) {
        (Comparable::SpayNeuter, Some(values)) => {
            spay_neuter::compare(dimension, values, &spay_input(input)?, &tables.spay_neuter)
        }
        (Comparable::SpayNeuter, None) => calc_core::engine::compare_all::<spay_neuter::SpayNeuter>(
            dimension,
            &spay_input(input)?,
            &tables.spay_neuter,
        ),
        (Comparable::CropRotation, Some(values)) => {
            let input: CropRotationInput = read_json(input)?;
            crop_rotation::compare(dimension, values, &input, &tables.crop_rotation)
        }
        (Comparable::CropRotation, None) => {
            let input: CropRotationInput = read_json(input)?;
            calc_core::engine::compare_all::<crop_rotation::CropRotation>(dimension, &input, &tables.crop_rotation)
        }
    }
}

fn spay_input(raw: &str) -> CalcResult<SpayNeuterInput> {
    let mut input: SpayNeuterInput = read_json(raw)?;
    input.pet_name = sanitize_text(&input.pet_name);
    Ok(input)
}

/// Parse JSON given inline (starting with `{`) or from a file path.
fn read_json<T: DeserializeOwned>(raw: &str) -> CalcResult<T> {
    let trimmed = raw.trim_start();
    let text = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        fs::read_to_string(raw).map_err(|e| CalcError::domain("input", raw, e.to_string()))?
    };
    Ok(serde_json::from_str(&text)?)
}

fn number(field: &str, raw: &str) -> CalcResult<f64> {
    parse_number(raw).ok_or_else(|| CalcError::domain(field, raw, "Not a valid number"))
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> CalcResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

// ============================================================================
// Text reports
// ============================================================================

fn rule() {
    println!("═══════════════════════════════════════");
}

fn banner(title: &str) {
    rule();
    println!("  {}", title);
    rule();
    println!();
}

fn print_estimate(title: &str, estimate: &Estimate) {
    banner(title);

    println!("Line items:");
    for item in &estimate.line_items {
        println!("  {:<36} {:>12}", item.label, item.display_amount().to_string());
        if !item.note.is_empty() {
            println!("    {}", item.note);
        }
    }
    println!();

    for table in &estimate.comparisons {
        print_comparison(table);
    }

    if !estimate.references.is_empty() {
        println!("For reference:");
        for figure in &estimate.references {
            println!("  {:<36} {:>12}", figure.label, figure.amount.rounded().to_string());
        }
        println!();
    }

    for (kind, heading) in [
        (AdviceKind::Warning, "Warnings:"),
        (AdviceKind::SavingTip, "Ways to save:"),
        (AdviceKind::NextStep, "Next steps:"),
    ] {
        let messages: Vec<&str> = estimate.advice_of(kind).collect();
        if !messages.is_empty() {
            println!("{}", heading);
            for message in messages {
                println!("  - {}", message);
            }
            println!();
        }
    }

    rule();
    println!("  TOTAL: {}", estimate.total);
    rule();
}

fn print_comparison(table: &ComparisonTable) {
    let cheapest = table.cheapest().map(|r| r.value.as_str());
    println!("Compare by {}:", table.dimension);
    for row in &table.rows {
        let marker = if row.selected { "*" } else { " " };
        let tag = if Some(row.value.as_str()) == cheapest { " (lowest)" } else { "" };
        println!("  {} {:<34} {:>12}{}", marker, row.name, row.total.to_string(), tag);
    }
    println!();
}

fn print_rotation(plan: &RotationPlan) {
    banner("BED ROTATION PLAN");
    println!("Cycle: {}", plan.groups.join(" -> "));
    println!();
    for year in &plan.years {
        println!("Year {}:", year.year);
        for bed in &year.beds {
            let crops = if bed.crops.is_empty() {
                "cover crop or rest".to_string()
            } else {
                bed.crops.join(", ")
            };
            println!("  Bed {:<3} {:<22} {}", bed.bed, bed.group, crops);
        }
        println!();
    }
    if plan.conflicts.is_empty() {
        println!("No rotation conflicts.");
    } else {
        println!("Conflicts:");
        for conflict in &plan.conflicts {
            println!("  [!] {}", conflict.message);
        }
    }
    rule();
}

fn print_amendment(amount: &AmendmentAmount, area: f64) {
    banner("SOIL AMENDMENT");
    println!("  {} for {} sq ft", amount.name, area);
    println!("  Apply:  {:.1} {}", amount.amount, amount.unit);
    println!("  Cost:   {}", amount.cost.rounded());
    println!("  Why:    {}", amount.purpose);
    println!();
    rule();
}

fn print_bmi(result: &BmiResult) {
    banner("BODY MASS INDEX");
    println!("  BMI:        {:.1}", result.bmi);
    println!("  Category:   {}", result.category_name);
    println!(
        "  Healthy:    {:.1}-{:.1} {}",
        result.healthy_range.min, result.healthy_range.max, result.healthy_range.unit
    );
    println!();
    for advice in &result.advice {
        let marker = if advice.kind == AdviceKind::Warning { "[!]" } else { " - " };
        println!("{} {}", marker, advice.message);
    }
    println!();
    rule();
}
