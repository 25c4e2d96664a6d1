//! Sheetfill CLI - Merge product exports into marketplace templates
//!
//! # Main Command
//!
//! ```bash
//! sheetfill run --source export.csv --template vorlage.xlsx
//! sheetfill run --profile otto.json --output neu.xlsx --report run.json
//! ```
//!
//! Paths default from `SHEETFILL_SOURCE`, `SHEETFILL_TEMPLATE` and
//! `SHEETFILL_PROFILE` (a `.env` file is read if present).
//!
//! # Debug Commands
//!
//! ```bash
//! sheetfill parse export.csv        # Just parse CSV to JSON
//! sheetfill rules                   # List category rules
//! sheetfill classify "LED Blinker"  # Show the rule a text matches
//! sheetfill example-profile         # Print the built-in profile
//! ```

use clap::{Args, Parser, Subcommand};
use sheetfill::logs::LOG_SINK;
use sheetfill::parser::parse_csv_file;
use sheetfill::transform::CategoryClassifier;
use sheetfill::{run, temu_profile, Profile, RunOptions};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetfill")]
#[command(about = "Merge a CSV product export into an xlsx marketplace template", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProfileArg {
    /// Profile JSON file (default: built-in profile)
    #[arg(short, long, env = "SHEETFILL_PROFILE")]
    profile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full merge: CSV → normalize → classify → filter → template
    Run {
        /// Product export (CSV)
        #[arg(short, long, env = "SHEETFILL_SOURCE")]
        source: PathBuf,

        /// Destination template (xlsx), updated in place
        #[arg(short, long, env = "SHEETFILL_TEMPLATE")]
        template: PathBuf,

        #[command(flatten)]
        profile: ProfileArg,

        /// Save to this path instead of over the template
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run every stage without saving
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Only print warnings and errors
        #[arg(short, long)]
        quiet: bool,

        /// Source encoding (utf-8, iso-8859-1, iso-8859-15, windows-1252, auto)
        #[arg(short, long)]
        encoding: Option<String>,

        /// CSV delimiter (default: from profile)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Fail instead of clearing the template when no records remain
        #[arg(long)]
        refuse_empty: bool,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Source encoding
        #[arg(short, long, default_value = "auto")]
        encoding: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the category rules of a profile
    Rules {
        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Show which category rule a text matches
    Classify {
        /// Product text
        text: String,

        #[command(flatten)]
        profile: ProfileArg,
    },

    /// Print the built-in profile as JSON
    ExampleProfile {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            source,
            template,
            profile,
            output,
            dry_run,
            report,
            quiet,
            encoding,
            delimiter,
            refuse_empty,
        } => {
            let options = RunOptions {
                source,
                template,
                output,
                dry_run,
                report,
                encoding,
                delimiter,
                refuse_empty,
            };
            cmd_run(profile.profile.as_deref(), &options, quiet)
        }

        Commands::Parse {
            input,
            delimiter,
            encoding,
            output,
        } => cmd_parse(&input, delimiter, &encoding, output.as_deref()),

        Commands::Rules { profile } => cmd_rules(profile.profile.as_deref()),

        Commands::Classify { text, profile } => cmd_classify(&text, profile.profile.as_deref()),

        Commands::ExampleProfile { output } => cmd_example_profile(output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_profile(path: Option<&Path>) -> Result<Profile, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            eprintln!("📋 Profile: {}", p.display());
            Ok(Profile::load(p)?)
        }
        None => Ok(temu_profile()),
    }
}

fn cmd_run(
    profile_path: Option<&Path>,
    options: &RunOptions,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    LOG_SINK.set_quiet(quiet);
    let profile = load_profile(profile_path)?;

    eprintln!("==============================================================");
    eprintln!("📄 {} → {}", options.source.display(), options.template.display());
    eprintln!("   Profile: {}", profile.name);
    eprintln!("==============================================================");

    let summary = match run(&profile, options) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("\n--- FAILED: destination left unchanged ---");
            return Err(e.into());
        }
    };

    eprintln!("==============================================================");
    eprintln!(
        "✨ Done: {} of {} records written to '{}'",
        summary.records_written, summary.records_loaded, profile.destination.sheet_name
    );
    if summary.saved {
        eprintln!("   File: {}", summary.destination.display());
    } else {
        eprintln!("   Dry run, nothing saved");
    }
    if !summary.warnings.is_empty() {
        eprintln!("   ⚠️  {} warning(s)", summary.warnings.len());
    }
    eprintln!("==============================================================");
    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    encoding: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let delimiter = match delimiter {
        Some(d) => d,
        None => {
            let (content, _) = sheetfill::decode_content(&fs::read(input)?, encoding)?;
            sheetfill::detect_delimiter(&content)
        }
    };
    let result = parse_csv_file(input, delimiter, encoding)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.dataset.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.dataset.len());

    let json = serde_json::to_string_pretty(&result.dataset.to_json())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_rules(profile_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let profile = load_profile(profile_path)?;
    let Some(settings) = &profile.classify else {
        eprintln!("Profile '{}' has no category rules", profile.name);
        return Ok(());
    };

    println!("Target column: {}", settings.target_field);
    println!("Text columns:  {}", settings.text_fields.join(", "));
    println!();
    for (i, rule) in settings.rules.iter().enumerate() {
        println!("{:2}. {} {}", i + 1, rule.code, rule.label);
        for pattern in &rule.patterns {
            println!("      {}", pattern);
        }
    }
    Ok(())
}

fn cmd_classify(text: &str, profile_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let profile = load_profile(profile_path)?;
    let Some(settings) = &profile.classify else {
        eprintln!("Profile '{}' has no category rules", profile.name);
        return Ok(());
    };

    let classifier = CategoryClassifier::new(settings)?;
    match classifier.classify(&format!(" {}", text)) {
        Some(rule) => println!("{} {}", rule.code, rule.label),
        None => println!("no match"),
    }
    Ok(())
}

fn cmd_example_profile(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = temu_profile().to_json()?;
    write_output(&json, output)
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
