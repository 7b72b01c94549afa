use anyhow::{Context, Result, bail};
use clap::{Arg, Command};
use stave::{Value, parse_pipeline, parse_score};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let matches = Command::new("stave")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs a selection pipeline against a LilyPond-style score")
        .arg(
            Arg::new("input")
                .help("Score file")
                .value_name("INPUT_FILE")
                .index(1),
        )
        .arg(
            Arg::new("source")
                .help("Score text given inline instead of a file")
                .long("source")
                .short('s')
                .value_name("SCORE")
                .conflicts_with("input"),
        )
        .arg(
            Arg::new("select")
                .help("Pipeline, e.g. \"select().leaves(pitched=true).get([0], period=2)\"")
                .long("select")
                .required(true)
                .value_name("PIPELINE"),
        )
        .arg(
            Arg::new("color")
                .help("Color the selected leaves and print the whole score")
                .long("color")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("colors")
                .help("Colors to cycle through with --color (comma-separated)")
                .long("colors")
                .value_name("COLORS")
                .value_delimiter(',')
                .requires("color"),
        )
        .arg(
            Arg::new("formula")
                .help("Print the pipeline in function form before the result")
                .long("formula")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .help("Enable verbose output")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let content = match (
        matches.get_one::<String>("input"),
        matches.get_one::<String>("source"),
    ) {
        (Some(input_file), _) => {
            info!(file = %input_file, "reading score");
            std::fs::read_to_string(input_file)
                .with_context(|| format!("Failed to read input file: {}", input_file))?
        }
        (None, Some(source)) => source.clone(),
        (None, None) => bail!("Either INPUT_FILE or --source is required"),
    };
    let score = parse_score(&content).context("Failed to parse score")?;

    let pipeline = matches
        .get_one::<String>("select")
        .context("--select is required")?;
    let expression = parse_pipeline(pipeline)
        .with_context(|| format!("Failed to parse pipeline: {}", pipeline))?;
    info!(pipeline = %expression, "evaluating");

    if matches.get_flag("formula") {
        println!("{}", expression.get_string(None));
    }

    if matches.get_flag("color") {
        let colors: Vec<String> = matches
            .get_many::<String>("colors")
            .unwrap_or_default()
            .cloned()
            .collect();
        let colors: Vec<&str> = colors.iter().map(String::as_str).collect();
        let palette = if colors.is_empty() {
            None
        } else {
            Some(colors.as_slice())
        };
        expression.color(score.clone(), palette)?;
        println!("{}", score);
        return Ok(());
    }

    match expression.call(score)? {
        Value::None => {}
        Value::Component(component) => println!("{}", component),
        Value::Selection(selection) => {
            for item in selection.iter() {
                println!("{}", item);
            }
        }
    }

    Ok(())
}
