use anyhow::Result;
use clap::Parser;
use procflow::activity::{ingest, read_records};
use procflow::cli::{Cli, OutputFormat};
use procflow::config::FlowConfig;
use procflow::csv_output::{CsvSummaryOutput, CsvTransitionOutput};
use procflow::json_output::JsonOutput;
use procflow::pipeline::{analyze_case, analyze_log, CaseAnalysis};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load the configuration file (if any) and apply flag overrides
fn build_config(args: &Cli) -> Result<FlowConfig> {
    let mut config = match &args.config {
        Some(path) => FlowConfig::from_toml(path)?,
        None => FlowConfig::default(),
    };

    if let Some(threshold) = args.anomaly_threshold {
        config.anomaly_duration_threshold = threshold;
    }
    if let Some(min_gap) = args.min_gap {
        config.min_gap_seconds = min_gap;
    }
    if let Some(max_gap) = args.max_gap {
        config.max_gap_seconds = max_gap;
    }
    if let Some(jobs) = args.jobs {
        config.workers = jobs;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn render_csv(cases: &[CaseAnalysis], summary_only: bool) -> String {
    if summary_only {
        let mut output = CsvSummaryOutput::new();
        for case in cases {
            output.add_summary(case.summary.clone());
        }
        output.to_csv()
    } else {
        let mut output = CsvTransitionOutput::new();
        for case in cases {
            output.add_case(case);
        }
        output.to_csv()
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = build_config(&args)?;
    let records = read_records(&args.input)?;
    let report = ingest(records);

    // JSON reports carry the rejected records themselves
    if !report.rejected.is_empty() && args.format != OutputFormat::Json {
        eprintln!(
            "warning: {} record(s) rejected during validation",
            report.rejected.len()
        );
    }

    match args.case_id.as_deref() {
        Some(case_id) => {
            let case = analyze_case(case_id, &report.activities, &config);
            match args.format {
                OutputFormat::Text if args.summary_only => println!("{}", case.summary),
                OutputFormat::Text => print!("{}", case.to_report_string()),
                OutputFormat::Json => {
                    let mut output = JsonOutput::from_case(case);
                    output.set_rejected(&report.rejected);
                    println!("{}", output.to_json()?);
                }
                OutputFormat::Csv => {
                    print!("{}", render_csv(std::slice::from_ref(&case), args.summary_only))
                }
            }
        }
        None => {
            let log = analyze_log(&report.activities, &config);
            match args.format {
                OutputFormat::Text if args.summary_only => {
                    for case in &log.cases {
                        println!("{}", case.summary);
                    }
                }
                OutputFormat::Text => print!("{}", log.to_report_string()),
                OutputFormat::Json => {
                    let mut output = JsonOutput::from_log(log);
                    output.set_rejected(&report.rejected);
                    println!("{}", output.to_json()?);
                }
                OutputFormat::Csv => print!("{}", render_csv(&log.cases, args.summary_only)),
            }
        }
    }

    Ok(())
}
