//! vitalscan — Core Web Vitals audits from the terminal
//!
//! Runs the full scan pipeline for one URL: mobile and desktop reports
//! fetched concurrently, then a best-effort AI narrative.

use std::env;
use std::fmt::Write as FmtWrite;

use anyhow::{Result, anyhow};

use vitalscan_core::{
    NarrativeClient, PerformanceReport, PsiClient, ScanState, Scanner, Strategy, config,
};

const APP_NAME: &str = "vitalscan";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "─────────────────────────────────────────────────────────────";

struct CliOptions {
    url: String,
    json_output: bool,
    skip_ai: bool,
}

enum CliCommand {
    Run(CliOptions),
    Help,
    Version,
}

fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    if args.is_empty() {
        return Ok(CliCommand::Help);
    }

    let mut url: Option<String> = None;
    let mut json_output = false;
    let mut skip_ai = false;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-v" | "--version" => return Ok(CliCommand::Version),
            "-j" | "--json" => json_output = true,
            "--no-ai" => skip_ai = true,
            other if other.starts_with('-') => {
                return Err(anyhow!("unknown option: {other}"));
            }
            other => {
                if url.is_some() {
                    return Err(anyhow!("multiple URLs supplied"));
                }
                url = Some(other.to_string());
            }
        }
    }

    let url = url.ok_or_else(|| anyhow!("no URL supplied (try --help)"))?;
    Ok(CliCommand::Run(CliOptions {
        url,
        json_output,
        skip_ai,
    }))
}

fn print_help() {
    println!("{APP_NAME} — Core Web Vitals audits with AI-powered recommendations");
    println!();
    println!("Usage: {APP_NAME} [options] <url>");
    println!();
    println!("Options:");
    println!("  -j, --json       Print the report pair as JSON");
    println!("      --no-ai      Skip the AI analysis stage");
    println!("  -h, --help       Show this help");
    println!("  -v, --version    Show version");
    println!();
    println!("Environment:");
    println!("  {}     Measurement-provider API key (required)", config::PSI_KEY_VAR);
    println!("  {}      Text-generation API key (required unless --no-ai)", config::ANTHROPIC_KEY_VAR);
}

fn strategy_header(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Mobile => "📱 MOBILE REPORT",
        Strategy::Desktop => "🖥️ DESKTOP REPORT",
    }
}

fn render_report(report: &PerformanceReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{}", strategy_header(report.strategy));
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "• URL              : {}", report.url);
    let _ = writeln!(out, "• Tested At        : {}", report.fetch_time);
    let _ = writeln!(out, "• Performance      : {:.0}/100", report.overall_score);
    out.push('\n');

    out.push_str("Lab Metrics\n");
    for metric in report.metrics.iter() {
        let _ = writeln!(
            out,
            "  {:<6}{:<28}{:<14}{}",
            metric.short_name,
            metric.name,
            metric.display_value,
            metric.rating.as_str().to_uppercase()
        );
    }

    if report.has_field_data() {
        let field_data = report.field_data.as_ref().unwrap();
        out.push_str("\nField Data (real users, 75th percentile)\n");
        let mut row = |label: &str, metric: &Option<vitalscan_core::FieldMetric>| {
            if let Some(metric) = metric {
                let _ = writeln!(out, "  {:<6}p75 {:<12}{}", label, metric.percentile, metric.category);
            }
        };
        row("LCP", &field_data.lcp);
        row("INP", &field_data.inp);
        row("CLS", &field_data.cls);
        row("FCP", &field_data.fcp);
        row("FID", &field_data.fid);
        row("TTFB", &field_data.ttfb);
    }

    out.push_str("\nOpportunities\n");
    if report.opportunities.is_empty() {
        out.push_str("  • None identified\n");
    } else {
        for opportunity in &report.opportunities {
            match &opportunity.savings {
                Some(savings) => {
                    let _ = writeln!(out, "  • {} (potential savings: {savings})", opportunity.title);
                }
                None => {
                    let _ = writeln!(out, "  • {}", opportunity.title);
                }
            }
        }
    }

    out.push_str("\nDiagnostics\n");
    if report.diagnostics.is_empty() {
        out.push_str("  • None identified\n");
    } else {
        for diagnostic in &report.diagnostics {
            match &diagnostic.display_value {
                Some(display) => {
                    let _ = writeln!(out, "  • {} ({display})", diagnostic.title);
                }
                None => {
                    let _ = writeln!(out, "  • {}", diagnostic.title);
                }
            }
        }
    }

    out.push('\n');
    out
}

async fn run(options: CliOptions) -> Result<()> {
    let psi = PsiClient::new(config::require_env(config::PSI_KEY_VAR)?)?;
    let narrator = if options.skip_ai {
        None
    } else {
        Some(NarrativeClient::new(config::require_env(
            config::ANTHROPIC_KEY_VAR,
        )?)?)
    };

    let mut scanner = Scanner::new(psi, narrator);
    scanner
        .submit(&options.url, |state| match state {
            ScanState::Fetching { url } => {
                eprintln!("Fetching mobile and desktop reports for {url} ...");
            }
            ScanState::Analyzing { .. } => {
                eprintln!("Generating AI analysis ...");
            }
            _ => {}
        })
        .await;

    match scanner.state() {
        ScanState::Done { reports, narrative } => {
            if options.json_output {
                let output = serde_json::json!({
                    "mobile": reports.mobile,
                    "desktop": reports.desktop,
                    "analysis": narrative.text(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{}", render_report(&reports.mobile));
                print!("{}", render_report(&reports.desktop));
                match narrative.text() {
                    Some(text) => {
                        println!("{RULE}");
                        println!("🤖 AI ANALYSIS");
                        println!("{RULE}");
                        println!("{text}");
                    }
                    None if !options.skip_ai => {
                        eprintln!("(AI analysis unavailable)");
                    }
                    None => {}
                }
            }
            Ok(())
        }
        ScanState::Error { message } => Err(anyhow!("{message}")),
        _ => Err(anyhow!("no scan was started; supply a non-empty URL")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    match parse_arguments(&args)? {
        CliCommand::Help => {
            print_help();
            Ok(())
        }
        CliCommand::Version => {
            println!("{APP_NAME} {VERSION}");
            Ok(())
        }
        CliCommand::Run(options) => run(options).await,
    }
}
