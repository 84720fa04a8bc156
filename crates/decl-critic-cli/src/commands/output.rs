//! Shared output formatting for findings.

use anyhow::Result;
use decl_critic::CriticFinding;

use crate::OutputFormat;

/// Print findings in the specified format.
pub fn print(findings: &[CriticFinding], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(findings),
        OutputFormat::Json => return print_json(findings),
        OutputFormat::Compact => print_compact(findings),
    }
    Ok(())
}

fn print_text(findings: &[CriticFinding]) {
    if findings.is_empty() {
        println!("\x1b[32mNo errors!\x1b[0m");
        return;
    }

    for finding in findings {
        println!("\x1b[31merror\x1b[0m [{}]", finding.kind);
        for line in finding.message.lines() {
            println!("  {line}");
        }
        if let Some(position) = finding.position {
            println!(
                "  = at declaration offset {}, length {}",
                position.start, position.length
            );
        }
        println!();
    }

    println!("\x1b[31mFound {} error(s)\x1b[0m", findings.len());
}

fn print_json(findings: &[CriticFinding]) -> Result<()> {
    let json = serde_json::to_string_pretty(findings)?;
    println!("{json}");
    Ok(())
}

fn print_compact(findings: &[CriticFinding]) {
    for finding in findings {
        let summary = finding.message.lines().next().unwrap_or_default();
        match finding.position {
            Some(position) => {
                println!("{}:{}: [{}] {}", position.start, position.length, finding.kind, summary);
            }
            None => println!("[{}] {}", finding.kind, summary),
        }
    }
}
