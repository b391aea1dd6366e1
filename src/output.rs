//! Human and JSON rendering of flow results.
//!
//! Results go to stdout; logs go to stderr, so `--json` output stays parseable.
use crate::catalog::{Handle, Policy, SearchResult};
use crate::provision::{CleanupOutcome, ProvisioningReport};
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Serialize)]
struct CleanupView<'a> {
    step: usize,
    kind: &'a str,
    target: &'a str,
    outcome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ReportView<'a> {
    flow: &'a str,
    cleanup: Vec<CleanupView<'a>>,
    handles: &'a [Handle],
}

#[derive(Serialize)]
struct SearchView<'a> {
    query: &'a str,
    count: usize,
    results: &'a [SearchResult],
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

pub fn print_report(flow: &str, report: &ProvisioningReport, json: bool) -> Result<()> {
    if json {
        let cleanup = report
            .cleanup
            .iter()
            .map(|record| CleanupView {
                step: record.step,
                kind: record.kind.label(),
                target: record.target.as_str(),
                outcome: record.outcome.label(),
                error: match &record.outcome {
                    CleanupOutcome::Failed(err) => Some(err.to_string()),
                    _ => None,
                },
            })
            .collect();
        return print_json(&ReportView {
            flow,
            cleanup,
            handles: &report.handles,
        });
    }

    println!("flow: {flow}");
    for record in &report.cleanup {
        match &record.outcome {
            CleanupOutcome::Failed(err) => {
                println!("cleanup {}: {} failed ({err})", record.kind, record.target)
            }
            outcome => println!(
                "cleanup {}: {} {}",
                record.kind,
                record.target,
                outcome.label()
            ),
        }
    }
    for handle in &report.handles {
        println!("created {}: {}", handle.kind, handle.name);
    }
    Ok(())
}

pub fn print_policy(policy: &Policy, json: bool) -> Result<()> {
    if json {
        return print_json(policy);
    }
    let text = serde_json::to_string(policy).context("serialize policy")?;
    println!("Iam policy: {text}");
    Ok(())
}

pub fn print_search(query: &str, results: &[SearchResult], json: bool) -> Result<()> {
    if json {
        return print_json(&SearchView {
            query,
            count: results.len(),
            results,
        });
    }
    println!("{} result(s) for {query:?}", results.len());
    for result in results {
        let kind = if result.search_result_subtype.is_empty() {
            result.search_result_type.as_str()
        } else {
            result.search_result_subtype.as_str()
        };
        if result.linked_resource.is_empty() {
            println!("  - {kind}: {}", result.relative_resource_name);
        } else {
            println!(
                "  - {kind}: {} ({})",
                result.relative_resource_name, result.linked_resource
            );
        }
    }
    Ok(())
}
