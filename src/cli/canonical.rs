//! Canonical URL commands: `resolve`, `check`, `rules` and `match`.

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::common::App;
use crate::core::UrlPath;
use crate::log;
use crate::resolve::{CheckReport, ResolvedCanonical};
use crate::rules;
use crate::utils::{plural_count, plural_s};

/// One resolved input with its absolute canonical URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveLine {
    #[serde(flatten)]
    resolved: ResolvedCanonical,
    canonical_url: String,
}

/// Resolve each path and print its canonical URL.
///
/// Every input is reported; the command fails afterwards if any chain did
/// not settle or any input was not on this site.
pub fn run_resolve(app: &App, paths: &[String], base_url: Option<&str>, json: bool) -> Result<()> {
    let mut lines = Vec::with_capacity(paths.len());
    let mut failed = 0;

    for input in paths {
        let Some(path) = app.site_path(input) else {
            log!("error"; "`{}` is not on {}", input, app.resolver.origins().canonical());
            failed += 1;
            continue;
        };
        match app.resolver.resolve(&path) {
            Ok(mut resolved) => {
                resolved.original_path = input.clone();
                let canonical_url = app.resolver.absolute(&resolved, base_url);
                lines.push(ResolveLine {
                    resolved,
                    canonical_url,
                });
            }
            Err(e) => {
                log!("error"; "{}", e);
                failed += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for line in &lines {
            print_resolved(line);
        }
    }

    if failed > 0 {
        bail!("{} could not be resolved", plural_count(failed, "path"));
    }
    Ok(())
}

fn print_resolved(line: &ResolveLine) {
    let r = &line.resolved;
    if r.hops == 0 {
        println!("{} {}", r.original_path, line.canonical_url.dimmed());
        return;
    }
    let status = if r.permanent { "permanent" } else { "temporary" };
    println!(
        "{} {} {} {}",
        r.original_path,
        "→".green(),
        line.canonical_url.green(),
        format!("({} hop{}, {status})", r.hops, plural_s(r.hops)).dimmed()
    );
}

/// Validate URLs, defaulting to `canonical.samples`.
pub fn run_check(app: &App, urls: &[String], json: bool) -> Result<()> {
    let urls = if urls.is_empty() {
        app.config.canonical.samples.as_slice()
    } else {
        urls
    };
    let report = CheckReport::new(app.resolver.validate_canonical_urls(urls));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for check in &report.results {
            if check.is_valid {
                println!("{} {}", "✓".green(), check.url);
                continue;
            }
            let issue = check.issue.as_deref().unwrap_or("not canonical");
            match &check.should_be {
                Some(should_be) => println!(
                    "{} {} {} {} {}",
                    "✗".red(),
                    check.url,
                    "→".red(),
                    should_be,
                    format!("({issue})").dimmed()
                ),
                None => println!("{} {} {}", "✗".red(), check.url, format!("({issue})").dimmed()),
            }
        }
    }

    let summary = report.summary;
    if summary.invalid > 0 {
        bail!(
            "{} of {} not canonical",
            plural_count(summary.invalid, "url"),
            summary.total
        );
    }
    log!("check"; "all {} canonical", plural_count(summary.total, "url"));
    Ok(())
}

/// Print the rule table in evaluation order, then any chain that never settles.
pub fn run_rules(app: &App) -> Result<()> {
    let table = app.resolver.table();
    if table.is_empty() {
        log!("rules"; "no redirect rules configured");
        return Ok(());
    }

    let width = table.len().to_string().len();
    for (index, (rule, kind)) in table.iter().enumerate() {
        let status = if rule.permanent { "308" } else { "307" };
        println!(
            "{:>width$} {:<8} {} {} {} {}",
            (index + 1).dimmed(),
            kind.as_str().cyan(),
            rule.source,
            "→".dimmed(),
            rule.destination,
            status.dimmed(),
        );
    }

    let errors = app.resolver.check_rule_table();
    if errors.is_empty() {
        log!("rules"; "{} settle", plural_count(table.len(), "rule"));
        return Ok(());
    }
    for e in &errors {
        log!("error"; "{}", e);
    }
    bail!(
        "{} never settle{}",
        plural_count(errors.len(), "redirect chain"),
        if errors.len() == 1 { "s" } else { "" }
    );
}

/// Test one path against one pattern, printing the destination if given.
pub fn run_match(pattern: &str, path: &str, destination: Option<&str>) -> Result<()> {
    let path = UrlPath::from_browser(path);

    let Some(template) = destination else {
        if rules::matches(path.as_str(), pattern)? {
            println!("{} {} matches {}", "✓".green(), path, pattern);
            return Ok(());
        }
        bail!("{path} does not match {pattern}");
    };

    match rules::destination_for(path.as_str(), pattern, template)? {
        Some(dest) => {
            println!("{} {} {}", path, "→".green(), dest.green());
            Ok(())
        }
        None => bail!("{path} does not match {pattern}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::common::tests::app;

    #[test]
    fn test_resolve_keeps_input_and_fails_on_foreign() {
        let app = app(Vec::new());
        let paths = vec!["/diwali2020".to_string(), "/about".to_string()];
        assert!(run_resolve(&app, &paths, None, true).is_ok());

        let paths = vec!["https://other.org/x".to_string()];
        assert!(run_resolve(&app, &paths, None, false).is_err());
    }

    #[test]
    fn test_check_fails_on_samples() {
        // samples include /diwali2020, which redirects
        let app = app(Vec::new());
        assert!(run_check(&app, &[], false).is_err());
        assert!(run_check(&app, &["/latest".to_string()], true).is_ok());
    }

    #[test]
    fn test_rules_settle() {
        assert!(run_rules(&app(Vec::new())).is_ok());
    }

    #[test]
    fn test_match() {
        assert!(run_match("/blog/:slug*", "/blog/my-post", Some("/:slug*")).is_ok());
        assert!(run_match("/microsoft*", "/microsoft-office-guide", None).is_ok());
        assert!(run_match("/microsoft*", "/apple", None).is_err());
        assert!(run_match("/blog/:slug", "/blog/a", Some("/:other")).is_err());
    }
}
