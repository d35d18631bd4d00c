//! Broken-link commands: `scan` and `fix`.

mod report;

pub use report::LinkReport;

use anyhow::{Result, bail};

use super::ScanArgs;
use super::common::App;
use crate::audit::{LinkHealth, persist};
use crate::log;
use crate::utils::{plural_count, plural_s};

/// Scan the corpus and report broken links grouped by document.
pub fn run_scan(app: &App, args: &ScanArgs) -> Result<()> {
    let corpus = app.corpus()?;
    if corpus.is_empty() {
        log!("scan"; "no documents in {}", app.config.content.dir.display());
        return Ok(());
    }
    log!("scan"; "scanning {}", plural_count(corpus.len(), "document"));

    let findings = app.auditor().scan(&corpus);
    let unresolved = findings.iter().filter(|f| f.unresolved.is_some()).count();
    let health = LinkHealth::new(corpus.len(), findings, args.limit);
    let total = health.summary.total_broken_links;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        let report = LinkReport::from_findings(&health.findings, health.summary.clone());
        report.print("broken links");
        if report.row_count() < total {
            log!("scan"; "showing {} of {}", report.row_count(), total);
        }
        log!("scan"; "{}", report);
    }

    // a looping rule table is a config bug, not a content warning
    if unresolved > 0 {
        bail!(
            "{} with a redirect chain that never settles",
            plural_count(unresolved, "link")
        );
    }
    if total > 0 && !args.warn_only {
        bail!(
            "{} broken link{} found",
            total,
            plural_s(total)
        );
    }
    Ok(())
}

/// Rewrite broken links in place, or only print the rewrites with `dry_run`.
pub fn run_fix(app: &App, dry_run: bool) -> Result<()> {
    let corpus = app.corpus()?;
    let mut outcomes = app.auditor().fix(&corpus, None);
    let changed = outcomes.iter().filter(|o| o.changed).count();

    if dry_run {
        let report = LinkReport::from_fixed(outcomes.iter().flat_map(|o| &o.fixed_links));
        report.print("would fix");
        log!(
            "fix";
            "would update {} ({} rewritten)",
            plural_count(changed, "document"),
            report
        );
        return Ok(());
    }

    if changed == 0 {
        log!("fix"; "nothing to fix in {}", plural_count(corpus.len(), "document"));
        return Ok(());
    }

    let result = persist(app.store.as_ref(), &mut outcomes);
    LinkReport::from_fixed(&result.fixed_links).print("fixed");
    log!(
        "fix";
        "updated {} of {}",
        plural_count(result.summary.blogs_updated, "document"),
        result.summary.total_processed
    );

    if !result.success {
        for e in &result.errors {
            log!("error"; "{}", e);
        }
        bail!("{} failed", plural_count(result.summary.errors, "write"));
    }
    Ok(())
}
