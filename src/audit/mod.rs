//! Broken internal link auditing.
//!
//! # Flow
//!
//! ```text
//! corpus ──▶ extract_links ──▶ classify ──▶ BrokenLinkFinding
//!                                              │
//!                                   fix (pure) ▼
//!                                          FixOutcome ──▶ persist ──▶ store
//! ```
//!
//! Scanning and fixing never touch the store; only [`persist`] writes.

mod classify;
mod extract;
mod fix;

pub use classify::{BrokenLinkMap, Classification, Verdict};
pub use extract::{ExtractedLink, extract_links};
pub use fix::{FixOutcome, FixReport, FixSummary, FixedLink, persist};

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::core::{LinkKind, UrlPath};
use crate::log;
use crate::resolve::{CanonicalResolver, ResolveError};
use crate::store::ContentDocument;

/// A broken or redirected internal link in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLinkFinding {
    pub source_document_id: String,
    pub source_title: String,
    /// `href` value as written.
    pub target_url: String,
    pub link_text: String,
    pub suggested_fix: Option<String>,
    pub classification: Classification,
    /// Set when the redirect chain of the fix never settles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<String>,
}

/// Outcome of classifying one reported path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub classification: Classification,
    /// Settled destination of the fix.
    pub suggested_fix: Option<String>,
    /// The fix's redirect chain hit the hop limit; no fix is suggested.
    pub unresolved: Option<ResolveError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub missing: usize,
    pub redirected: usize,
}

/// Aggregate view of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkHealthSummary {
    pub total_broken_links: usize,
    pub fixable_links: usize,
    pub by_classification: ClassificationCounts,
    pub documents_scanned: usize,
    pub documents_affected: usize,
}

impl LinkHealthSummary {
    pub fn new(documents_scanned: usize, findings: &[BrokenLinkFinding]) -> Self {
        let mut summary = Self {
            total_broken_links: findings.len(),
            documents_scanned,
            ..Self::default()
        };
        let mut affected = FxHashSet::default();

        for finding in findings {
            if finding.suggested_fix.is_some() {
                summary.fixable_links += 1;
            }
            match finding.classification {
                Classification::Missing => summary.by_classification.missing += 1,
                Classification::Redirected => summary.by_classification.redirected += 1,
            }
            affected.insert(finding.source_document_id.as_str());
        }

        summary.documents_affected = affected.len();
        summary
    }
}

/// Summary plus the findings themselves, optionally truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkHealth {
    pub summary: LinkHealthSummary,
    pub findings: Vec<BrokenLinkFinding>,
}

impl LinkHealth {
    /// Summary counts always cover every finding, `limit` only trims the list.
    pub fn new(
        documents_scanned: usize,
        mut findings: Vec<BrokenLinkFinding>,
        limit: Option<usize>,
    ) -> Self {
        let summary = LinkHealthSummary::new(documents_scanned, &findings);
        if let Some(limit) = limit {
            findings.truncate(limit);
        }
        Self { summary, findings }
    }
}

/// Scans and fixes a corpus against one broken-link map and rule table.
#[derive(Debug, Clone, Copy)]
pub struct LinkAuditor<'a> {
    resolver: &'a CanonicalResolver,
    map: &'a BrokenLinkMap,
    follow_redirects: bool,
}

impl<'a> LinkAuditor<'a> {
    pub fn new(resolver: &'a CanonicalResolver, map: &'a BrokenLinkMap) -> Self {
        Self {
            resolver,
            map,
            follow_redirects: true,
        }
    }

    /// Also report links the redirect rule table would redirect.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Classify a normalized internal path. `None` means healthy.
    ///
    /// The suggested fix is the settled end of the target's redirect chain,
    /// never an intermediate hop.
    pub fn classify(&self, path: &UrlPath) -> Option<Diagnosis> {
        let (classification, target) = match self.map.lookup(path) {
            Some(Verdict::Moved(dest)) => (Classification::Redirected, Some(dest)),
            Some(Verdict::Gone) => (Classification::Missing, self.map.fallback()),
            None if self.follow_redirects && self.resolver.would_redirect(path.as_str()) => {
                (Classification::Redirected, Some(path))
            }
            None => return None,
        };

        let (suggested_fix, unresolved) = match target.map(|t| self.resolver.resolve(t.as_str())) {
            None => (None, None),
            Some(Ok(resolved)) => (Some(resolved.final_path), None),
            Some(Err(e)) => {
                log!("error"; "{}", e);
                (None, Some(e))
            }
        };

        Some(Diagnosis {
            classification,
            suggested_fix,
            unresolved,
        })
    }

    /// Suggested fixes that a second scan would report again.
    ///
    /// Covers map fixes and the fallback after resolution, plus the settled
    /// end of every token-free rule destination when redirects are followed.
    /// Chains that never settle are left to [`CanonicalResolver::check_rule_table`].
    pub fn unstable_fixes(&self) -> Vec<String> {
        let mut targets: Vec<&str> = self
            .map
            .fixes()
            .chain(self.map.fallback())
            .map(UrlPath::as_str)
            .collect();
        if self.follow_redirects {
            targets.extend(
                self.resolver
                    .table()
                    .iter()
                    .map(|(rule, _)| rule.destination.as_str())
                    .filter(|dest| !dest.contains(':'))
                    .filter(|dest| matches!(LinkKind::parse(dest), LinkKind::SiteRoot(_))),
            );
        }

        let mut bad: Vec<String> = targets
            .into_iter()
            .filter_map(|target| self.resolver.resolve(target).ok())
            .map(|resolved| resolved.final_path)
            .filter(|fix| fix.starts_with('/') && self.map.lookup(&UrlPath::new(fix)).is_some())
            .collect();
        bad.sort();
        bad.dedup();
        bad
    }

    /// Findings for one document, in link order.
    pub fn scan_document(&self, doc: &ContentDocument) -> Vec<BrokenLinkFinding> {
        extract_links(&doc.body, self.resolver.origins())
            .into_iter()
            .filter_map(|link| {
                let diagnosis = self.classify(&link.path)?;
                Some(BrokenLinkFinding {
                    source_document_id: doc.id.clone(),
                    source_title: doc.title.clone(),
                    target_url: link.url,
                    link_text: link.link_text,
                    suggested_fix: diagnosis.suggested_fix,
                    classification: diagnosis.classification,
                    unresolved: diagnosis.unresolved.map(|e| e.to_string()),
                })
            })
            .collect()
    }

    /// Findings for the whole corpus, in corpus order.
    pub fn scan(&self, corpus: &[ContentDocument]) -> Vec<BrokenLinkFinding> {
        corpus
            .par_iter()
            .flat_map_iter(|doc| self.scan_document(doc))
            .collect()
    }

    /// Compute rewritten bodies, one outcome per document.
    ///
    /// Uses `findings` when given, otherwise scans `corpus` first. Nothing is
    /// written; pass the outcomes to [`persist`].
    pub fn fix(
        &self,
        corpus: &[ContentDocument],
        findings: Option<&[BrokenLinkFinding]>,
    ) -> Vec<FixOutcome> {
        let scanned;
        let findings: &[BrokenLinkFinding] = match findings {
            Some(f) => f,
            None => {
                scanned = self.scan(corpus);
                &scanned
            }
        };

        let mut by_document: FxHashMap<&str, Vec<&BrokenLinkFinding>> = FxHashMap::default();
        for finding in findings {
            by_document
                .entry(finding.source_document_id.as_str())
                .or_default()
                .push(finding);
        }

        corpus
            .par_iter()
            .map(|doc| {
                let findings = by_document.get(doc.id.as_str()).map_or(&[][..], Vec::as_slice);
                self.fix_document(doc, findings)
            })
            .collect()
    }

    fn fix_document(&self, doc: &ContentDocument, findings: &[&BrokenLinkFinding]) -> FixOutcome {
        let pairs = fix::unique_fixes(
            findings
                .iter()
                .map(|f| (f.target_url.as_str(), f.suggested_fix.as_deref())),
        );

        let mut body = doc.body.clone();
        let mut fixed_links = Vec::new();
        for (target, suggested) in pairs {
            let (next, replaced) = fix::rewrite(&body, target, suggested, self.resolver.origins());
            fixed_links.extend(replaced.into_iter().map(|from| FixedLink {
                document_id: doc.id.clone(),
                title: doc.title.clone(),
                from,
                to: suggested.to_string(),
            }));
            body = next.into_owned();
        }

        let changed = body != doc.body;
        FixOutcome {
            document_id: doc.id.clone(),
            changed,
            new_body: changed.then_some(body),
            error: None,
            fixed_links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::tests::fixture;
    use crate::rules::RedirectRule;
    use crate::store::memory::MemoryStore;
    use crate::store::ContentStore;

    fn map() -> BrokenLinkMap {
        BrokenLinkMap::new(
            [
                ("/webseries".to_string(), Some("/latest".to_string())),
                ("/old-offer".to_string(), Some("/diwali2020".to_string())),
                ("/gone".to_string(), None),
            ],
            &["laptop", "temple"],
            Some("/latest"),
        )
    }

    fn doc(id: &str, body: &str) -> ContentDocument {
        ContentDocument::new(id, format!("Title {id}"), body)
    }

    #[test]
    fn test_webseries_twice_then_idempotent() {
        let resolver = fixture();
        let map = map();
        let auditor = LinkAuditor::new(&resolver, &map);
        let corpus = vec![doc(
            "post-1",
            r#"<a href="/webseries">x</a> text <a href="/webseries">x</a>"#,
        )];

        let findings = auditor.scan(&corpus);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].classification, Classification::Redirected);
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("/latest"));

        let outcomes = auditor.fix(&corpus, Some(&findings));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].changed);
        let body = outcomes[0].new_body.clone().unwrap();
        assert_eq!(body, r#"<a href="/latest">x</a> text <a href="/latest">x</a>"#);
        assert_eq!(outcomes[0].fixed_links.len(), 1);

        let again = auditor.fix(&[doc("post-1", &body)], None);
        assert!(!again[0].changed);
        assert!(again[0].new_body.is_none());
    }

    #[test]
    fn test_single_quoted_heuristic() {
        let resolver = fixture();
        let map = map();
        let findings = LinkAuditor::new(&resolver, &map)
            .scan(&[doc("p", "<a href='/temple-guide'>t</a>")]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].target_url, "/temple-guide");
        assert_eq!(findings[0].classification, Classification::Missing);
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("/latest"));
        assert_eq!(findings[0].link_text, "t");
    }

    #[test]
    fn test_external_links_ignored() {
        let resolver = fixture();
        let map = map();
        let findings = LinkAuditor::new(&resolver, &map)
            .scan(&[doc("p", r#"<a href="https://other.com/webseries">ext</a>"#)]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_map_fix_is_resolved() {
        let resolver = fixture();
        let map = map();
        let findings =
            LinkAuditor::new(&resolver, &map).scan(&[doc("p", r#"<a href="/old-offer">o</a>"#)]);
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("/latest"));
    }

    #[test]
    fn test_looping_fix_is_not_suggested() {
        let resolver = crate::resolve::tests::resolver(vec![
            RedirectRule::new("/a/:x", "/b/:x", true),
            RedirectRule::new("/b/:x", "/a/:x", true),
        ]);
        let map = BrokenLinkMap::new(
            [("/webseries".to_string(), Some("/a/latest".to_string()))],
            &["laptop"],
            Some("/b/home"),
        );
        let auditor = LinkAuditor::new(&resolver, &map);
        let corpus = [doc(
            "p",
            r#"<a href="/a/1">r</a> <a href="/webseries">w</a> <a href="/laptop">l</a>"#,
        )];

        let findings = auditor.scan(&corpus);
        assert_eq!(findings.len(), 3);
        for f in &findings {
            assert_eq!(f.suggested_fix, None, "{}", f.target_url);
            assert!(f.unresolved.as_deref().unwrap().contains("did not settle"));
        }
        assert!(!auditor.fix(&corpus, Some(&findings))[0].changed);

        let json = serde_json::to_value(&findings[0]).unwrap();
        assert!(json["unresolved"].is_string());
    }

    #[test]
    fn test_unstable_fixes_are_resolved_first() {
        let resolver = crate::resolve::tests::resolver(vec![
            RedirectRule::new("/deals", "/laptop-reviews", true),
            RedirectRule::new("/b", "/webseries", true),
        ]);
        let map = BrokenLinkMap::new(
            [
                ("/a".to_string(), Some("/b".to_string())),
                ("/webseries".to_string(), Some("/latest".to_string())),
            ],
            &["laptop"],
            None,
        );
        let auditor = LinkAuditor::new(&resolver, &map);
        assert_eq!(auditor.unstable_fixes(), ["/laptop-reviews", "/webseries"]);
        assert_eq!(auditor.follow_redirects(false).unstable_fixes(), ["/webseries"]);

        assert!(LinkAuditor::new(&fixture(), &map).unstable_fixes().is_empty());
    }

    #[test]
    fn test_missing_without_fallback() {
        let resolver = fixture();
        let map = BrokenLinkMap::new([("/gone".to_string(), None)], &["laptop"], None);
        let auditor = LinkAuditor::new(&resolver, &map);
        let corpus = [doc("p", r#"<a href="/gone">g</a> <a href="/laptop-deals">l</a>"#)];

        let findings = auditor.scan(&corpus);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.suggested_fix.is_none()));
        assert!(!auditor.fix(&corpus, Some(&findings))[0].changed);
    }

    #[test]
    fn test_follow_redirects() {
        let resolver = fixture();
        let map = BrokenLinkMap::default();
        let corpus = [doc("p", r#"<a href="/blog/diwali2020/">b</a> <a href="/latest">l</a>"#)];

        let findings = LinkAuditor::new(&resolver, &map).scan(&corpus);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].classification, Classification::Redirected);
        assert_eq!(findings[0].suggested_fix.as_deref(), Some("/latest"));

        let outcomes = LinkAuditor::new(&resolver, &map).fix(&corpus, None);
        assert_eq!(
            outcomes[0].new_body.as_deref(),
            Some(r#"<a href="/latest">b</a> <a href="/latest">l</a>"#)
        );

        let off = LinkAuditor::new(&resolver, &map).follow_redirects(false);
        assert!(off.scan(&corpus).is_empty());
    }

    #[test]
    fn test_own_origin_variants_fixed() {
        let resolver = fixture();
        let map = map();
        let corpus = [doc(
            "p",
            r#"<a href="/webseries">a</a> <a href="https://www.example.com/webseries">b</a>"#,
        )];
        let outcomes = LinkAuditor::new(&resolver, &map).fix(&corpus, None);
        let body = outcomes[0].new_body.as_deref().unwrap();
        assert!(!body.contains("webseries"));
        assert_eq!(body.matches(r#"href="/latest""#).count(), 2);
    }

    #[test]
    fn test_summary() {
        let resolver = fixture();
        let map = map();
        let corpus = [
            doc("a", r#"<a href="/webseries">w</a> <a href="/gone">g</a>"#),
            doc("b", r#"<a href="/about">ok</a>"#),
            doc("c", r#"<a href="/laptop">l</a>"#),
        ];
        let findings = LinkAuditor::new(&resolver, &map).scan(&corpus);
        let summary = LinkHealthSummary::new(corpus.len(), &findings);
        assert_eq!(summary.total_broken_links, 3);
        assert_eq!(summary.fixable_links, 3);
        assert_eq!(summary.by_classification.missing, 2);
        assert_eq!(summary.by_classification.redirected, 1);
        assert_eq!(summary.documents_scanned, 3);
        assert_eq!(summary.documents_affected, 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["byClassification"]["missing"], 2);
        assert_eq!(json["documentsAffected"], 2);

        let json = serde_json::to_value(&findings[0]).unwrap();
        assert_eq!(json["sourceDocumentId"], "a");
        assert_eq!(json["classification"], "redirected");
    }

    #[test]
    fn test_health_limit_keeps_counts() {
        let resolver = fixture();
        let map = map();
        let body = r#"<a href="/webseries">1</a>"#.repeat(30);
        let corpus = [doc("a", &body)];
        let findings = LinkAuditor::new(&resolver, &map).scan(&corpus);

        let health = LinkHealth::new(corpus.len(), findings, Some(20));
        assert_eq!(health.findings.len(), 20);
        assert_eq!(health.summary.total_broken_links, 30);
    }

    #[test]
    fn test_persist_isolates_failures() {
        let resolver = fixture();
        let map = map();
        let corpus = vec![
            doc("a", r#"<a href="/webseries">w</a>"#),
            doc("b", r#"<a href="/gone">g</a>"#),
            doc("c", r#"<a href="/about">ok</a>"#),
        ];
        let store = MemoryStore::new(corpus.clone()).failing_on("a");

        let mut outcomes = LinkAuditor::new(&resolver, &map).fix(&corpus, None);
        let report = persist(&store, &mut outcomes);

        assert!(!report.success);
        assert_eq!(report.summary.total_processed, 3);
        assert_eq!(report.summary.blogs_updated, 1);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.fixed_links.len(), 1);
        assert_eq!(report.fixed_links[0].document_id, "b");
        assert!(outcomes[0].error.is_some());
        assert!(outcomes[1].error.is_none());

        assert_eq!(store.body("b").unwrap(), r#"<a href="/latest">g</a>"#);
        assert_eq!(store.body("a").unwrap(), r#"<a href="/webseries">w</a>"#);
        // unchanged documents are never written
        assert_eq!(*store.writes.read(), vec!["b".to_string()]);
        assert_eq!(store.list_published().unwrap().len(), 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["blogsUpdated"], 1);
        assert_eq!(json["fixedLinks"][0]["to"], "/latest");
    }
}
