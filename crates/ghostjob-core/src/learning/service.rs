//! Applying stored corrections and borrowing values from similar postings.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use super::Result;
use super::store::{CorrectionStore, InMemoryCorrectionStore};
use crate::error::LearningError;
use crate::models::config::LearningConfig;
use crate::models::correction::{Correction, CorrectionOrigin, CorrectionPattern, normalize_host};
use crate::models::job::{
    ExtractionField, FieldSource, JobField, NormalizedJobRecord, UNKNOWN_COMPANY,
    UNKNOWN_POSITION,
};
use crate::similarity::{
    company_similarity, locations_equal, normalize_company, normalize_text, title_similarity,
};

/// Title similarity required before a placeholder company is borrowed.
const PLACEHOLDER_TITLE_SIMILARITY: f32 = 0.9;

/// Discount applied to a company borrowed for a placeholder.
const PLACEHOLDER_BORROW_FACTOR: f32 = 0.7;

/// Owns the correction store and applies what it learned.
///
/// Reads go straight to the store. Writes for one storage key are serialized
/// through a per-key mutex, so concurrent corrections for the same pattern
/// never overwrite each other.
pub struct CorrectionLearningService {
    store: Arc<dyn CorrectionStore>,
    config: LearningConfig,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CorrectionLearningService {
    /// Create a service over a store.
    pub fn new(store: Arc<dyn CorrectionStore>) -> Self {
        Self {
            store,
            config: LearningConfig::default(),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a service over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCorrectionStore::new()))
    }

    /// Set learning thresholds.
    pub fn with_config(mut self, config: LearningConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CorrectionStore> {
        &self.store
    }

    /// Store a correction. An identical fix already on file is reinforced
    /// (higher confidence, verified flag, latest timestamp) instead of duplicated.
    pub fn record_correction(&self, correction: Correction) -> Result<Correction> {
        validate(&correction)?;
        let key = correction.storage_key();

        let lock = self.key_lock(&key)?;
        let _guard = lock
            .lock()
            .map_err(|_| LearningError::Store(format!("lock for '{}' poisoned", key)))?;

        let stored = match self
            .store
            .load_corrections(&key)?
            .into_iter()
            .find(|existing| existing.same_fix(&correction))
        {
            Some(mut existing) => {
                existing.confidence = existing.confidence.max(correction.confidence);
                existing.verified |= correction.verified;
                existing.updated_at = existing.updated_at.max(correction.updated_at);
                debug!("Reinforcing existing correction {}", existing.id);
                existing
            }
            None => correction,
        };

        self.store.save_correction(&stored)?;
        info!(
            "Recorded {} correction {} for {} ({})",
            if stored.verified { "verified" } else { "unverified" },
            stored.id,
            stored.field,
            stored.pattern.describe()
        );
        Ok(stored)
    }

    /// Clear the verified flag of a stored correction.
    pub fn mark_unverified(&self, key: &str, id: Uuid) -> Result<Correction> {
        let lock = self.key_lock(key)?;
        let _guard = lock
            .lock()
            .map_err(|_| LearningError::Store(format!("lock for '{}' poisoned", key)))?;

        let mut correction = self
            .store
            .load_corrections(key)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(LearningError::NotFound(id))?;
        correction.verified = false;
        self.store.save_correction(&correction)?;

        info!("Marked correction {} unverified", id);
        Ok(correction)
    }

    /// Stored corrections, for one key or all of them.
    pub fn list_corrections(&self, key: Option<&str>) -> Result<Vec<Correction>> {
        let keys = match key {
            Some(key) => vec![normalize_host(key)],
            None => self.store.keys()?,
        };

        let mut corrections = Vec::new();
        for key in keys {
            corrections.extend(self.store.load_corrections(&key)?);
        }
        Ok(corrections)
    }

    /// Apply stored corrections matching the URL and parser.
    ///
    /// A correction replaces a field only when its effective (decayed)
    /// confidence is above the field's current confidence; the field then
    /// carries the correction's stored confidence. Returns the revised record and
    /// a description of every applied correction; the record is returned
    /// unchanged (same version) when nothing applied.
    pub fn apply_learned_patterns(
        &self,
        record: &NormalizedJobRecord,
        url: &str,
        parser: &str,
    ) -> Result<(NormalizedJobRecord, Vec<String>)> {
        let corrections = self.matching_corrections(url, parser)?;
        if corrections.is_empty() {
            return Ok((record.clone(), Vec::new()));
        }

        let at = record.metadata.extracted_at;
        let mut refined = record.revised();
        let mut applied = Vec::new();

        for field in JobField::ALL {
            let current = record.fields.get(field);
            let current_text = current.as_str().unwrap_or(match field {
                JobField::Title => UNKNOWN_POSITION,
                JobField::Company => UNKNOWN_COMPANY,
                _ => "",
            });

            let mut eligible: Vec<(&Correction, f32)> = corrections
                .iter()
                .filter(|c| c.field == field && original_matches(c, current_text))
                .map(|c| (c, self.effective_confidence(c, at)))
                .collect();
            eligible.sort_by(|a, b| precedence(a, b));

            let Some((best, effective)) = eligible.first().copied() else {
                continue;
            };
            if eligible
                .iter()
                .any(|(c, _)| normalize_text(&c.corrected_value) != normalize_text(&best.corrected_value))
            {
                debug!(
                    "{} conflicting corrections for {}; using {}",
                    eligible.len(),
                    field,
                    best.id
                );
            }

            if effective <= current.confidence {
                debug!(
                    "Correction {} ({:.2}) does not beat current {} ({:.2})",
                    best.id, effective, field, current.confidence
                );
                continue;
            }

            refined.fields.set(
                field,
                ExtractionField::new(
                    best.corrected_value.as_str(),
                    best.confidence.max(effective),
                    FieldSource::Correction,
                ),
            );
            applied.push(format!(
                "{} -> '{}' from correction {} ({})",
                field,
                best.corrected_value,
                best.id,
                best.pattern.describe()
            ));
        }

        if applied.is_empty() {
            return Ok((record.clone(), applied));
        }

        refined.recompute_confidence();
        refined.metadata.applied_improvements.extend(applied.iter().cloned());
        info!("Applied {} learned corrections to {}", applied.len(), record.id);
        Ok((refined, applied))
    }

    /// Borrow strong values from similar prior postings for weak fields.
    ///
    /// Matching is case- and punctuation-insensitive and tolerant of small
    /// edits, and works across platforms. Values are only taken when they
    /// raise the field's confidence.
    pub fn learn_from_similar_postings(
        &self,
        record: &NormalizedJobRecord,
        references: &[NormalizedJobRecord],
    ) -> (NormalizedJobRecord, Vec<String>) {
        let weak = self.config.weak_field_threshold;
        let strong = self.config.strong_field_threshold;
        let references: Vec<&NormalizedJobRecord> =
            references.iter().filter(|r| r.id != record.id).collect();

        let mut refined = record.revised();
        let mut applied = Vec::new();

        // Weak company: borrow a strongly extracted spelling of the same employer.
        let company = &record.fields.company;
        if company.is_present() && company.confidence < weak {
            let best = references
                .iter()
                .filter(|r| r.fields.company.is_present() && r.fields.company.confidence >= strong)
                .map(|r| (*r, company_similarity(record.company(), r.company())))
                .filter(|(_, sim)| *sim >= self.config.company_similarity)
                .max_by(|a, b| by_score(a.1 * a.0.fields.company.confidence, b.1 * b.0.fields.company.confidence));
            if let Some((reference, sim)) = best {
                borrow(
                    &mut refined,
                    JobField::Company,
                    reference,
                    reference.fields.company.confidence * sim,
                    sim,
                    &mut applied,
                );
            }
        }

        // Placeholder company: only when the same title and location agree on one employer.
        if !record.fields.company.is_present()
            && record.fields.title.is_present()
            && record.location().is_some()
        {
            let agreeing: Vec<&NormalizedJobRecord> = references
                .iter()
                .copied()
                .filter(|r| r.fields.company.is_present() && r.fields.company.confidence >= strong)
                .filter(|r| {
                    title_similarity(record.title(), r.title()) >= PLACEHOLDER_TITLE_SIMILARITY
                        && locations_equal(record.location(), r.location())
                })
                .collect();

            let employers: HashSet<String> =
                agreeing.iter().map(|r| normalize_company(r.company())).collect();
            if employers.len() == 1 {
                if let Some(reference) = agreeing
                    .iter()
                    .max_by(|a, b| by_score(a.fields.company.confidence, b.fields.company.confidence))
                {
                    borrow(
                        &mut refined,
                        JobField::Company,
                        reference,
                        reference.fields.company.confidence * PLACEHOLDER_BORROW_FACTOR,
                        1.0,
                        &mut applied,
                    );
                }
            } else if employers.len() > 1 {
                debug!("Similar postings disagree on the employer of {}", record.id);
            }
        }

        // Weak title: borrow from the same employer's strongly extracted posting.
        let title = &record.fields.title;
        if title.is_present() && title.confidence < weak && refined.fields.company.is_present() {
            let company = refined.company().to_string();
            let best = references
                .iter()
                .filter(|r| r.fields.title.is_present() && r.fields.title.confidence >= strong)
                .filter(|r| {
                    r.fields.company.is_present()
                        && company_similarity(&company, r.company()) >= self.config.company_similarity
                })
                .map(|r| (*r, title_similarity(record.title(), r.title())))
                .filter(|(_, sim)| *sim >= self.config.title_similarity)
                .max_by(|a, b| by_score(a.1 * a.0.fields.title.confidence, b.1 * b.0.fields.title.confidence));
            if let Some((reference, sim)) = best {
                borrow(
                    &mut refined,
                    JobField::Title,
                    reference,
                    reference.fields.title.confidence * sim,
                    sim,
                    &mut applied,
                );
            }
        }

        if applied.is_empty() {
            return (record.clone(), applied);
        }

        refined.recompute_confidence();
        refined.metadata.applied_improvements.extend(applied.iter().cloned());
        info!("Borrowed {} values from similar postings for {}", applied.len(), record.id);
        (refined, applied)
    }

    /// Remember values borrowed from similar postings as contextual corrections
    /// for the posting's domain.
    pub fn persist_contextual(
        &self,
        before: &NormalizedJobRecord,
        after: &NormalizedJobRecord,
    ) -> Result<Vec<Correction>> {
        let Some(host) = Url::parse(after.source_url.trim())
            .ok()
            .and_then(|u| u.host_str().map(normalize_host))
        else {
            debug!("No domain to attach contextual corrections for {}", after.id);
            return Ok(Vec::new());
        };

        let mut recorded = Vec::new();
        for field in JobField::ALL {
            let new = after.fields.get(field);
            let old = before.fields.get(field);
            if new.source != FieldSource::CrossReference || new.value == old.value {
                continue;
            }
            let Some(corrected) = new.as_str() else {
                continue;
            };

            let correction = Correction::new(
                CorrectionPattern::Domain(host.clone()),
                field,
                old.value.clone(),
                corrected,
                new.confidence,
            )
            .with_origin(CorrectionOrigin::Contextual)
            .at(after.metadata.extracted_at);
            recorded.push(self.record_correction(correction)?);
        }
        Ok(recorded)
    }

    /// Confidence after decay: unverified corrections halve every
    /// `unverified_half_life_days` whole days since their last update.
    pub fn effective_confidence(&self, correction: &Correction, at: DateTime<Utc>) -> f32 {
        let half_life = self.config.unverified_half_life_days;
        if correction.verified || half_life <= 0.0 {
            return correction.confidence;
        }
        let days = (at - correction.updated_at).num_days().max(0) as f32;
        correction.confidence * 0.5_f32.powf(days / half_life)
    }

    fn matching_corrections(&self, url: &str, parser: &str) -> Result<Vec<Correction>> {
        let Some(host) = Url::parse(url.trim())
            .ok()
            .and_then(|u| u.host_str().map(normalize_host))
        else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        let mut corrections = Vec::new();
        for key in domain_keys(&host) {
            for correction in self.store.load_corrections(&key)? {
                if correction.pattern.matches(url)
                    && correction.applies_to_parser(parser)
                    && seen.insert(correction.id)
                {
                    corrections.push(correction);
                }
            }
        }
        debug!("{} stored corrections match {} for {}", corrections.len(), url, parser);
        Ok(corrections)
    }

    fn key_lock(&self, key: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .key_locks
            .lock()
            .map_err(|_| LearningError::Store("lock table poisoned".to_string()))?;
        Ok(locks.entry(key.to_string()).or_default().clone())
    }
}

fn validate(correction: &Correction) -> Result<()> {
    if correction.corrected_value.trim().is_empty() {
        return Err(LearningError::InvalidCorrection("corrected value is empty".to_string()));
    }
    if !correction.confidence.is_finite() || !(0.0..=1.0).contains(&correction.confidence) {
        return Err(LearningError::InvalidCorrection(format!(
            "confidence {} outside [0, 1]",
            correction.confidence
        )));
    }
    if correction.storage_key().is_empty() {
        return Err(LearningError::InvalidCorrection("pattern has no host".to_string()));
    }
    if correction
        .original_value
        .as_deref()
        .is_some_and(|o| normalize_text(o) == normalize_text(&correction.corrected_value))
    {
        return Err(LearningError::InvalidCorrection(
            "corrected value equals the original".to_string(),
        ));
    }
    Ok(())
}

/// Host plus each parent domain: `a.b.example.com`, `b.example.com`, `example.com`.
fn domain_keys(host: &str) -> Vec<String> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return vec![host.to_string()];
    }
    (0..labels.len() - 1).map(|i| labels[i..].join(".")).collect()
}

fn original_matches(correction: &Correction, current: &str) -> bool {
    correction
        .original_value
        .as_deref()
        .is_none_or(|original| normalize_text(original) == normalize_text(current))
}

/// Best first: verified, then effective confidence, then most recent.
fn precedence(a: &(&Correction, f32), b: &(&Correction, f32)) -> Ordering {
    b.0.verified
        .cmp(&a.0.verified)
        .then(b.1.total_cmp(&a.1))
        .then(b.0.updated_at.cmp(&a.0.updated_at))
        .then(a.0.id.cmp(&b.0.id))
}

fn by_score(a: f32, b: f32) -> Ordering {
    a.total_cmp(&b)
}

fn borrow(
    refined: &mut NormalizedJobRecord,
    field: JobField,
    reference: &NormalizedJobRecord,
    confidence: f32,
    similarity: f32,
    applied: &mut Vec<String>,
) {
    let current = refined.fields.get(field);
    let Some(value) = reference.fields.get(field).as_str() else {
        return;
    };
    if confidence <= current.confidence {
        return;
    }

    refined
        .fields
        .set(field, ExtractionField::new(value, confidence, FieldSource::CrossReference));
    applied.push(format!(
        "{} -> '{}' from similar posting {} (similarity {:.2})",
        field, value, reference.id, similarity
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::RawSource;
    use crate::parsers::{GenericParser, SourceParser};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn fetched() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn parse(url: &str, content: &str) -> NormalizedJobRecord {
        GenericParser.parse(&RawSource::new(url, content).with_fetched_at(fetched()))
    }

    fn structured(url: &str, title: &str, company: &str, locality: &str) -> NormalizedJobRecord {
        let html = format!(
            r#"<html><head><script type="application/ld+json">
            {{"@type":"JobPosting","title":"{}","hiringOrganization":{{"name":"{}"}},
              "jobLocation":{{"address":{{"addressLocality":"{}"}}}}}}
            </script></head><body></body></html>"#,
            title, company, locality
        );
        parse(url, &html)
    }

    fn company_fix(corrected: &str, confidence: f32) -> Correction {
        Correction::new(
            CorrectionPattern::Domain("example.com".to_string()),
            JobField::Company,
            Some(UNKNOWN_COMPANY.to_string()),
            corrected,
            confidence,
        )
        .at(fetched())
    }

    #[test]
    fn test_correction_replaces_placeholder() {
        let service = CorrectionLearningService::in_memory();
        service.record_correction(company_fix("Acme Inc", 0.8)).unwrap();

        let record = parse("https://example.com/jobs/1", "<html><body></body></html>");
        assert_eq!(record.company(), UNKNOWN_COMPANY);

        let (refined, applied) = service
            .apply_learned_patterns(&record, "https://example.com/jobs/1", "generic")
            .unwrap();

        assert_eq!(refined.company(), "Acme Inc");
        assert!(refined.fields.company.confidence >= 0.8);
        assert_eq!(refined.fields.company.source, FieldSource::Correction);
        assert_eq!(refined.version, record.version + 1);
        assert_eq!(applied.len(), 1);
        assert!(applied[0].contains("domain example.com"));
        assert_eq!(refined.metadata.applied_improvements, applied);
    }

    fn url_pattern_fix(pattern: &str, corrected: &str) -> Correction {
        Correction::new(
            CorrectionPattern::UrlPattern(pattern.to_string()),
            JobField::Company,
            None,
            corrected,
            0.9,
        )
        .verified()
        .at(fetched())
    }

    #[test]
    fn test_url_pattern_applies_to_www_host() {
        let service = CorrectionLearningService::in_memory();
        service
            .record_correction(url_pattern_fix("https://example.com/jobs/*", "Acme Inc"))
            .unwrap();

        let url = "https://www.example.com/jobs/1";
        let record = parse(url, "<html><body></body></html>");
        let (refined, applied) = service.apply_learned_patterns(&record, url, "generic").unwrap();

        assert_eq!(refined.company(), "Acme Inc");
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn test_wildcard_host_pattern_is_reachable() {
        let service = CorrectionLearningService::in_memory();
        service
            .record_correction(url_pattern_fix("https://*.globex.com/jobs/*", "Globex"))
            .unwrap();
        assert_eq!(service.store().keys().unwrap(), vec!["globex.com".to_string()]);

        let url = "https://eu.globex.com/jobs/1";
        let record = parse(url, "<html><body></body></html>");
        let (refined, _) = service.apply_learned_patterns(&record, url, "generic").unwrap();
        assert_eq!(refined.company(), "Globex");

        let other = "https://eu.globex.com/about";
        let record = parse(other, "<html><body></body></html>");
        let (refined, applied) = service.apply_learned_patterns(&record, other, "generic").unwrap();
        assert!(applied.is_empty());
        assert_eq!(refined.company(), UNKNOWN_COMPANY);
    }

    #[test]
    fn test_weaker_correction_is_not_applied() {
        let service = CorrectionLearningService::in_memory();
        let fix = Correction::new(
            CorrectionPattern::Domain("example.com".to_string()),
            JobField::Title,
            None,
            "Staff Engineer",
            0.5,
        )
        .at(fetched());
        service.record_correction(fix).unwrap();

        let record = structured("https://example.com/jobs/1", "Data Engineer", "Acme", "Austin");
        let (refined, applied) = service
            .apply_learned_patterns(&record, "https://example.com/jobs/1", "generic")
            .unwrap();

        assert!(applied.is_empty());
        assert_eq!(refined, record);
    }

    #[test]
    fn test_original_value_and_parser_scope() {
        let service = CorrectionLearningService::in_memory();
        let fix = Correction::new(
            CorrectionPattern::Domain("example.com".to_string()),
            JobField::Company,
            Some("Some Other Name".to_string()),
            "Acme Inc",
            0.9,
        )
        .at(fetched());
        service.record_correction(fix).unwrap();
        service
            .record_correction(company_fix("Globex", 0.9).for_parser("linkedin"))
            .unwrap();

        let record = parse("https://example.com/jobs/1", "<html><body></body></html>");
        let (_, applied) = service
            .apply_learned_patterns(&record, "https://example.com/jobs/1", "generic")
            .unwrap();
        assert!(applied.is_empty());
    }

    #[test]
    fn test_verified_correction_wins_conflict() {
        let service = CorrectionLearningService::in_memory();
        service.record_correction(company_fix("Acme Inc", 0.95)).unwrap();
        service
            .record_correction(company_fix("Acme Robotics", 0.7).verified())
            .unwrap();

        let record = parse("https://example.com/jobs/1", "<html><body></body></html>");
        let (refined, _) = service
            .apply_learned_patterns(&record, "https://example.com/jobs/1", "generic")
            .unwrap();
        assert_eq!(refined.company(), "Acme Robotics");
    }

    #[test]
    fn test_unverified_corrections_decay() {
        let service = CorrectionLearningService::in_memory();
        let fix = company_fix("Acme Inc", 0.8);

        assert_eq!(service.effective_confidence(&fix, fetched()), 0.8);
        let later = fetched() + Duration::days(180);
        assert!((service.effective_confidence(&fix, later) - 0.4).abs() < 1e-6);
        assert_eq!(service.effective_confidence(&fix.clone().verified(), later), 0.8);
    }

    #[test]
    fn test_aged_correction_keeps_stored_confidence() {
        let service = CorrectionLearningService::in_memory();
        service.record_correction(company_fix("Acme Inc", 0.8)).unwrap();

        let record = GenericParser.parse(
            &RawSource::new("https://example.com/jobs/1", "<html><body></body></html>")
                .with_fetched_at(fetched() + Duration::days(30)),
        );
        let (refined, applied) = service
            .apply_learned_patterns(&record, "https://example.com/jobs/1", "generic")
            .unwrap();

        assert_eq!(applied.len(), 1);
        assert_eq!(refined.company(), "Acme Inc");
        assert_eq!(refined.fields.company.confidence, 0.8);
    }

    #[test]
    fn test_decay_ranks_conflicting_corrections() {
        let service = CorrectionLearningService::in_memory();
        let old = Correction::new(
            CorrectionPattern::Domain("example.com".to_string()),
            JobField::Company,
            Some(UNKNOWN_COMPANY.to_string()),
            "Acme Inc",
            0.8,
        )
        .at(fetched() - Duration::days(360));
        service.record_correction(old).unwrap();
        service.record_correction(company_fix("Acme Robotics", 0.7)).unwrap();

        let record = parse("https://example.com/jobs/1", "<html><body></body></html>");
        let (refined, _) = service
            .apply_learned_patterns(&record, "https://example.com/jobs/1", "generic")
            .unwrap();

        assert_eq!(refined.company(), "Acme Robotics");
        assert_eq!(refined.fields.company.confidence, 0.7);
    }

    #[test]
    fn test_identical_fix_is_reinforced() {
        let service = CorrectionLearningService::in_memory();
        let first = service.record_correction(company_fix("Acme Inc", 0.6)).unwrap();
        let second = service
            .record_correction(company_fix("Acme Inc", 0.9).verified())
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.confidence, 0.9);
        assert!(second.verified);
        assert_eq!(service.list_corrections(Some("example.com")).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_corrections_rejected() {
        let service = CorrectionLearningService::in_memory();
        for bad in [
            company_fix("  ", 0.9),
            company_fix("Acme", 1.5),
            company_fix("unknown company", 0.9),
            Correction::new(CorrectionPattern::Domain(String::new()), JobField::Title, None, "x", 0.5),
        ] {
            assert!(matches!(
                service.record_correction(bad),
                Err(LearningError::InvalidCorrection(_))
            ));
        }
    }

    #[test]
    fn test_concurrent_writes_to_one_key() {
        let service = CorrectionLearningService::in_memory();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let service = &service;
                scope.spawn(move || {
                    service
                        .record_correction(company_fix(&format!("Acme {}", i), 0.8))
                        .unwrap();
                });
            }
        });
        assert_eq!(service.list_corrections(Some("example.com")).unwrap().len(), 8);
    }

    #[test]
    fn test_mark_unverified() {
        let service = CorrectionLearningService::in_memory();
        let stored = service
            .record_correction(company_fix("Acme Inc", 0.9).verified())
            .unwrap();

        let updated = service.mark_unverified("example.com", stored.id).unwrap();
        assert!(!updated.verified);
        assert!(matches!(
            service.mark_unverified("example.com", Uuid::new_v4()),
            Err(LearningError::NotFound(_))
        ));
    }

    #[test]
    fn test_weak_company_borrowed_across_platforms() {
        let service = CorrectionLearningService::in_memory();
        let record = parse(
            "https://www.indeed.com/viewjob?jk=abc",
            "Job Title: Data Engineer\nCompany: Acme Robotcs\nLocation: Austin",
        );
        let reference = structured(
            "https://careers.acmerobotics.com/jobs/9",
            "Data Engineer",
            "Acme Robotics",
            "Austin",
        );
        assert!(record.fields.company.confidence < 0.6);

        let (refined, applied) = service.learn_from_similar_postings(&record, &[reference]);

        assert_eq!(refined.company(), "Acme Robotics");
        assert_eq!(refined.fields.company.source, FieldSource::CrossReference);
        assert!(refined.fields.company.confidence > record.fields.company.confidence);
        assert!(refined.fields.title.confidence > record.fields.title.confidence);
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn test_placeholder_company_needs_agreement() {
        let service = CorrectionLearningService::in_memory();
        let record = parse(
            "https://example.com/jobs/1",
            "Job Title: Data Engineer\nLocation: Austin",
        );
        assert!(record.fields.company.is_placeholder());

        let acme = structured("https://careers.acme.com/1", "Data Engineer", "Acme", "Austin");
        let (refined, _) = service.learn_from_similar_postings(&record, &[acme.clone()]);
        assert_eq!(refined.company(), "Acme");
        assert!((refined.fields.company.confidence - 0.9 * 0.7).abs() < 1e-6);

        let globex = structured("https://careers.globex.com/1", "Data Engineer", "Globex", "Austin");
        let (refined, applied) = service.learn_from_similar_postings(&record, &[acme, globex]);
        assert!(applied.is_empty());
        assert_eq!(refined.company(), UNKNOWN_COMPANY);
    }

    #[test]
    fn test_persist_contextual() {
        let service = CorrectionLearningService::in_memory();
        let record = parse(
            "https://example.com/jobs/1",
            "Job Title: Data Engineer\nLocation: Austin",
        );
        let acme = structured("https://careers.acme.com/1", "Data Engineer", "Acme", "Austin");
        let (refined, _) = service.learn_from_similar_postings(&record, &[acme]);

        let recorded = service.persist_contextual(&record, &refined).unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].origin, CorrectionOrigin::Contextual);
        assert_eq!(recorded[0].original_value.as_deref(), Some(UNKNOWN_COMPANY));

        let fresh = parse("https://example.com/jobs/1", "Job Title: Data Engineer\nLocation: Austin");
        let (applied, _) = service
            .apply_learned_patterns(&fresh, "https://example.com/jobs/1", "generic")
            .unwrap();
        assert_eq!(applied.company(), "Acme");
    }
}
