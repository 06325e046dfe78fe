//! Pairwise matching, grouping and merging of duplicate postings.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::canonical::{canonicalize_url, exact_url_key};
use crate::error::DedupError;
use crate::models::config::DedupConfig;
use crate::models::job::{ExtractionField, FieldSource, JobField, NormalizedJobRecord};
use crate::models::platform::Platform;
use crate::similarity::{company_similarity, locations_equal, title_similarity};

/// How two records were found to be the same posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Identical URL up to fragment and trailing slash.
    ExactUrl,
    /// Identical after tracking/job-id normalization.
    CanonicalUrl,
    /// Same company, title and location.
    ContentSimilarity,
    /// Same company and title on a different platform.
    Contextual,
}

impl MatchMethod {
    /// Match confidence attached to this method.
    pub fn confidence(&self) -> f32 {
        match self {
            MatchMethod::ExactUrl => 1.0,
            MatchMethod::CanonicalUrl => 0.9,
            MatchMethod::ContentSimilarity => 0.85,
            MatchMethod::Contextual => 0.75,
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchMethod::ExactUrl => "exact-URL match",
            MatchMethod::CanonicalUrl => "canonical-URL match",
            MatchMethod::ContentSimilarity => "content-similarity match",
            MatchMethod::Contextual => "contextual match",
        };
        write!(f, "{}", label)
    }
}

/// A candidate judged to be the same posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub candidate_id: Uuid,
    pub confidence: f32,
    pub method: MatchMethod,
}

/// Match between two group members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairMatch {
    pub a: Uuid,
    pub b: Uuid,
    pub confidence: f32,
    pub method: MatchMethod,
}

/// What primary resolution needs to know about a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub platform: Platform,
    /// Count of non-placeholder fields.
    pub completeness: usize,
    /// Posting date, or extraction time when undated.
    pub seen_at: DateTime<Utc>,
    pub source_url: String,
}

impl GroupMember {
    pub fn from_record(record: &NormalizedJobRecord) -> Self {
        Self {
            id: record.id,
            platform: record.platform,
            completeness: record.completeness(),
            seen_at: record.posted_at().unwrap_or(record.metadata.extracted_at),
            source_url: record.source_url.clone(),
        }
    }
}

/// Records believed to be one real-world posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub id: Uuid,
    pub members: Vec<GroupMember>,
    /// Member whose fields win when the group is merged.
    pub canonical_id: Uuid,
    pub matches: Vec<PairMatch>,
}

impl DuplicateGroup {
    /// Start a group from its first member.
    pub fn new(first: &NormalizedJobRecord) -> Self {
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, first.id.as_bytes()),
            members: vec![GroupMember::from_record(first)],
            canonical_id: first.id,
            matches: Vec::new(),
        }
    }

    /// Add a member and re-resolve the canonical record.
    pub fn add_member(&mut self, record: &NormalizedJobRecord, link: PairMatch) {
        if !self.contains(record.id) {
            self.members.push(GroupMember::from_record(record));
        }
        self.matches.push(link);

        if let Ok(primary) = resolve_primary(self) {
            if primary != self.canonical_id {
                debug!("Group {} canonical changed to {}", self.id, primary);
                self.canonical_id = primary;
            }
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.id).collect()
    }
}

/// Group a record with the candidates it was already matched against.
pub fn group_from_matches(
    record: &NormalizedJobRecord,
    candidates: &[NormalizedJobRecord],
    matches: &[DuplicateMatch],
) -> Option<DuplicateGroup> {
    if matches.is_empty() {
        return None;
    }

    let mut group = DuplicateGroup::new(record);
    for found in matches {
        if let Some(candidate) = candidates.iter().find(|c| c.id == found.candidate_id) {
            group.add_member(
                candidate,
                PairMatch {
                    a: record.id,
                    b: candidate.id,
                    confidence: found.confidence,
                    method: found.method,
                },
            );
        }
    }
    Some(group)
}

/// Preference order: platform rank, completeness, recency, then lowest id.
fn preference(a: &GroupMember, b: &GroupMember) -> Ordering {
    a.platform
        .preference_rank()
        .cmp(&b.platform.preference_rank())
        .then(a.completeness.cmp(&b.completeness))
        .then(a.seen_at.cmp(&b.seen_at))
        .then(b.id.cmp(&a.id))
}

/// Pick the canonical member of a group.
pub fn resolve_primary(group: &DuplicateGroup) -> Result<Uuid, DedupError> {
    group
        .members
        .iter()
        .max_by(|a, b| preference(a, b))
        .map(|m| m.id)
        .ok_or(DedupError::EmptyGroup)
}

/// Finds and merges duplicate postings.
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    config: DedupConfig,
}

impl DuplicateDetector {
    /// Create a detector with default similarity thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set similarity thresholds.
    pub fn with_config(mut self, config: DedupConfig) -> Self {
        self.config = config;
        self
    }

    /// Compare a record against a candidate pool. Results are ordered by
    /// confidence, highest first.
    pub fn detect_duplicates(
        &self,
        record: &NormalizedJobRecord,
        candidates: &[NormalizedJobRecord],
    ) -> Vec<DuplicateMatch> {
        let mut matches: Vec<DuplicateMatch> = candidates
            .iter()
            .filter_map(|candidate| {
                self.match_pair(record, candidate).map(|method| DuplicateMatch {
                    candidate_id: candidate.id,
                    confidence: method.confidence(),
                    method,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.candidate_id.cmp(&b.candidate_id))
        });

        debug!(
            "{} duplicate candidates for {} among {}",
            matches.len(),
            record.id,
            candidates.len()
        );
        matches
    }

    /// Strongest method under which two records match, if any.
    pub fn match_pair(
        &self,
        a: &NormalizedJobRecord,
        b: &NormalizedJobRecord,
    ) -> Option<MatchMethod> {
        if same_key(&a.source_url, &b.source_url, exact_url_key) {
            return Some(MatchMethod::ExactUrl);
        }
        if same_key(&a.source_url, &b.source_url, canonicalize_url) {
            return Some(MatchMethod::CanonicalUrl);
        }

        // Placeholders carry no identity.
        if !(a.fields.title.is_present()
            && a.fields.company.is_present()
            && b.fields.title.is_present()
            && b.fields.company.is_present())
        {
            return None;
        }

        let similar = company_similarity(a.company(), b.company()) >= self.config.company_similarity
            && title_similarity(a.title(), b.title()) >= self.config.title_similarity;
        if !similar {
            return None;
        }

        if locations_equal(a.location(), b.location()) {
            Some(MatchMethod::ContentSimilarity)
        } else if a.platform != b.platform {
            Some(MatchMethod::Contextual)
        } else {
            None
        }
    }

    /// Group a record with its duplicates from the pool. Returns no group
    /// when nothing matched.
    pub fn find_duplicates(
        &self,
        record: &NormalizedJobRecord,
        candidates: &[NormalizedJobRecord],
    ) -> Vec<DuplicateGroup> {
        let matches = self.detect_duplicates(record, candidates);
        group_from_matches(record, candidates, &matches)
            .into_iter()
            .collect()
    }

    /// Group a whole batch. Only groups with two or more members are returned.
    pub fn cluster(&self, records: &[NormalizedJobRecord]) -> Vec<DuplicateGroup> {
        let mut parent: Vec<usize> = (0..records.len()).collect();
        let mut links: Vec<(usize, usize, MatchMethod)> = Vec::new();

        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                if let Some(method) = self.match_pair(&records[i], &records[j]) {
                    links.push((i, j, method));
                    let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                    if ri != rj {
                        parent[rj.max(ri)] = ri.min(rj);
                    }
                }
            }
        }

        let mut groups: Vec<(usize, DuplicateGroup)> = Vec::new();
        for (i, j, method) in links {
            let root = find_root(&mut parent, i);
            let position = match groups.iter().position(|(r, _)| *r == root) {
                Some(position) => position,
                None => {
                    groups.push((root, DuplicateGroup::new(&records[root])));
                    groups.len() - 1
                }
            };
            let group = &mut groups[position].1;
            let link = PairMatch {
                a: records[i].id,
                b: records[j].id,
                confidence: method.confidence(),
                method,
            };
            if !group.contains(records[i].id) {
                group.members.push(GroupMember::from_record(&records[i]));
            }
            group.add_member(&records[j], link);
        }

        let groups: Vec<DuplicateGroup> = groups.into_iter().map(|(_, g)| g).collect();
        info!("Clustered {} records into {} duplicate groups", records.len(), groups.len());
        groups
    }

    /// Merge a group into one record: the canonical member's fields win and
    /// its placeholders are filled from the other members.
    pub fn merge_group(
        &self,
        group: &mut DuplicateGroup,
        records: &[NormalizedJobRecord],
    ) -> Result<NormalizedJobRecord, DedupError> {
        group.canonical_id = resolve_primary(group)?;

        let mut ordered = group.members.clone();
        ordered.sort_by(|a, b| preference(b, a));

        let mut members = Vec::with_capacity(ordered.len());
        for member in &ordered {
            let record = records
                .iter()
                .find(|r| r.id == member.id)
                .ok_or(DedupError::MissingMember(member.id))?;
            members.push(record);
        }

        let (canonical, others) = members.split_first().ok_or(DedupError::EmptyGroup)?;
        let mut merged = canonical.revised();

        for field in JobField::ALL {
            if merged.fields.get(field).is_present() {
                continue;
            }
            let donor = others
                .iter()
                .map(|r| (r.id, r.fields.get(field)))
                .find(|(_, f)| f.is_present());
            if let Some((donor_id, value)) = donor {
                if let Some(text) = value.as_str() {
                    merged.fields.set(
                        field,
                        ExtractionField::new(text, value.confidence, FieldSource::Merged),
                    );
                    merged
                        .metadata
                        .applied_improvements
                        .push(format!("{} merged from duplicate {}", field, donor_id));
                }
            }
        }

        if merged.fields.posted_at.is_none() {
            merged.fields.posted_at = others.iter().find_map(|r| r.fields.posted_at);
        }

        merged.recompute_confidence();
        info!(
            "Merged group {} of {} records into {}",
            group.id,
            group.members.len(),
            merged.id
        );
        Ok(merged)
    }
}

fn same_key(
    a: &str,
    b: &str,
    key: fn(&str) -> Result<String, crate::error::ExtractionError>,
) -> bool {
    match (key(a), key(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}
