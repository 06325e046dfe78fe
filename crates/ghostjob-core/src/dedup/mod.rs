//! Duplicate detection across job boards, re-shares and employer sites.

pub mod canonical;
mod service;

pub use canonical::{canonicalize_url, exact_url_key, is_tracking_param};
pub use service::{
    DuplicateDetector, DuplicateGroup, DuplicateMatch, GroupMember, MatchMethod, PairMatch,
    group_from_matches, resolve_primary,
};
