use url::Url;

use super::SourceParser;

/// Fallback parser that accepts any source and relies on the generic
/// layout profile and text heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericParser;

impl SourceParser for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn can_handle(&self, _url: &Url) -> bool {
        true
    }
}
