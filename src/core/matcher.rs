//! Asset matcher - Narrows a message down to at most one asset.
//!
//! Two strategies, combined by a fixed precedence in [`match_asset`]:
//!
//! 1. **Filter text** (primary): an asset matches when the message contains every
//!    comma-separated token of its `filter_text`. Reviewers set these values while
//!    resolving the unmatched queue, so the system learns new message formats without
//!    new grammars.
//! 2. **Issuer / card suffix** (secondary): only consulted when filter text matched
//!    nothing and the parser produced an issuer candidate.
//!
//! The matcher never guesses: any ambiguity yields no match.

use crate::core::parser::ParsedCandidate;
use crate::entities::AssetModel;

/// Splits a `filter_text` value into its non-empty, trimmed tokens.
#[must_use]
pub fn filter_tokens(filter_text: &str) -> Vec<&str> {
    filter_text
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// True when `text` contains every token of `filter_text`.
///
/// A filter with no tokens matches nothing.
#[must_use]
pub fn filter_matches(filter_text: &str, text: &str) -> bool {
    let tokens = filter_tokens(filter_text);
    !tokens.is_empty() && tokens.iter().all(|token| text.contains(token))
}

fn exactly_one<'a>(mut found: impl Iterator<Item = &'a AssetModel>) -> Option<&'a AssetModel> {
    let first = found.next()?;
    found.next().is_none().then_some(first)
}

/// Matches by issuer and, when present, card suffix.
#[must_use]
pub fn match_by_issuer<'a>(
    candidate: &ParsedCandidate,
    assets: &'a [AssetModel],
) -> Option<&'a AssetModel> {
    let same_issuer = assets.iter().filter(|asset| asset.issuer == candidate.issuer);

    match candidate.card_suffix.as_deref() {
        Some(suffix) => {
            exactly_one(same_issuer.filter(|asset| asset.asset_number.as_deref() == Some(suffix)))
        }
        None => exactly_one(same_issuer),
    }
}

/// Outcome of filter-text matching; ambiguity is kept apart from "nothing found"
/// so it can block the issuer fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMatch<'a> {
    None,
    Unique(&'a AssetModel),
    Ambiguous,
}

/// Matches by configured `filter_text` tokens.
#[must_use]
pub fn match_by_filter_text<'a>(text: &str, assets: &'a [AssetModel]) -> FilterMatch<'a> {
    let mut matching = assets.iter().filter(|asset| {
        asset
            .filter_text
            .as_deref()
            .is_some_and(|filter| filter_matches(filter, text))
    });
    match (matching.next(), matching.next()) {
        (None, _) => FilterMatch::None,
        (Some(asset), None) => FilterMatch::Unique(asset),
        (Some(_), Some(_)) => FilterMatch::Ambiguous,
    }
}

/// Resolves the target asset using filter text first, then issuer data.
#[must_use]
pub fn match_asset<'a>(
    text: &str,
    candidate: Option<&ParsedCandidate>,
    assets: &'a [AssetModel],
) -> Option<&'a AssetModel> {
    match match_by_filter_text(text, assets) {
        FilterMatch::Unique(asset) => Some(asset),
        FilterMatch::Ambiguous => None,
        FilterMatch::None => candidate.and_then(|candidate| match_by_issuer(candidate, assets)),
    }
}
