// src/activity/pagination.rs
// =============================================================================
// Pagination inference.
//
// With per_page=1 every item is its own page, so the page number of the
// rel="last" link IS the number of items. We never walk the pages.
//
// Example header:
//   <https://api.github.com/repositories/1/commits?per_page=1&page=2>; rel="next",
//   <https://api.github.com/repositories/1/commits?per_page=1&page=7>; rel="last"
//   -> 7
// =============================================================================

use url::Url;

/// Reads the item count out of a `Link` header produced with `per_page=1`.
///
/// Prefers `rel="last"`; falls back to `rel="next"` when no last link exists.
pub fn page_count_from_link(header: &str) -> Option<u64> {
    let mut next = None;

    for part in header.split(',') {
        let mut pieces = part.split(';');
        let Some(target) = pieces
            .next()
            .map(str::trim)
            .and_then(|t| t.strip_prefix('<'))
            .and_then(|t| t.strip_suffix('>'))
        else {
            continue;
        };

        let rel = pieces
            .map(str::trim)
            .find_map(|param| param.strip_prefix("rel="))
            .map(|rel| rel.trim_matches('"'));

        match rel {
            Some(rels) if rels.split_whitespace().any(|r| r == "last") => {
                return page_param(target);
            }
            Some(rels) if rels.split_whitespace().any(|r| r == "next") => {
                next = page_param(target);
            }
            _ => {}
        }
    }

    next
}

fn page_param(target: &str) -> Option<u64> {
    let url = Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}
