// In-text directives: double-underscore markers and redirects.

use crate::title::{NamespaceId, PageTitle};
use crate::wikilink::parse_wiki_links;

/// Behaviour switches a page can carry in its own text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `__NOTARGET__`: the page never becomes a link target.
    NoTarget,
    /// `__NOAUTOLINKS__`: the page never receives automatic links.
    NoAutolinks,
}

impl Marker {
    pub fn token(self) -> &'static str {
        match self {
            Marker::NoTarget => "__NOTARGET__",
            Marker::NoAutolinks => "__NOAUTOLINKS__",
        }
    }
}

/// Case-insensitive search for a marker token.
pub fn contains_marker(text: &str, marker: Marker) -> bool {
    let token = marker.token();
    text.as_bytes()
        .windows(token.len())
        .any(|window| window.eq_ignore_ascii_case(token.as_bytes()))
}

/// Extract the redirect target of a page, if its text is a redirect.
///
/// A redirect starts (after leading whitespace) with `#REDIRECT`, in any
/// case, then optional blanks, an optional `:`, and a wiki link on the same
/// line. `lookup` resolves namespace prefixes.
pub fn redirect_target<F>(text: &str, lookup: F) -> Option<PageTitle>
where
    F: Fn(&str) -> Option<NamespaceId>,
{
    let body = text.trim_start();
    let keyword = body.get(..REDIRECT.len())?;
    if !keyword.eq_ignore_ascii_case(REDIRECT) {
        return None;
    }

    let rest = body[REDIRECT.len()..].trim_start_matches(BLANKS);
    let rest = rest.strip_prefix(':').unwrap_or(rest).trim_start_matches(BLANKS);
    if !rest.starts_with("[[") {
        return None;
    }
    let line = rest.split('\n').next().unwrap_or(rest);
    let link = parse_wiki_links(line).into_iter().next()?;
    PageTitle::parse_prefixed(&link.target, lookup).ok()
}

const REDIRECT: &str = "#redirect";
const BLANKS: [char; 2] = [' ', '\t'];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::title::{canonical_namespace_id, NS_HELP, NS_MAIN};

    #[test]
    fn detects_markers_in_any_case() {
        assert!(contains_marker("intro __NOTARGET__ body", Marker::NoTarget));
        assert!(contains_marker("__noautolinks__", Marker::NoAutolinks));
        assert!(!contains_marker("__NOTARGET__", Marker::NoAutolinks));
        assert!(!contains_marker("", Marker::NoTarget));
    }

    #[test]
    fn parses_redirect() {
        let target = redirect_target("#REDIRECT [[Paris]]", canonical_namespace_id).unwrap();
        assert_eq!(target.namespace(), NS_MAIN);
        assert_eq!(target.text(), "Paris");
    }

    #[test]
    fn parses_redirect_with_namespace_and_fragment() {
        let target =
            redirect_target("  #redirect [[Help:Editing#Links]]\n", canonical_namespace_id)
                .unwrap();
        assert_eq!(target.namespace(), NS_HELP);
        assert_eq!(target.text(), "Editing");
    }

    #[test]
    fn ordinary_text_is_not_a_redirect() {
        assert!(redirect_target("Paris is a city. [[France]]", canonical_namespace_id).is_none());
        assert!(redirect_target("#REDIRECT\n[[Paris]]", canonical_namespace_id).is_none());
        assert!(redirect_target("#RED", canonical_namespace_id).is_none());
    }

    #[test]
    fn redirect_keyword_must_be_followed_by_the_link() {
        assert!(redirect_target("#REDIRECTION [[Apple]]", canonical_namespace_id).is_none());
        assert!(redirect_target("#REDIRECT see [[Apple]]", canonical_namespace_id).is_none());

        let colon = redirect_target("#REDIRECT: [[Apple]]", canonical_namespace_id).unwrap();
        assert_eq!(colon.text(), "Apple");
        let tight = redirect_target("#redirect[[Apple]] trailing", canonical_namespace_id).unwrap();
        assert_eq!(tight.text(), "Apple");
    }
}
