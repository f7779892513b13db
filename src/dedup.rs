//! "What is new since last time" for a single feed.
//!
//! The check is a short-circuit, not a set difference: items are walked in
//! feed order (newest first) and the walk stops at the first item whose
//! marker equals the stored one.  Anything listed below the stored marker is
//! assumed seen, so a feed that re-orders items or surfaces an edited older
//! item above the marker can have entries missed.

use crate::source::{Article, Marker};

/// Result of comparing a fetched feed against its stored marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection<'a> {
    /// New items, oldest first (dispatch order).
    pub new_articles: Vec<&'a Article>,

    /// Marker to store for the feed.  `None` leaves the stored one untouched.
    pub marker: Option<Marker>,
}

/// Split `items` (newest first) into the part not seen before `prior`.
///
/// With no `prior` marker every item is new; that is the backlog flush on a
/// feed's first observation.
pub fn detect_new<'a>(items: &'a [Article], prior: Option<&Marker>) -> Detection<'a> {
    let mut new_articles: Vec<&Article> = items
        .iter()
        .take_while(|item| match prior {
            Some(prior) => item.marker().as_ref() != Some(prior),
            None => true,
        })
        .collect();
    new_articles.reverse();

    let marker = items.first().and_then(Article::marker);

    Detection {
        new_articles,
        marker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Article {
        Article {
            title: Some(format!("Title {id}")),
            link: Some(format!("https://example.com/{id}")),
            guid: Some(id.to_string()),
        }
    }

    fn ids(detection: &Detection<'_>) -> Vec<String> {
        detection
            .new_articles
            .iter()
            .filter_map(|a| a.guid.clone())
            .collect()
    }

    #[test]
    fn first_scan_flushes_whole_backlog() {
        let items = vec![item("c"), item("b"), item("a")];
        let detection = detect_new(&items, None);

        assert_eq!(ids(&detection), ["a", "b", "c"]);
        assert_eq!(detection.marker, Some(Marker::new("c")));
    }

    #[test]
    fn unchanged_feed_yields_nothing() {
        let items = vec![item("c"), item("b"), item("a")];
        let prior = Marker::new("c");
        let detection = detect_new(&items, Some(&prior));

        assert!(detection.new_articles.is_empty());
        assert_eq!(detection.marker, Some(prior));
    }

    #[test]
    fn returns_items_above_marker_oldest_first() {
        let items = vec![item("A"), item("B"), item("C"), item("D")];
        let prior = Marker::new("C");
        let detection = detect_new(&items, Some(&prior));

        assert_eq!(ids(&detection), ["B", "A"]);
        assert_eq!(detection.marker, Some(Marker::new("A")));
    }

    #[test]
    fn empty_feed_keeps_marker() {
        let prior = Marker::new("x");
        let detection = detect_new(&[], Some(&prior));

        assert!(detection.new_articles.is_empty());
        assert_eq!(detection.marker, None);
    }

    #[test]
    fn marker_not_found_treats_everything_as_new() {
        let items = vec![item("b"), item("a")];
        let prior = Marker::new("gone");
        let detection = detect_new(&items, Some(&prior));

        assert_eq!(ids(&detection), ["a", "b"]);
        assert_eq!(detection.marker, Some(Marker::new("b")));
    }

    #[test]
    fn items_below_marker_are_not_revisited() {
        // "late" was inserted below the known item and is missed on purpose.
        let items = vec![item("new"), item("known"), item("late")];
        let prior = Marker::new("known");
        let detection = detect_new(&items, Some(&prior));

        assert_eq!(ids(&detection), ["new"]);
    }

    #[test]
    fn item_without_identity_is_new_but_sets_no_marker() {
        let items = vec![Article::default(), item("a")];
        let prior = Marker::new("a");
        let detection = detect_new(&items, Some(&prior));

        assert_eq!(detection.new_articles.len(), 1);
        assert_eq!(detection.marker, None);
    }
}
