//! Tests for resource id handling and feed parsing.

use doclist::resource::{escape_path_segment, slug};
use doclist::{extract_ids, is_resource_id, DocsError, ResourceId, ResourceKind};

mod recognize_ids {
    use super::*;

    #[test]
    fn known_kinds() {
        assert!(is_resource_id("document:12345"));
        assert!(is_resource_id("spreadsheet:0Ah-abc_XYZ"));
        assert!(is_resource_id("presentation:1"));
        assert!(is_resource_id("drawing:1"));
    }

    #[test]
    fn unknown_lowercase_kind_is_still_an_id() {
        assert!(is_resource_id("folder:abc"));
    }

    #[test]
    fn titles_are_not_ids() {
        assert!(!is_resource_id("HR Handbook"));
        assert!(!is_resource_id("Document:12345"));
        assert!(!is_resource_id("document:"));
        assert!(!is_resource_id(":12345"));
        assert!(!is_resource_id(""));
    }
}

mod split_ids {
    use super::*;

    #[test]
    fn kind_and_opaque() {
        let id = ResourceId::new("spreadsheet:key:with:colons");
        assert_eq!(id.kind(), "spreadsheet");
        assert_eq!(id.opaque(), "key:with:colons");
        assert_eq!(id.resource_kind().unwrap(), ResourceKind::Spreadsheet);
        assert_eq!(id.scope().as_str(), "wise");
    }

    #[test]
    fn unknown_kind() {
        let id = ResourceId::new("folder:abc");
        assert!(matches!(id.resource_kind(), Err(DocsError::UnknownService(_))));
        assert_eq!(id.scope().as_str(), "writely");
    }

    #[test]
    fn parse_rejects_titles() {
        assert!("document:1".parse::<ResourceId>().is_ok());
        assert!("Quarterly report".parse::<ResourceId>().is_err());
    }
}

mod extract_from_feed {
    use super::*;

    #[test]
    fn atom_feed_with_namespace() {
        let feed = br#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005">
  <id>https://docs.google.com/feeds/default/private/full</id>
  <title>Available Documents</title>
  <entry gd:etag="&quot;abc&quot;">
    <id>https://docs.google.com/feeds/id/document%3A12345</id>
    <title>HR Handbook</title>
  </entry>
  <entry>
    <id>https://docs.google.com/feeds/id/spreadsheet%3a0Ah</id>
  </entry>
</feed>"#;

        let ids = extract_ids(feed).unwrap();
        assert_eq!(
            ids,
            vec![
                ResourceId::new("document:12345"),
                ResourceId::new("spreadsheet:0Ah")
            ]
        );
    }

    #[test]
    fn empty_feed() {
        let feed = b"<feed><id>https://docs.google.com/feeds/default/private/full</id></feed>";
        assert!(extract_ids(feed).unwrap().is_empty());
    }

    #[test]
    fn bare_entry_ids() {
        let feed = b"<entry><id>document:98765</id></entry>";
        assert_eq!(extract_ids(feed).unwrap(), vec![ResourceId::new("document:98765")]);
    }

    #[test]
    fn truncated_feed() {
        assert!(matches!(
            extract_ids(b"<feed><entry>"),
            Err(DocsError::MalformedResponse(_))
        ));
    }
}

mod escaping {
    use super::*;

    #[test]
    fn slug_keeps_printable_ascii() {
        assert_eq!(slug("Q3 report (final)"), "Q3 report (final)");
    }

    #[test]
    fn slug_escapes_percent_and_unicode() {
        assert_eq!(slug("100%"), "100%25");
        assert_eq!(slug("café"), "caf%C3%A9");
    }

    #[test]
    fn path_segment() {
        assert_eq!(escape_path_segment("document:12345"), "document:12345");
        assert_eq!(escape_path_segment("document:a b/c"), "document:a%20b%2Fc");
    }
}
