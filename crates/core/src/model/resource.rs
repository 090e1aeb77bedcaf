use serde::{Deserialize, Serialize};

/// A bookmarkable learning resource.
///
/// Two resources are the same bookmark when their `link` matches; the rest is
/// display metadata that may drift between curriculum reloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f32>,
}

impl Resource {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        kind: impl Into<String>,
        link: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            kind: kind.into(),
            link: link.into(),
            platform: platform.into(),
            estimated_hours: None,
        }
    }

    #[must_use]
    pub fn with_estimated_hours(mut self, hours: f32) -> Self {
        self.estimated_hours = Some(hours);
        self
    }
}

/// Insertion-ordered bookmark list with set semantics keyed on `link`.
///
/// Stored lists are deduplicated on load, so a document written with repeated
/// links reads back with the first entry per link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Resource>", into = "Vec<Resource>")]
pub struct BookmarkSet(Vec<Resource>);

impl From<Vec<Resource>> for BookmarkSet {
    fn from(resources: Vec<Resource>) -> Self {
        Self::from_resources(resources)
    }
}

impl From<BookmarkSet> for Vec<Resource> {
    fn from(set: BookmarkSet) -> Self {
        set.0
    }
}

impl BookmarkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a possibly-duplicated list; the first entry per link wins.
    #[must_use]
    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut set = Self::new();
        for resource in resources {
            set.insert(resource);
        }
        set
    }

    #[must_use]
    pub fn contains(&self, link: &str) -> bool {
        self.0.iter().any(|r| r.link == link)
    }

    /// Append `resource` unless its link is already bookmarked.
    ///
    /// Returns `true` if the set changed.
    pub fn insert(&mut self, resource: Resource) -> bool {
        if self.contains(&resource.link) {
            return false;
        }
        self.0.push(resource);
        true
    }

    /// Remove the bookmark with this link. Returns `true` if one was removed.
    pub fn remove(&mut self, link: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|r| r.link != link);
        self.0.len() != before
    }

    /// Remove if present by link, append otherwise.
    ///
    /// Returns whether the resource is bookmarked afterwards.
    pub fn toggle(&mut self, resource: Resource) -> bool {
        if self.remove(&resource.link) {
            false
        } else {
            self.0.push(resource);
            true
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Resource {
        Resource::new(title, "article", "https://example.com/intro", "Blog")
    }

    #[test]
    fn stored_duplicates_collapse_on_load() {
        let raw = r#"[
            {"title": "Intro", "type": "article", "link": "https://example.com/intro", "platform": "Blog"},
            {"title": "Intro again", "type": "video", "link": "https://example.com/intro", "platform": "Tube"},
            {"title": "Next", "type": "article", "link": "https://example.com/next", "platform": "Blog"}
        ]"#;
        let set: BookmarkSet = serde_json::from_str(raw).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().unwrap().title, "Intro");
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn insert_keeps_first_metadata_for_same_link() {
        let mut set = BookmarkSet::new();
        assert!(set.insert(article("Intro")));
        assert!(!set.insert(article("Intro (renamed)")));

        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().title, "Intro");
    }

    #[test]
    fn toggle_matches_on_link_not_title() {
        let mut set = BookmarkSet::new();
        assert!(set.toggle(article("Intro")));
        assert!(!set.toggle(article("Intro (renamed)")));
        assert!(set.is_empty());
    }

    #[test]
    fn add_then_remove_restores_previous_contents() {
        let mut set = BookmarkSet::from_resources([
            Resource::new("A", "video", "https://a", "YouTube"),
            Resource::new("B", "course", "https://b", "Coursera").with_estimated_hours(4.0),
        ]);
        let before = set.clone();

        set.toggle(article("Intro"));
        set.toggle(article("Intro"));

        assert_eq!(set, before);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let json = serde_json::to_value(
            Resource::new("A", "video", "https://a", "YouTube").with_estimated_hours(1.5),
        )
        .unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["estimatedHours"], 1.5);
    }
}
