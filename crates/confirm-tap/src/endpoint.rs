use serde::{Deserialize, Serialize};

/// One logical confirmation channel, matched by URL substring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRule {
    pub name: String,
    pub url_contains: String,
    /// Logical opposite for toggle actions (`like` <-> `unlike`).
    #[serde(default)]
    pub opposite: Option<String>,
}

impl EndpointRule {
    pub fn new(name: impl Into<String>, url_contains: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_contains: url_contains.into(),
            opposite: None,
        }
    }

    pub fn with_opposite(mut self, opposite: impl Into<String>) -> Self {
        self.opposite = Some(opposite.into());
        self
    }
}

/// Endpoints bound for one operation. Must be bound before the action runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSet {
    rules: Vec<EndpointRule>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule with the same name.
    pub fn with(mut self, rule: EndpointRule) -> Self {
        self.insert(rule);
        self
    }

    pub fn insert(&mut self, rule: EndpointRule) {
        match self.rules.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Two endpoints registered as each other's opposite.
    pub fn toggle_pair(
        self,
        on: (&str, &str),
        off: (&str, &str),
    ) -> Self {
        self.with(EndpointRule::new(on.0, on.1).with_opposite(off.0))
            .with(EndpointRule::new(off.0, off.1).with_opposite(on.0))
    }

    /// `like`/`unlike` pair.
    pub fn like_toggle(self, like_url: &str, unlike_url: &str) -> Self {
        self.toggle_pair(("like", like_url), ("unlike", unlike_url))
    }

    /// `collect`/`uncollect` pair.
    pub fn collect_toggle(self, collect_url: &str, uncollect_url: &str) -> Self {
        self.toggle_pair(("collect", collect_url), ("uncollect", uncollect_url))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[EndpointRule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&EndpointRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn opposite_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|r| r.opposite.as_deref())
    }

    /// Longest matching pattern wins, so `/unlike` beats `/like` when a
    /// URL happens to contain both.
    pub fn match_url(&self, url: &str) -> Option<&EndpointRule> {
        self.rules
            .iter()
            .filter(|r| !r.url_contains.is_empty() && url.contains(&r.url_contains))
            .max_by_key(|r| r.url_contains.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_pairs_point_at_each_other() {
        let set = EndpointSet::new()
            .like_toggle("/api/note/like", "/api/note/dislike")
            .collect_toggle("/api/collect", "/api/uncollect");
        assert_eq!(set.len(), 4);
        assert_eq!(set.opposite_of("like"), Some("unlike"));
        assert_eq!(set.opposite_of("uncollect"), Some("collect"));
        assert_eq!(set.opposite_of("search"), None);
    }

    #[test]
    fn longest_pattern_wins() {
        let set = EndpointSet::new()
            .with(EndpointRule::new("like", "/like"))
            .with(EndpointRule::new("unlike", "/like/cancel"));
        assert_eq!(
            set.match_url("https://x.test/api/like/cancel?id=1").map(|r| r.name.as_str()),
            Some("unlike")
        );
        assert_eq!(
            set.match_url("https://x.test/api/like?id=1").map(|r| r.name.as_str()),
            Some("like")
        );
        assert!(set.match_url("https://x.test/feed").is_none());
    }

    #[test]
    fn insert_replaces_by_name() {
        let set = EndpointSet::new()
            .with(EndpointRule::new("search", "/v1/search"))
            .with(EndpointRule::new("search", "/v2/search"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("search").unwrap().url_contains, "/v2/search");
    }
}
