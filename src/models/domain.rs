// src/models/domain.rs

//! Domain and user-story data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DiscoveryConfig;
use crate::utils::url::domain_url;

/// A discoverable virtual-world location shown in the destinations list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    /// Display name (the place name)
    pub name: String,

    /// Address to visit, e.g. `hifi://place/1,2,3/0,0,0,1`
    pub url: String,

    /// Thumbnail image URL or local placeholder
    pub thumbnail: String,
}

/// Domain list from the last successful discovery pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainSnapshot {
    pub updated_at: DateTime<Utc>,
    pub domains: Vec<Domain>,
}

impl DomainSnapshot {
    pub fn new(domains: Vec<Domain>) -> Self {
        Self {
            updated_at: Utc::now(),
            domains,
        }
    }
}

/// Raw listing record as returned by the user-stories endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StoryRecord {
    pub id: u64,

    #[serde(default)]
    pub place_name: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// One page of the user-stories listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoryPage {
    #[serde(default)]
    pub status: String,

    #[serde(default = "first_page")]
    pub current_page: u32,

    #[serde(default = "first_page")]
    pub total_pages: u32,

    #[serde(default)]
    pub total_entries: u32,

    #[serde(default)]
    pub user_stories: Vec<StoryRecord>,
}

fn first_page() -> u32 {
    1
}

/// A story record enriched for client-side filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStory {
    pub id: u64,
    pub place_name: String,
    pub path: String,
    pub thumbnail_url: Option<String>,

    /// Uppercased place name used for text matching
    pub search_key: String,

    /// Whether the record also came back from the curated tag listing
    pub tag_match: bool,
}

impl From<StoryRecord> for UserStory {
    fn from(record: StoryRecord) -> Self {
        Self {
            search_key: record.place_name.to_uppercase(),
            id: record.id,
            place_name: record.place_name,
            path: record.path,
            thumbnail_url: record.thumbnail_url,
            tag_match: false,
        }
    }
}

impl UserStory {
    /// Whether every token occurs in the search key.
    ///
    /// An empty token list selects curated entries only.
    pub fn matches(&self, tokens: &[String]) -> bool {
        if tokens.is_empty() {
            return self.tag_match;
        }
        tokens.iter().all(|t| self.search_key.contains(t.as_str()))
    }

    /// Convert into a displayable domain, substituting the placeholder
    /// thumbnail when the record has none of its own.
    pub fn to_domain(&self, discovery: &DiscoveryConfig) -> Domain {
        let thumbnail = match self.thumbnail_url.as_deref().map(str::trim) {
            Some(url)
                if !url.is_empty()
                    && !discovery
                        .default_thumbnail_markers
                        .iter()
                        .any(|m| url.contains(m.as_str())) =>
            {
                url.to_string()
            }
            _ => discovery.placeholder_thumbnail.clone(),
        };

        Domain {
            name: self.place_name.clone(),
            url: domain_url(&self.place_name, &self.path),
            thumbnail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(name: &str, thumbnail: Option<&str>) -> UserStory {
        UserStory::from(StoryRecord {
            id: 7,
            place_name: name.to_string(),
            path: "/10,0,5/0,0,0,1".to_string(),
            thumbnail_url: thumbnail.map(str::to_string),
        })
    }

    #[test]
    fn test_search_key_is_uppercase() {
        assert_eq!(story("Foo Bar", None).search_key, "FOO BAR");
    }

    #[test]
    fn test_matches_all_tokens() {
        let s = story("Foo Bar", None);
        assert!(s.matches(&["FOO".into(), "BAR".into()]));
        assert!(!s.matches(&["FOO".into(), "ZZZ".into()]));
    }

    #[test]
    fn test_empty_tokens_need_tag() {
        let mut s = story("Foo Bar", None);
        assert!(!s.matches(&[]));
        s.tag_match = true;
        assert!(s.matches(&[]));
    }

    #[test]
    fn test_to_domain_keeps_custom_thumbnail() {
        let discovery = DiscoveryConfig::default();
        let domain = story("dev-welcome", Some("https://cdn.example.com/a.jpg")).to_domain(&discovery);
        assert_eq!(domain.url, "hifi://dev-welcome/10,0,5/0,0,0,1");
        assert_eq!(domain.thumbnail, "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn test_to_domain_replaces_stock_thumbnail() {
        let discovery = DiscoveryConfig::default();
        let stock = "https://metaverse.example.com/assets/places/thumbnail-default-place.jpg";
        assert_eq!(
            story("x", Some(stock)).to_domain(&discovery).thumbnail,
            discovery.placeholder_thumbnail
        );
        assert_eq!(
            story("x", None).to_domain(&discovery).thumbnail,
            discovery.placeholder_thumbnail
        );
    }

    #[test]
    fn test_page_defaults() {
        let page: StoryPage = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.user_stories.is_empty());
    }
}
