// src/services/domains.rs

//! Domain listing provider.
//!
//! Pages through the user-stories endpoint and returns every record of a
//! pass, with curated (tag-matched) entries flagged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::models::{Config, DiscoveryConfig, StoryRecord, UserStory};
use crate::services::api::{StoriesApi, StoryQuery};

/// Service fetching the full domain listing.
pub struct DomainProvider {
    api: Arc<dyn StoriesApi>,
    discovery: DiscoveryConfig,
    request_delay: Duration,
}

impl DomainProvider {
    /// Create a new provider with the given configuration.
    pub fn new(api: Arc<dyn StoriesApi>, config: &Config) -> Self {
        Self {
            api,
            discovery: config.discovery.clone(),
            request_delay: Duration::from_millis(config.api.request_delay_ms),
        }
    }

    /// Fetch the open listing and the curated tag listing, then merge them.
    ///
    /// Both passes must complete; a failed page on either aborts the whole fetch.
    pub async fn fetch_all(&self) -> Result<Vec<UserStory>> {
        let tags = self.discovery.tags_param();
        let (all, tagged) = futures::try_join!(self.paginate(None), self.paginate(Some(tags)))?;

        log::debug!(
            "Fetched {} stories ({} tagged)",
            all.len(),
            tagged.len()
        );
        Ok(merge_tagged(all, tagged))
    }

    /// Fetch pages sequentially until the listing or the page cap runs out.
    async fn paginate(&self, tags: Option<String>) -> Result<Vec<StoryRecord>> {
        let cap = self.discovery.page_cap.max(1);
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let query = self.query(tags.clone(), page);
            let result = match self.api.user_stories(&query).await {
                Ok(result) => result,
                Err(error) => {
                    log::warn!(
                        "Failed to fetch stories page {} (tags: {:?}): {}",
                        page,
                        tags,
                        error
                    );
                    return Err(error);
                }
            };

            records.extend(result.user_stories);

            if page >= result.total_pages || page >= cap {
                if page < result.total_pages {
                    log::debug!(
                        "Stopped at page cap {} of {} pages",
                        cap,
                        result.total_pages
                    );
                }
                break;
            }
            page += 1;

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        Ok(records)
    }

    fn query(&self, tags: Option<String>, page: u32) -> StoryQuery {
        StoryQuery {
            include_actions: self.discovery.include_actions.clone(),
            restriction: self.discovery.restriction.clone(),
            require_online: self.discovery.require_online,
            protocol: self.discovery.protocol.clone(),
            tags,
            page,
        }
    }
}

/// Merge the curated listing into the full one.
///
/// Records keep first-seen order and duplicate ids collapse; curated records
/// missing from the full listing are appended.
pub fn merge_tagged(all: Vec<StoryRecord>, tagged: Vec<StoryRecord>) -> Vec<UserStory> {
    let mut stories: Vec<UserStory> = Vec::with_capacity(all.len());
    let mut index: HashMap<u64, usize> = HashMap::new();

    for record in all {
        if !index.contains_key(&record.id) {
            index.insert(record.id, stories.len());
            stories.push(UserStory::from(record));
        }
    }

    for record in tagged {
        match index.get(&record.id) {
            Some(&i) => stories[i].tag_match = true,
            None => {
                index.insert(record.id, stories.len());
                let mut story = UserStory::from(record);
                story.tag_match = true;
                stories.push(story);
            }
        }
    }

    stories
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::StoryPage;

    pub(crate) fn record(id: u64, name: &str) -> StoryRecord {
        StoryRecord {
            id,
            place_name: name.to_string(),
            path: "/0,0,0/0,0,0,1".to_string(),
            thumbnail_url: None,
        }
    }

    /// In-memory listing split into pages of two.
    pub(crate) struct FakeStories {
        pub all: Vec<StoryRecord>,
        pub tagged: Vec<StoryRecord>,
        pub fail_page: Option<u32>,
        pub calls: Mutex<Vec<StoryQuery>>,
    }

    impl FakeStories {
        pub(crate) fn new(all: Vec<StoryRecord>, tagged: Vec<StoryRecord>) -> Self {
            Self {
                all,
                tagged,
                fail_page: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StoriesApi for FakeStories {
        async fn user_stories(&self, query: &StoryQuery) -> Result<StoryPage> {
            self.calls.lock().unwrap().push(query.clone());
            if query.tags.is_none() && self.fail_page == Some(query.page) {
                return Err(AppError::Status {
                    status: 500,
                    url: "fake".into(),
                });
            }

            let source = if query.tags.is_some() { &self.tagged } else { &self.all };
            let chunks: Vec<_> = source.chunks(2).collect();
            let total_pages = chunks.len().max(1) as u32;
            let user_stories = chunks
                .get(query.page as usize - 1)
                .map(|c| c.to_vec())
                .unwrap_or_default();

            Ok(StoryPage {
                status: "success".into(),
                current_page: query.page,
                total_pages,
                total_entries: source.len() as u32,
                user_stories,
            })
        }
    }

    fn provider(api: Arc<FakeStories>, page_cap: u32) -> DomainProvider {
        let mut config = Config::default();
        config.discovery.page_cap = page_cap;
        DomainProvider::new(api, &config)
    }

    #[tokio::test]
    async fn test_fetches_every_page() {
        let all: Vec<_> = (1..=5).map(|i| record(i, &format!("place{i}"))).collect();
        let api = Arc::new(FakeStories::new(all, vec![record(2, "place2")]));

        let stories = provider(Arc::clone(&api), 10).fetch_all().await.unwrap();

        assert_eq!(stories.len(), 5);
        let untagged_pages = api
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.tags.is_none())
            .count();
        assert_eq!(untagged_pages, 3);
        assert!(stories.iter().find(|s| s.id == 2).unwrap().tag_match);
        assert!(!stories.iter().find(|s| s.id == 1).unwrap().tag_match);
    }

    #[tokio::test]
    async fn test_stops_at_page_cap() {
        let all: Vec<_> = (1..=10).map(|i| record(i, "p")).collect();
        let api = Arc::new(FakeStories::new(all, vec![]));

        let stories = provider(Arc::clone(&api), 2).fetch_all().await.unwrap();

        assert_eq!(stories.len(), 4);
    }

    #[tokio::test]
    async fn test_page_failure_aborts_pass() {
        let all: Vec<_> = (1..=6).map(|i| record(i, "p")).collect();
        let mut fake = FakeStories::new(all, vec![]);
        fake.fail_page = Some(2);
        let api = Arc::new(fake);

        let result = provider(Arc::clone(&api), 10).fetch_all().await;

        assert!(matches!(result, Err(AppError::Status { status: 500, .. })));
        let pages: Vec<u32> = api
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.tags.is_none())
            .map(|q| q.page)
            .collect();
        assert_eq!(pages, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_tag_pass_sends_tags() {
        let api = Arc::new(FakeStories::new(vec![record(1, "a")], vec![]));
        provider(Arc::clone(&api), 10).fetch_all().await.unwrap();

        let tagged: Vec<_> = api
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|q| q.tags.clone())
            .collect();
        assert_eq!(tagged, vec!["mobile".to_string()]);
    }

    #[test]
    fn test_merge_dedupes_and_appends_tagged() {
        let merged = merge_tagged(
            vec![record(1, "a"), record(2, "b"), record(1, "a again")],
            vec![record(3, "c"), record(2, "b")],
        );
        let ids: Vec<u64> = merged.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(merged[0].place_name, "a");
        assert!(!merged[0].tag_match);
        assert!(merged[1].tag_match);
        assert!(merged[2].tag_match);
    }
}
