// src/pipeline/discovery.rs

//! Domain discovery pipeline.
//!
//! Fetches the listing once, then answers every later query from the
//! fetched set until a refresh is forced.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{DiscoveryConfig, DiscoveryOutcome, Domain, UserStory};
use crate::pipeline::cache::DomainCache;
use crate::pipeline::filter::build_domains;
use crate::services::DomainProvider;

/// Drives the provider, filters its records and keeps the shared cache current.
pub struct DomainDiscovery {
    provider: DomainProvider,
    cache: Arc<DomainCache>,
    discovery: DiscoveryConfig,
    stories: Option<Vec<UserStory>>,
    last_location: Option<String>,
}

impl DomainDiscovery {
    pub fn new(provider: DomainProvider, cache: Arc<DomainCache>, discovery: &DiscoveryConfig) -> Self {
        Self {
            provider,
            cache,
            discovery: discovery.clone(),
            stories: None,
            last_location: None,
        }
    }

    /// Address shown as the first entry of an unfiltered list.
    pub fn set_last_location(&mut self, location: Option<String>) {
        self.last_location = location.filter(|l| !l.trim().is_empty());
    }

    /// Domains from the previous successful pass, for instant display.
    pub async fn cached(&self) -> Vec<Domain> {
        self.cache.domains().await
    }

    /// Whether a listing has been fetched in this instance.
    pub fn has_stories(&self) -> bool {
        self.stories.is_some()
    }

    /// Return the domains matching `filter`.
    ///
    /// The network is only used for the first call or when `force_refresh`
    /// is set. A failed fetch keeps the previous records and cache intact.
    pub async fn retrieve(&mut self, filter: &str, force_refresh: bool) -> Result<DiscoveryOutcome> {
        let mut pass_generation = None;

        if force_refresh || self.stories.is_none() {
            let generation = self.cache.generation().await;
            match self.provider.fetch_all().await {
                Ok(stories) => {
                    log::info!("Fetched {} domains from the directory", stories.len());
                    self.stories = Some(stories);
                    pass_generation = Some(generation);
                }
                Err(error) => {
                    log::error!("Domain discovery failed: {}", error);
                    return Err(error);
                }
            }
        }

        let stories = self.stories.as_deref().unwrap_or_default();
        let domains = build_domains(
            stories,
            filter,
            self.last_location.as_deref(),
            &self.discovery,
        );

        // The cache always holds the unfiltered view, whatever query started the pass
        if let Some(generation) = pass_generation {
            let curated = if filter.trim().is_empty() {
                domains.clone()
            } else {
                build_domains(stories, "", self.last_location.as_deref(), &self.discovery)
            };
            if !self.cache.store_if_current(generation, curated).await {
                log::debug!("Discarding stale discovery result");
            }
        }

        log::debug!("Filter {:?} matched {} domains", filter, domains.len());
        Ok(DiscoveryOutcome {
            domains,
            fetched: pass_generation.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::services::domains::tests::{FakeStories, record};

    fn discovery(api: Arc<FakeStories>, cache: Arc<DomainCache>) -> DomainDiscovery {
        let config = Config::default();
        DomainDiscovery::new(DomainProvider::new(api, &config), cache, &config.discovery)
    }

    fn fake() -> Arc<FakeStories> {
        Arc::new(FakeStories::new(
            vec![record(1, "Foo Bar"), record(2, "Foobar"), record(3, "sandbox")],
            vec![record(3, "sandbox")],
        ))
    }

    fn names(outcome: &DiscoveryOutcome) -> Vec<&str> {
        outcome.domains.iter().map(|d| d.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_refilter_reuses_records() {
        let api = fake();
        let mut discovery = discovery(Arc::clone(&api), Arc::new(DomainCache::new()));

        let first = discovery.retrieve("bar", false).await.unwrap();
        let calls = api.call_count();
        let second = discovery.retrieve("foo bar", false).await.unwrap();
        let third = discovery.retrieve("zzz", false).await.unwrap();

        assert!(first.fetched);
        assert!(!second.fetched);
        assert_eq!(api.call_count(), calls);
        assert_eq!(names(&first), ["Foo Bar", "Foobar"]);
        assert_eq!(names(&second), ["Foo Bar", "Foobar"]);
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_force_refresh_hits_network() {
        let api = fake();
        let mut discovery = discovery(Arc::clone(&api), Arc::new(DomainCache::new()));

        discovery.retrieve("", false).await.unwrap();
        let calls = api.call_count();
        let outcome = discovery.retrieve("", true).await.unwrap();

        assert!(outcome.fetched);
        assert!(api.call_count() > calls);
    }

    #[tokio::test]
    async fn test_empty_query_shows_last_location_then_curated() {
        let cache = Arc::new(DomainCache::new());
        let mut discovery = discovery(fake(), Arc::clone(&cache));
        discovery.set_last_location(Some("hifi://sandbox/5,5,5".into()));

        let outcome = discovery.retrieve("", false).await.unwrap();

        assert_eq!(names(&outcome), ["Your last location", "sandbox"]);
        assert_eq!(cache.domains().await, outcome.domains);
    }

    #[tokio::test]
    async fn test_filtered_fetch_caches_curated_list() {
        let cache = Arc::new(DomainCache::new());
        let mut discovery = discovery(fake(), Arc::clone(&cache));

        let outcome = discovery.retrieve("zzz", false).await.unwrap();

        assert!(outcome.is_empty());
        let cached: Vec<_> = cache.domains().await.into_iter().map(|d| d.name).collect();
        assert_eq!(cached, ["sandbox"]);

        discovery.retrieve("foo", false).await.unwrap();
        assert_eq!(cache.domains().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_cache() {
        let cache = Arc::new(DomainCache::new());
        let mut good = discovery(fake(), Arc::clone(&cache));
        let before = good.retrieve("", false).await.unwrap();

        let mut failing = FakeStories::new(vec![record(9, "x")], vec![]);
        failing.fail_page = Some(1);
        let mut bad = discovery(Arc::new(failing), Arc::clone(&cache));

        assert!(bad.retrieve("", false).await.is_err());
        assert!(!bad.has_stories());
        assert_eq!(bad.cached().await, before.domains);
    }
}
