//! Branch lookup for build-tag autocomplete
//!
//! Fetches the firmware repository's branch list from the GitHub API,
//! caches it for ten minutes in the injected TTL cache, and ranks branches
//! against the user's partial input. Each suggestion carries the 6-char
//! commit sha as its value, which is exactly what the build-tag validator
//! accepts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::config::GithubConfig;
use crate::discord::AutocompleteChoice;

/// How long the branch list stays cached.
const BRANCH_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Cache key for the branch list.
const BRANCH_CACHE_KEY: &str = "branches";

/// Discord caps autocomplete responses at 25 choices.
const MAX_CHOICES: usize = 25;

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: BranchCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
}

/// Branch lookup with a time-bounded cache.
pub struct BranchService {
    config: GithubConfig,
    cache: Arc<TtlCache<Vec<Branch>>>,
    http_client: reqwest::Client,
}

impl BranchService {
    pub fn new(config: GithubConfig, cache: Arc<TtlCache<Vec<Branch>>>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            config,
            cache,
            http_client,
        })
    }

    /// Branch list, from cache when live, otherwise from the API.
    pub async fn list_branches(&self) -> Result<Vec<Branch>> {
        if let Some(branches) = self.cache.get(BRANCH_CACHE_KEY).await {
            debug!("branch cache hit ({} branches)", branches.len());
            return Ok(branches);
        }

        info!("repopulating github branch cache");
        let url = format!(
            "{}/repos/{}/{}/branches",
            self.config.api_base, self.config.owner, self.config.repo
        );
        let response = self
            .http_client
            .get(&url)
            .header("User-Agent", "pumpzero-bot")
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .context("Failed to connect to GitHub API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("GitHub branch list failed ({}): {}", status, body);
        }

        let branches: Vec<Branch> = response
            .json()
            .await
            .context("Failed to parse GitHub response")?;
        self.cache
            .set(BRANCH_CACHE_KEY, branches.clone(), BRANCH_CACHE_TTL)
            .await;
        Ok(branches)
    }

    /// Autocomplete choices for a partial build input.
    pub async fn autocomplete(&self, focused: &str) -> Result<Vec<AutocompleteChoice>> {
        let branches = self.list_branches().await?;
        Ok(rank_branches(&branches, focused)
            .into_iter()
            .take(MAX_CHOICES)
            .map(|branch| {
                let sha6: String = branch.commit.sha.chars().take(6).collect();
                AutocompleteChoice {
                    name: format!("{} - latest {}", sha6, branch.name),
                    value: sha6,
                }
            })
            .collect())
    }
}

/// Order branches by match quality against `query`; empty query keeps the
/// API order, non-matching branches are dropped.
fn rank_branches<'a>(branches: &'a [Branch], query: &str) -> Vec<&'a Branch> {
    if query.is_empty() {
        return branches.iter().collect();
    }
    let mut scored: Vec<(u32, &Branch)> = branches
        .iter()
        .filter_map(|b| fuzzy_score(query, &b.name).map(|score| (score, b)))
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
    scored.into_iter().map(|(_, b)| b).collect()
}

/// Lower score is a better match. Direct substring hits rank by position;
/// otherwise the query must appear as a subsequence and accumulated gaps
/// (offset past the substring range) count against it.
fn fuzzy_score(query: &str, candidate: &str) -> Option<u32> {
    let query = query.to_lowercase();
    let candidate = candidate.to_lowercase();

    if let Some(pos) = candidate.find(&query) {
        return Some(pos as u32);
    }

    let mut score = candidate.len() as u32;
    let mut chars = candidate.chars();
    for qc in query.chars() {
        loop {
            match chars.next() {
                Some(cc) if cc == qc => break,
                Some(_) => score += 1,
                None => return None,
            }
        }
    }
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(name: &str, sha: &str) -> Branch {
        Branch {
            name: name.to_string(),
            commit: BranchCommit {
                sha: sha.to_string(),
            },
        }
    }

    fn branches() -> Vec<Branch> {
        vec![
            branch("main", "deadbeef0000"),
            branch("release/3.0", "cafe00112233"),
            branch("feature/predictive-scale", "abc123456789"),
            branch("fix/pump-zero-drift", "0123456789ab"),
        ]
    }

    #[test]
    fn test_empty_query_keeps_api_order() {
        let all = branches();
        let ranked = rank_branches(&all, "");
        let names: Vec<&str> = ranked.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["main", "release/3.0", "feature/predictive-scale", "fix/pump-zero-drift"]);
    }

    #[test]
    fn test_substring_match_outranks_subsequence() {
        let all = branches();
        let ranked = rank_branches(&all, "pump");
        assert_eq!(ranked[0].name, "fix/pump-zero-drift");
    }

    #[test]
    fn test_non_matching_branches_dropped() {
        let all = branches();
        let ranked = rank_branches(&all, "zzz");
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_fuzzy_subsequence_matches() {
        assert!(fuzzy_score("fps", "feature/predictive-scale").is_some());
        assert!(fuzzy_score("MAIN", "main").is_some());
        assert_eq!(fuzzy_score("main", "main"), Some(0));
    }

    #[tokio::test]
    async fn test_autocomplete_uses_cached_branches() {
        let cache = Arc::new(TtlCache::new());
        cache
            .set(BRANCH_CACHE_KEY, branches(), Duration::from_secs(60))
            .await;
        let service = BranchService::new(GithubConfig::default(), cache).unwrap();

        let choices = service.autocomplete("main").await.unwrap();
        assert_eq!(choices[0].value, "deadbe");
        assert_eq!(choices[0].name, "deadbe - latest main");
    }

    #[tokio::test]
    async fn test_autocomplete_empty_input_lists_all() {
        let cache = Arc::new(TtlCache::new());
        cache
            .set(BRANCH_CACHE_KEY, branches(), Duration::from_secs(60))
            .await;
        let service = BranchService::new(GithubConfig::default(), cache).unwrap();

        let choices = service.autocomplete("").await.unwrap();
        assert_eq!(choices.len(), 4);
    }
}
