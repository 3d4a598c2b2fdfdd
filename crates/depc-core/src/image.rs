//! Image resolution
//!
//! Maps the caller's image request (explicit id, or repository+tag
//! substrings) onto exactly one image known to the daemon.

use crate::deadline::bounded;
use crate::{CoreError, Result};
use depc_config::ImageQuery;
use depc_provider::{ContainerProvider, ImageId, ImageSummary};
use std::time::Duration;

/// The image a run was resolved against; immutable once produced
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub id: ImageId,
    /// The `repository:tag` label that matched, when resolved by repo/tag
    pub repo_tag: Option<String>,
    pub created: i64,
}

/// Resolve the query against the daemon's image list
pub async fn resolve(
    provider: &dyn ContainerProvider,
    query: &ImageQuery,
    limit: Duration,
) -> Result<ResolvedImage> {
    let images = bounded("list_images", limit, provider.list_images()).await?;
    select(&images, query).ok_or_else(|| CoreError::ImageNotFound(query.to_string()))
}

/// Pick the image matching the query, or None.
///
/// Explicit ids match by substring and take the first hit. Repository/tag
/// queries match both parts by substring; when several images qualify the
/// most recently created one wins, ties broken by the lexicographically
/// greatest matching tag, so the result does not depend on enumeration order.
pub fn select(images: &[ImageSummary], query: &ImageQuery) -> Option<ResolvedImage> {
    match query {
        ImageQuery::Id(id) => images.iter().find(|i| i.id.0.contains(id.as_str())).map(|i| {
            ResolvedImage {
                id: i.id.clone(),
                repo_tag: None,
                created: i.created,
            }
        }),
        ImageQuery::RepoTag { repository, tag } => {
            let mut candidates: Vec<(&ImageSummary, &str)> = Vec::new();
            for image in images {
                for label in &image.repo_tags {
                    let Some((repo_part, tag_part)) = label.rsplit_once(':') else {
                        continue;
                    };
                    if repo_part.contains(repository.as_str()) && tag_part.contains(tag.as_str()) {
                        candidates.push((image, label.as_str()));
                    }
                }
            }
            candidates
                .into_iter()
                .max_by(|(a, la), (b, lb)| a.created.cmp(&b.created).then(la.cmp(lb)))
                .map(|(image, label)| ResolvedImage {
                    id: image.id.clone(),
                    repo_tag: Some(label.to_string()),
                    created: image.created,
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, tags: &[&str], created: i64) -> ImageSummary {
        ImageSummary {
            id: ImageId::new(id),
            repo_tags: tags.iter().map(|t| t.to_string()).collect(),
            created,
        }
    }

    #[test]
    fn test_explicit_id_substring_match() {
        let images = vec![
            image("sha256:aaa111", &["other:latest"], 10),
            image("sha256:bbb222", &["deployer:latest"], 20),
        ];
        let query = ImageQuery::Id("bbb".to_string());
        let resolved = select(&images, &query).unwrap();
        assert_eq!(resolved.id.0, "sha256:bbb222");
        assert!(resolved.repo_tag.is_none());
    }

    #[test]
    fn test_repo_tag_substring_match() {
        let images = vec![image(
            "sha256:ccc333",
            &["compute-deployer_dev_walter:latest"],
            30,
        )];
        let query = ImageQuery::RepoTag {
            repository: "deployer_dev".to_string(),
            tag: "late".to_string(),
        };
        let resolved = select(&images, &query).unwrap();
        assert_eq!(resolved.id.0, "sha256:ccc333");
        assert_eq!(
            resolved.repo_tag.as_deref(),
            Some("compute-deployer_dev_walter:latest")
        );
    }

    #[test]
    fn test_multiple_matches_prefer_most_recent() {
        let images = vec![
            image("sha256:old", &["deployer:latest"], 10),
            image("sha256:new", &["deployer:latest"], 99),
            image("sha256:mid", &["deployer:latest"], 50),
        ];
        let query = ImageQuery::RepoTag {
            repository: "deployer".to_string(),
            tag: "latest".to_string(),
        };
        let resolved = select(&images, &query).unwrap();
        assert_eq!(resolved.id.0, "sha256:new");
    }

    #[test]
    fn test_created_tie_breaks_on_tag() {
        let images = vec![
            image("sha256:a", &["deployer:v1"], 40),
            image("sha256:b", &["deployer:v2"], 40),
        ];
        let query = ImageQuery::RepoTag {
            repository: "deployer".to_string(),
            tag: "v".to_string(),
        };
        let resolved = select(&images, &query).unwrap();
        assert_eq!(resolved.id.0, "sha256:b");
    }

    #[test]
    fn test_selection_is_order_independent() {
        let mut images = vec![
            image("sha256:a", &["deployer:v1"], 40),
            image("sha256:b", &["deployer:v2"], 40),
            image("sha256:c", &["deployer:v0"], 35),
        ];
        let query = ImageQuery::RepoTag {
            repository: "deployer".to_string(),
            tag: "v".to_string(),
        };
        let forward = select(&images, &query).unwrap();
        images.reverse();
        let backward = select(&images, &query).unwrap();
        assert_eq!(forward.id, backward.id);
    }

    #[test]
    fn test_no_match_is_none() {
        let images = vec![image("sha256:a", &["other:latest"], 1)];
        let query = ImageQuery::RepoTag {
            repository: "deployer".to_string(),
            tag: "latest".to_string(),
        };
        assert!(select(&images, &query).is_none());
    }

    #[test]
    fn test_untagged_labels_are_skipped() {
        let images = vec![image("sha256:a", &["<none>"], 1)];
        let query = ImageQuery::RepoTag {
            repository: "none".to_string(),
            tag: String::new(),
        };
        assert!(select(&images, &query).is_none());
    }
}
