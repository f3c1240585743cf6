//! Emptying buckets before deletion
//!
//! A bucket can only be deleted once it holds no current objects, no
//! noncurrent versions and no delete markers. Each [`DrainStrategy`] walks
//! one listing API to exhaustion and batch-deletes what it finds.

use crate::aws::{BucketOperations, ListingPage, ObjectRef, PageCursor};
use anyhow::Result;
use tracing::debug;

/// DeleteObjects accepts at most this many keys per request
pub const MAX_DELETE_BATCH: usize = 1000;

/// One way of enumerating bucket contents for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStrategy {
    /// Every object version and delete marker, deleted by key + version id
    AllVersions,
    /// Current objects only, deleted by key
    CurrentObjects,
}

impl DrainStrategy {
    /// Both passes, versions first. The second pass is a no-op on a bucket
    /// the first one already emptied.
    pub const DEFAULT_ORDER: [DrainStrategy; 2] =
        [DrainStrategy::AllVersions, DrainStrategy::CurrentObjects];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrainStrategy::AllVersions => "all-versions",
            DrainStrategy::CurrentObjects => "current-objects",
        }
    }

    async fn list_page<O: BucketOperations>(
        &self,
        ops: &O,
        bucket: &str,
        cursor: Option<PageCursor>,
    ) -> Result<ListingPage> {
        match self {
            DrainStrategy::AllVersions => ops.list_object_versions(bucket, cursor).await,
            DrainStrategy::CurrentObjects => ops.list_objects(bucket, cursor).await,
        }
    }
}

/// What a drain removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub pages: usize,
    pub objects: usize,
    pub delete_markers: usize,
}

impl std::ops::AddAssign for DrainReport {
    fn add_assign(&mut self, other: Self) {
        self.pages += other.pages;
        self.objects += other.objects;
        self.delete_markers += other.delete_markers;
    }
}

/// Delete everything `strategy` can see in `bucket`, page by page.
///
/// Stops at the first listing or deletion error.
pub async fn drain_bucket<O: BucketOperations>(
    ops: &O,
    bucket: &str,
    strategy: DrainStrategy,
) -> Result<DrainReport> {
    let mut report = DrainReport::default();
    let mut cursor = None;

    loop {
        let page = strategy.list_page(ops, bucket, cursor.take()).await?;
        report.pages += 1;
        report.objects += page.objects.len();
        report.delete_markers += page.delete_markers.len();

        let doomed: Vec<ObjectRef> = page
            .objects
            .into_iter()
            .chain(page.delete_markers)
            .collect();

        debug!(
            bucket = %bucket,
            strategy = strategy.as_str(),
            page = report.pages,
            count = doomed.len(),
            "Draining page"
        );

        for batch in doomed.chunks(MAX_DELETE_BATCH) {
            ops.delete_objects(bucket, batch.to_vec()).await?;
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockBucketOperations;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn versions_cursor(key: &str) -> PageCursor {
        PageCursor::Versions {
            key_marker: key.to_string(),
            version_id_marker: Some("v".to_string()),
        }
    }

    #[tokio::test]
    async fn drains_versions_and_markers_across_pages() {
        let mut ops = MockBucketOperations::new();
        let mut seq = Sequence::new();

        ops.expect_list_object_versions()
            .with(eq("b"), eq(None::<PageCursor>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ListingPage {
                    objects: vec![ObjectRef::versioned("a", "1"), ObjectRef::versioned("a", "2")],
                    delete_markers: vec![ObjectRef::versioned("gone", "3")],
                    next: Some(versions_cursor("a")),
                })
            });
        ops.expect_delete_objects()
            .withf(|b, objs| {
                b == "b"
                    && objs
                        == &vec![
                            ObjectRef::versioned("a", "1"),
                            ObjectRef::versioned("a", "2"),
                            ObjectRef::versioned("gone", "3"),
                        ]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        ops.expect_list_object_versions()
            .with(eq("b"), eq(Some(versions_cursor("a"))))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ListingPage {
                    objects: vec![ObjectRef::versioned("z", "9")],
                    delete_markers: vec![],
                    next: None,
                })
            });
        ops.expect_delete_objects()
            .withf(|_, objs| objs == &vec![ObjectRef::versioned("z", "9")])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let report = drain_bucket(&ops, "b", DrainStrategy::AllVersions)
            .await
            .unwrap();
        assert_eq!(
            report,
            DrainReport {
                pages: 2,
                objects: 3,
                delete_markers: 1
            }
        );
    }

    #[tokio::test]
    async fn empty_bucket_makes_no_delete_calls() {
        let mut ops = MockBucketOperations::new();
        ops.expect_list_objects()
            .times(1)
            .returning(|_, _| Ok(ListingPage::default()));
        ops.expect_delete_objects().never();

        let report = drain_bucket(&ops, "b", DrainStrategy::CurrentObjects)
            .await
            .unwrap();
        assert_eq!(report, DrainReport { pages: 1, objects: 0, delete_markers: 0 });
    }

    #[tokio::test]
    async fn current_objects_follow_continuation_tokens() {
        let mut ops = MockBucketOperations::new();
        ops.expect_list_objects()
            .with(eq("b"), eq(None::<PageCursor>))
            .times(1)
            .returning(|_, _| {
                Ok(ListingPage {
                    objects: vec![ObjectRef::current("k1")],
                    delete_markers: vec![],
                    next: Some(PageCursor::Continuation("t1".to_string())),
                })
            });
        ops.expect_list_objects()
            .with(eq("b"), eq(Some(PageCursor::Continuation("t1".to_string()))))
            .times(1)
            .returning(|_, _| {
                Ok(ListingPage {
                    objects: vec![ObjectRef::current("k2")],
                    delete_markers: vec![],
                    next: None,
                })
            });
        ops.expect_delete_objects()
            .times(2)
            .returning(|_, objs| {
                assert!(objs.iter().all(|o| o.version_id.is_none()));
                Ok(())
            });

        let report = drain_bucket(&ops, "b", DrainStrategy::CurrentObjects)
            .await
            .unwrap();
        assert_eq!(report.objects, 2);
    }

    #[tokio::test]
    async fn large_pages_are_split_into_batches() {
        let mut ops = MockBucketOperations::new();
        ops.expect_list_object_versions().times(1).returning(|_, _| {
            Ok(ListingPage {
                objects: (0..1500)
                    .map(|i| ObjectRef::versioned(format!("k{i}"), "v"))
                    .collect(),
                delete_markers: vec![],
                next: None,
            })
        });
        let mut seq = Sequence::new();
        ops.expect_delete_objects()
            .withf(|_, objs| objs.len() == MAX_DELETE_BATCH)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        ops.expect_delete_objects()
            .withf(|_, objs| objs.len() == 500)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        drain_bucket(&ops, "b", DrainStrategy::AllVersions)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_failure_stops_the_drain() {
        let mut ops = MockBucketOperations::new();
        ops.expect_list_object_versions().times(1).returning(|_, _| {
            Ok(ListingPage {
                objects: vec![ObjectRef::versioned("a", "1")],
                delete_markers: vec![],
                next: Some(versions_cursor("a")),
            })
        });
        ops.expect_delete_objects()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("AccessDenied")));

        let err = drain_bucket(&ops, "b", DrainStrategy::AllVersions)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("AccessDenied"));
    }
}
