//! Cursor-driven collection fetcher.
//!
//! Large collections are read in batches of `batch_size`. After each batch
//! the resume cursor is replaced by the one the service returned; the
//! collection is exhausted once a batch comes back without a cursor.
//!
//! "No cursor" means two different things: before the first fetch it means
//! "start from the beginning", after it "nothing left". The fetch state keeps
//! an explicit `started` flag so an empty collection costs exactly one
//! round trip and never loops.

use futures::stream::{self, Stream, TryStreamExt};
use permission_audit_sdk::{PageCursor, PagedQuery, TreeNode};

use super::error::DomainError;
use super::remote::RemoteSession;

struct FetchState {
    query: PagedQuery,
    cursor: Option<PageCursor>,
    started: bool,
}

/// Stream the batches of `query`, one retried round trip per batch.
///
/// The stream is lazy and single-use.
pub fn fetch_pages<'a>(
    session: RemoteSession<'a>,
    query: PagedQuery,
) -> impl Stream<Item = Result<Vec<TreeNode>, DomainError>> + 'a {
    let state = FetchState {
        query,
        cursor: None,
        started: false,
    };

    stream::try_unfold(state, move |mut state| async move {
        if state.started && state.cursor.is_none() {
            return Ok::<_, DomainError>(None);
        }

        let page = session
            .call("fetch_page", |client, ctx| {
                client.fetch_page(ctx, &state.query, state.cursor.as_ref())
            })
            .await?;

        state.started = true;
        state.cursor = page.next_cursor;
        Ok(Some((page.items, state)))
    })
}

/// Stream every node of `query` in collection order.
pub fn fetch_all<'a>(
    session: RemoteSession<'a>,
    query: PagedQuery,
) -> impl Stream<Item = Result<TreeNode, DomainError>> + 'a {
    fetch_pages(session, query)
        .map_ok(|batch| stream::iter(batch.into_iter().map(Ok::<TreeNode, DomainError>)))
        .try_flatten()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::pin::pin;

    use futures::TryStreamExt;
    use permission_audit_sdk::{NodeId, RecordFilter, SessionContext};
    use static_content_plugin::Service;

    use super::*;
    use crate::domain::retry::RetryPolicy;
    use crate::test_support::{SITE, folders, site_with_list};

    fn ctx() -> SessionContext {
        SessionContext::builder().site_url(SITE).build()
    }

    async fn collect_titles(service: &Service, batch: u32) -> Vec<String> {
        let ctx = ctx();
        let retry = RetryPolicy::default();
        let session = RemoteSession::new(service, &ctx, &retry);
        let query = PagedQuery::items(&NodeId::new("list-docs"), RecordFilter::FoldersOnly, batch);

        fetch_all(session, query)
            .map_ok(|node| node.title)
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn yields_every_item_across_batches_in_order() {
        let service = Service::from_config(&site_with_list(folders(1..=1234)));

        let titles = collect_titles(&service, 500).await;

        assert_eq!(titles.len(), 1234);
        assert_eq!(titles.first().map(String::as_str), Some("Folder 1"));
        assert_eq!(titles.last().map(String::as_str), Some("Folder 1234"));
        // ceil(1234 / 500)
        assert_eq!(service.request_count("fetch_page"), 3);
    }

    #[tokio::test]
    async fn exact_multiple_needs_no_extra_fetch() {
        let service = Service::from_config(&site_with_list(folders(1..=1000)));

        let titles = collect_titles(&service, 500).await;

        assert_eq!(titles.len(), 1000);
        assert_eq!(service.request_count("fetch_page"), 2);
    }

    #[tokio::test]
    async fn empty_collection_costs_one_fetch() {
        let service = Service::from_config(&site_with_list(Vec::new()));

        let titles = collect_titles(&service, 500).await;

        assert!(titles.is_empty());
        assert_eq!(service.request_count("fetch_page"), 1);
    }

    #[tokio::test]
    async fn pages_are_exposed_as_batches() {
        let service = Service::from_config(&site_with_list(folders(1..=7)));
        let ctx = ctx();
        let retry = RetryPolicy::default();
        let session = RemoteSession::new(&service, &ctx, &retry);
        let query = PagedQuery::items(&NodeId::new("list-docs"), RecordFilter::FoldersOnly, 3);

        let sizes: Vec<usize> = fetch_pages(session, query)
            .map_ok(|batch| batch.len())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_batches_are_refetched_from_the_same_cursor() {
        let mut cfg = site_with_list(folders(1..=10));
        cfg.throttle_every_n_calls = Some(2);
        let service = Service::from_config(&cfg);

        let titles = collect_titles(&service, 4).await;

        assert_eq!(titles.len(), 10);
        let expected: Vec<String> = (1..=10).map(|i| format!("Folder {i}")).collect();
        assert_eq!(titles, expected);
        // 3 successful batches, each preceded or followed by a throttled retry.
        let requests = service.requests();
        assert_eq!(requests.iter().filter(|r| !r.throttled).count(), 3);
        assert!(requests.iter().any(|r| r.throttled));
    }

    #[tokio::test]
    async fn fatal_error_ends_the_stream() {
        let service = Service::from_config(&site_with_list(folders(1..=3)));
        let ctx = ctx();
        let retry = RetryPolicy::default();
        let session = RemoteSession::new(&service, &ctx, &retry);
        let query = PagedQuery::items(&NodeId::new("missing"), RecordFilter::FoldersOnly, 2);

        let mut stream = pin!(fetch_all(session, query));
        let first = stream.try_next().await;

        assert!(matches!(first, Err(DomainError::Remote { .. })));
    }
}
