// Offset/limit pagination over list endpoints.
//
// The stream advances the offset by the number of items actually received,
// not by the requested limit -- servers may return short pages, and a naive
// `offset += limit` stride can skip or loop on them. Pages are fetched
// strictly sequentially (no read-ahead): each request depends on the prior
// page's observed count.
//
// Listings are eventually consistent: `total_count` may change between page
// fetches when items are added or removed server-side, and no attempt is
// made to reconcile pages into a snapshot.

use std::future::Future;

use async_stream::try_stream;
use futures_core::Stream;

use crate::error::Error;
use crate::types::Page;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: i32 = 25;

/// Lazily walk a paginated endpoint, yielding items across pages.
///
/// `fetch` is invoked as `fetch(offset, limit)` and must perform one page
/// request. The sequence is finite and forward-only: it terminates once a
/// page comes back empty or the offset reaches the reported total, whichever
/// happens first. An empty page is always terminal, never a retry signal.
/// Restart by calling the listing operation again -- that yields a fresh
/// cursor from offset 0.
///
/// Dropping the stream cancels the walk; items already yielded stay valid.
pub fn paginate<T, F, Fut>(limit: i32, fetch: F) -> impl Stream<Item = Result<T, Error>>
where
    F: Fn(i64, i32) -> Fut,
    Fut: Future<Output = Result<Page<T>, Error>>,
{
    try_stream! {
        let mut offset: i64 = 0;
        loop {
            let page = fetch(offset, limit).await?;
            let received = page.data.len();
            let total = page.total_count;

            for item in page.data {
                yield item;
            }

            if received == 0 {
                break;
            }
            offset += i64::try_from(received).unwrap_or(i64::MAX);
            if offset >= total {
                break;
            }
        }
    }
}

/// Collect every item of a paginated endpoint into a single `Vec`.
pub async fn collect_all<T, F, Fut>(limit: i32, fetch: F) -> Result<Vec<T>, Error>
where
    F: Fn(i64, i32) -> Fut,
    Fut: Future<Output = Result<Page<T>, Error>>,
{
    let mut all = Vec::new();
    let mut offset: i64 = 0;

    loop {
        let page = fetch(offset, limit).await?;
        let received = page.data.len();
        let total = page.total_count;
        all.extend(page.data);

        if received == 0 {
            break;
        }
        offset += i64::try_from(received).unwrap_or(i64::MAX);
        if offset >= total {
            break;
        }
    }

    Ok(all)
}
