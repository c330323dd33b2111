// src/fetch/pages.rs

use std::{collections::BTreeMap, error::Error, future::Future};

use futures::{stream::FuturesUnordered, StreamExt};
use tracing::{debug, error, warn};

use crate::error::FetchError;
use crate::model::{BoundaryPage, BoundaryRecord};

/// Above this many outstanding pages a `total_count` is suspicious.
pub const LARGE_FAN_OUT: usize = 1_000;

/// Offsets of the pages still missing after the first page came back.
fn remaining_offsets(total_count: usize, first_len: usize, page_size: usize) -> Vec<usize> {
    if first_len >= total_count {
        return Vec::new();
    }
    let remaining = (total_count - first_len).div_ceil(page_size);
    (0..remaining).map(|i| first_len + i * page_size).collect()
}

/// Collect every record of a paginated dataset.
///
/// Page 0 is fetched first to learn `total_count`; the remaining pages are
/// then requested all at once and stitched back together in offset order.
/// The first failing page aborts the whole aggregation.
pub async fn fetch_all_pages<F, Fut, E>(
    page_size: usize,
    fetch_page: F,
) -> Result<Vec<BoundaryRecord>, FetchError>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<BoundaryPage, E>>,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    let page_size = page_size.max(1);

    let first = fetch_page(0).await.map_err(|e| boundary_error(0, e))?;
    let total_count = first.total_count;
    let mut records = first.results;

    let offsets = remaining_offsets(total_count, records.len(), page_size);
    if offsets.is_empty() {
        debug!(total_count, fetched = records.len(), "single page");
        return Ok(records);
    }
    if offsets.len() > LARGE_FAN_OUT {
        warn!(
            total_count,
            page_size,
            pending = offsets.len(),
            "unusually large page fan-out"
        );
    }
    debug!(total_count, pages = offsets.len() + 1, "fetching remaining pages");

    let mut tasks: FuturesUnordered<_> = offsets
        .into_iter()
        .map(|offset| {
            let fut = fetch_page(offset);
            async move { (offset, fut.await) }
        })
        .collect();

    let mut pages: BTreeMap<usize, Vec<BoundaryRecord>> = BTreeMap::new();
    while let Some((offset, res)) = tasks.next().await {
        match res {
            Ok(page) => {
                pages.insert(offset, page.results);
            }
            Err(e) => {
                let err = boundary_error(offset, e);
                error!(offset, error = %err, "page failed, aborting");
                return Err(err);
            }
        }
    }

    for (_, page) in pages {
        records.extend(page);
    }
    debug!(total_count, fetched = records.len(), "all pages collected");
    Ok(records)
}

fn boundary_error<E: Into<Box<dyn Error + Send + Sync>>>(offset: usize, e: E) -> FetchError {
    FetchError::Boundary {
        offset,
        source: e.into(),
    }
}
