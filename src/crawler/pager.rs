//! Offset pagination over the VK list methods
//!
//! The API signals exhaustion with a short page: a page holding fewer items
//! than requested is the last one. No total count is relied upon.

use crate::crawler::fetcher::{ApiFetcher, RawAccount};
use crate::crawler::report::TargetError;

/// Accounts gathered across pages, plus the failure that stopped paging early
#[derive(Debug, Default)]
pub struct Paged {
    pub items: Vec<RawAccount>,
    pub pages: usize,
    pub failure: Option<TargetError>,
}

/// Fetches every page of a paginated method
///
/// Requests `count = page_size` at offsets 0, page_size, 2 * page_size, ...
/// and stops after the first page shorter than `page_size`, or at the first
/// failed call. Items from pages before a failure are kept.
pub async fn fetch_all(
    fetcher: &mut ApiFetcher,
    method: &str,
    base_params: &[(&str, String)],
    page_size: u32,
) -> Paged {
    let page_size = page_size.max(1);
    let mut paged = Paged::default();
    let mut offset: u64 = 0;

    loop {
        let mut params = base_params.to_vec();
        params.push(("offset", offset.to_string()));
        params.push(("count", page_size.to_string()));

        match fetcher.fetch(method, &params).await.into_result() {
            Ok(batch) => {
                let len = batch.len();
                paged.pages += 1;
                paged.items.extend(batch);
                tracing::debug!("{} offset {}: {} items", method, offset, len);

                if len < page_size as usize {
                    break;
                }
                offset += u64::from(page_size);
            }
            Err(e) => {
                tracing::warn!("{} stopped at offset {}: {}", method, offset, e);
                paged.failure = Some(e);
                break;
            }
        }
    }

    paged
}
