//! Cursor pagination driver
//!
//! Drives any cursor-paginated endpoint to exhaustion. The first page is
//! requested without a cursor; each following request carries the previous
//! page's end cursor until the endpoint reports there is no next page.

use std::future::Future;

/// One page of a cursor-paginated result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next: false,
            end_cursor: None,
        }
    }
}

/// Fetches every page and appends the items to `out` in order
///
/// Items from pages fetched before a failure stay in `out`. Returns the
/// number of pages fetched.
///
/// There is no page ceiling; termination relies on the endpoint eventually
/// reporting `has_next = false`. A page that claims a successor but carries
/// no cursor ends the traversal, since requesting it again could only
/// return the first page.
pub async fn paginate_into<T, E, F, Fut>(out: &mut Vec<T>, mut fetch_page: F) -> Result<usize, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut cursor = None;
    let mut pages = 0;

    loop {
        let page = fetch_page(cursor.take()).await?;
        pages += 1;
        out.extend(page.items);

        if !page.has_next {
            return Ok(pages);
        }

        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                tracing::warn!("Page {} reports more results but no cursor; stopping", pages);
                return Ok(pages);
            }
        }
    }
}

/// Fetches every page and returns the concatenated items
pub async fn paginate<T, E, F, Fut>(fetch_page: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    paginate_into(&mut items, fetch_page).await?;
    Ok(items)
}
