use askama_actix::Template;
use sea_orm::{DatabaseConnection, DbErr, FromQueryResult, PaginatorTrait, SelectModel, Selector};
use serde::Deserialize;

/// Fixed page size for every post listing.
pub const POSTS_PER_PAGE: u64 = 10;
const PAGINATOR_LOOK_AHEAD: u64 = 2;

/// `?page=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page number. Missing or malformed values select page 1,
    /// "last" selects the final page.
    pub fn number(&self) -> u64 {
        match self.page.as_deref().map(str::trim) {
            Some("last") => u64::MAX,
            Some(page) => page.parse::<u64>().ok().filter(|n| *n > 0).unwrap_or(1),
            None => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageLink {
    Page(u64),
    Current(u64),
    Gap,
}

/// 1 2 [3] 4 5 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 9 10 [11] 12 13
#[derive(Debug)]
pub struct Paginator {
    pub base_url: String,
    pub this_page: u64,
    pub page_count: u64,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    base_url: &'a str,
    links: &'a [PageLink],
}

impl Paginator {
    /// Clamps the requested page into `1..=page_count`.
    pub fn new(base_url: &str, requested: u64, page_count: u64) -> Self {
        let page_count = page_count.max(1);
        Self {
            base_url: base_url.to_owned(),
            this_page: requested.clamp(1, page_count),
            page_count,
        }
    }

    pub fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    pub fn links(&self) -> Vec<PageLink> {
        let start = self.this_page.saturating_sub(PAGINATOR_LOOK_AHEAD).max(1);
        let end = (self.this_page + PAGINATOR_LOOK_AHEAD).min(self.page_count);
        let mut links = Vec::with_capacity((end - start + 5) as usize);

        if start > 1 {
            links.push(PageLink::Page(1));
            if start > 2 {
                links.push(PageLink::Gap);
            }
        }

        for n in start..=end {
            if n == self.this_page {
                links.push(PageLink::Current(n));
            } else {
                links.push(PageLink::Page(n));
            }
        }

        if end < self.page_count {
            if end + 1 < self.page_count {
                links.push(PageLink::Gap);
            }
            links.push(PageLink::Page(self.page_count));
        }

        links
    }

    pub fn as_html(&self) -> String {
        if !self.has_pages() {
            return String::new();
        }

        let links = self.links();
        let template = PaginatorTemplate {
            base_url: &self.base_url,
            links: &links,
        };
        match template.render() {
            Ok(html) => html,
            Err(e) => {
                log::error!("Paginator::as_html: {}", e);
                "[Paginator Util Error]".to_owned()
            }
        }
    }
}

/// One page of a listing.
#[derive(Debug)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub paginator: Paginator,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn number(&self) -> u64 {
        self.paginator.this_page
    }
}

/// Counts the selector's rows and fetches the requested page of them.
pub async fn fetch_page<M>(
    db: &DatabaseConnection,
    selector: Selector<SelectModel<M>>,
    base_url: &str,
    requested: u64,
) -> Result<Page<M>, DbErr>
where
    M: FromQueryResult + Send + Sync + 'static,
{
    let pages = selector.paginate(db, POSTS_PER_PAGE);
    let counts = pages.num_items_and_pages().await?;
    let paginator = Paginator::new(base_url, requested, counts.number_of_pages);
    let object_list = pages.fetch_page(paginator.this_page - 1).await?;

    Ok(Page {
        object_list,
        paginator,
        count: counts.number_of_items,
    })
}

#[cfg(test)]
mod tests {
    use super::PageLink::*;
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(|p| p.to_owned()),
        }
    }

    #[test]
    fn test_page_query() {
        assert_eq!(query(None).number(), 1);
        assert_eq!(query(Some("3")).number(), 3);
        assert_eq!(query(Some("0")).number(), 1);
        assert_eq!(query(Some("-2")).number(), 1);
        assert_eq!(query(Some("abc")).number(), 1);
        assert_eq!(query(Some("last")).number(), u64::MAX);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Paginator::new("/", 99, 2).this_page, 2);
        assert_eq!(Paginator::new("/", 0, 2).this_page, 1);
        // Empty listings still have a single page.
        let empty = Paginator::new("/", 5, 0);
        assert_eq!(empty.page_count, 1);
        assert_eq!(empty.this_page, 1);
        assert!(!empty.has_pages());
        assert_eq!(empty.as_html(), "");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            Paginator::new("/", 1, 13).links(),
            vec![Current(1), Page(2), Page(3), Gap, Page(13)]
        );
        assert_eq!(
            Paginator::new("/", 6, 13).links(),
            vec![Page(1), Gap, Page(4), Page(5), Current(6), Page(7), Page(8), Gap, Page(13)]
        );
        assert_eq!(
            Paginator::new("/", 11, 13).links(),
            vec![Page(1), Gap, Page(9), Page(10), Current(11), Page(12), Page(13)]
        );
        assert_eq!(
            Paginator::new("/", 2, 2).links(),
            vec![Page(1), Current(2)]
        );
        // No gap marker between adjacent numbers.
        assert_eq!(
            Paginator::new("/", 4, 5).links(),
            vec![Page(1), Page(2), Page(3), Current(4), Page(5)]
        );
    }

    #[test]
    fn test_as_html() {
        let html = Paginator::new("/group/tolstoy/", 2, 3).as_html();
        assert!(html.contains("href=\"/group/tolstoy/?page=1\""));
        assert!(html.contains("href=\"/group/tolstoy/?page=3\""));
        assert!(!html.contains("href=\"/group/tolstoy/?page=2\""));
    }
}
