use super::tag::Tag;

/// One page of tags as returned by `GET /tags`
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagsResponse {
    pub first: u32,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub last: u32,
    /// Total page count
    pub pages: u32,
    /// Total item count across all pages
    pub items: u32,
    pub data: Vec<Tag>,
}

impl TagsResponse {

    #[cfg(test)]
    pub fn new_test(page: u32, pages: u32, items: u32, data: Vec<Tag>) -> Self {
        Self {
            first: 1,
            prev: if page > 1 { Some(page - 1) } else { None },
            next: if page < pages { Some(page + 1) } else { None },
            last: pages.max(1),
            pages,
            items,
            data,
        }
    }
}
