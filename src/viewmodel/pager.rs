/// Page counters for GitLab's offset pagination.
///
/// The API's pagination headers are not consulted: a full page is taken to
/// mean that another page may follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    per_page: u32,
    last_count: usize,
}

impl Pager {
    pub fn new(per_page: u32) -> Self {
        Self { page: 1, per_page, last_count: 0 }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Records the size of the page just received
    pub fn record(&mut self, count: usize) {
        self.last_count = count;
    }

    pub fn has_next_page(&self) -> bool {
        self.per_page > 0 && self.last_count == self.per_page as usize
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    /// Advances when a next page may exist
    pub fn next(&mut self) -> bool {
        let advance = self.has_next_page();
        if advance {
            self.page += 1;
        }
        advance
    }

    pub fn previous(&mut self) -> bool {
        let retreat = self.has_previous_page();
        if retreat {
            self.page -= 1;
        }
        retreat
    }

    /// Jumps to `page` (at least 1); the next load decides whether more follow
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.last_count = 0;
    }

    pub fn reset(&mut self) {
        self.page = 1;
        self.last_count = 0;
    }
}
