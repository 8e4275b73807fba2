pub struct Paginator<'a, T> {
    items: &'a [T],
    page_size: u32,
    page_count: u32,
}

impl<'a, T> Paginator<'a, T> {
    pub fn from(items: &'a [T], page_size: u32) -> Result<Self, String> {
        if page_size == 0 {
            return Err("Page size has to be greater than 0".to_string());
        }

        let page_count = (items.len() as u32).div_ceil(page_size);
        Ok(Paginator {
            items,
            page_size,
            page_count,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Pages start at 1
    pub fn get_page(&self, page: u32) -> Result<&'a [T], String> {
        match page {
            0 => return Err("Page has to be greater than 0".to_string()),
            x if x > self.page_count => return Err(format!("Page has to be less than page_count ({})", self.page_count)),
            _ => {}
        };

        let start = ((page - 1) * self.page_size) as usize;
        let end = (start + self.page_size as usize).min(self.items.len());
        Ok(&self.items[start..end])
    }
}
