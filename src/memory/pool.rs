/*!
 * Page Pool
 * Free-page list backed by batch requests to the system allocator
 *
 * ## Layout
 *
 * Pages are handed out by the system allocator in batches of
 * `batch_pages` contiguous pages. A page is identified by its global index;
 * batch `id / batch_pages` holds its words at `(id % batch_pages) * page_words`.
 *
 * Every page has one `next` link. The link threads the page either through
 * the free list (LIFO) or through the page chain of the region owning it,
 * never both.
 *
 * ## Complexity
 *
 * - `acquire_page`: O(1), plus one batch request when the free list is empty
 * - `return_chain`: O(1) splice of a whole region chain
 */

use crate::core::types::{PageId, Word};
use log::{error, info};
use std::alloc::Layout;

#[derive(Debug)]
pub struct PagePool {
    page_words: usize,
    batch_pages: usize,
    batches: Vec<Box<[Word]>>,
    links: Vec<Option<PageId>>,
    free_head: Option<PageId>,
    free_pages: usize,
}

impl PagePool {
    pub fn new(page_words: usize, batch_pages: usize) -> Self {
        Self {
            page_words,
            batch_pages,
            batches: Vec::new(),
            links: Vec::new(),
            free_head: None,
            free_pages: 0,
        }
    }

    /// Take the first page of the free list, requesting a batch if needed.
    /// The returned page is detached (`next` is `None`).
    pub fn acquire_page(&mut self) -> PageId {
        let page = match self.free_head {
            Some(page) => page,
            None => self.request_batch(),
        };

        self.free_head = self.links[page];
        self.links[page] = None;
        self.free_pages -= 1;
        page
    }

    /// Splice the chain `head ..= tail` onto the free list.
    /// The chain must already be linked; page contents are left untouched.
    pub fn return_chain(&mut self, head: PageId, tail: PageId, pages: usize) {
        self.links[tail] = self.free_head;
        self.free_head = Some(head);
        self.free_pages += pages;
    }

    /// Obtain `batch_pages` pages from the system allocator and chain them
    /// onto the (empty) free list. Returns the new free-list head.
    ///
    /// Allocator exhaustion aborts the process.
    fn request_batch(&mut self) -> PageId {
        let requested = self.page_words.checked_mul(self.batch_pages);
        let mut storage: Vec<Word> = Vec::new();
        let words = match requested {
            Some(words) if storage.try_reserve_exact(words).is_ok() => words,
            _ => {
                error!(
                    "Cannot obtain {} pages of {} words from the system allocator",
                    self.batch_pages, self.page_words
                );
                let layout = requested
                    .and_then(|words| Layout::array::<Word>(words).ok())
                    .unwrap_or_else(Layout::new::<Word>);
                std::alloc::handle_alloc_error(layout);
            }
        };
        storage.resize(words, 0);

        let first = self.links.len();
        let last = first + self.batch_pages - 1;
        self.links.extend((first + 1..=last).map(Some));
        self.links.push(self.free_head);
        self.batches.push(storage.into_boxed_slice());

        self.free_head = Some(first);
        self.free_pages += self.batch_pages;

        info!(
            "Requested {} pages of {} words from the system allocator ({} pages total)",
            self.batch_pages,
            self.page_words,
            self.links.len()
        );
        first
    }

    #[inline]
    pub fn next(&self, page: PageId) -> Option<PageId> {
        self.links[page]
    }

    #[inline]
    pub fn link(&mut self, page: PageId, next: Option<PageId>) {
        self.links[page] = next;
    }

    /// Payload of a page
    pub fn words(&self, page: PageId) -> &[Word] {
        let (batch, start) = self.locate(page);
        &self.batches[batch][start..start + self.page_words]
    }

    /// Mutable payload of a page
    pub fn words_mut(&mut self, page: PageId) -> &mut [Word] {
        let (batch, start) = self.locate(page);
        &mut self.batches[batch][start..start + self.page_words]
    }

    #[inline]
    fn locate(&self, page: PageId) -> (usize, usize) {
        (
            page / self.batch_pages,
            (page % self.batch_pages) * self.page_words,
        )
    }

    pub fn page_words(&self) -> usize {
        self.page_words
    }

    /// Pages currently on the free list
    pub fn free_pages(&self) -> usize {
        self.free_pages
    }

    /// Pages ever obtained from the system allocator
    pub fn total_pages(&self) -> usize {
        self.links.len()
    }
}
