//! Card placement and pagination.
//!
//! Cards are stacked in a single column from the top of the page down. The
//! page cursor holds the bottom edge of the next card; after each card it
//! moves down by one pitch (card height plus gap), and when it drops below
//! the minimum bottom margin the page is closed and the cursor returns to
//! the top.

use crate::config::CardLayout;

/// Where one card lands, in PDF coordinates (origin at the bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardSlot {
    pub page: usize,
    pub index_on_page: usize,
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    pub page: usize,
    pub index_on_page: usize,
    pub y: f64,
}

impl PageCursor {
    pub fn new(layout: &CardLayout) -> Self {
        Self {
            page: 0,
            index_on_page: 0,
            y: layout.first_card_y(),
        }
    }

    /// Slot for the card at the current position.
    pub fn slot(&self, layout: &CardLayout) -> CardSlot {
        CardSlot {
            page: self.page,
            index_on_page: self.index_on_page,
            x: layout.left,
            y: self.y,
        }
    }

    /// Move past the card just placed, starting a new page when the next
    /// card would sit below the minimum bottom margin.
    pub fn advance(self, layout: &CardLayout) -> Self {
        let y = self.y - layout.pitch();
        if y < layout.min_bottom {
            Self {
                page: self.page + 1,
                index_on_page: 0,
                y: layout.first_card_y(),
            }
        } else {
            Self {
                page: self.page,
                index_on_page: self.index_on_page + 1,
                y,
            }
        }
    }
}

/// Number of cards that fit on one page. Always at least one: the first card
/// of a page is placed even if the layout leaves it no room.
pub fn cards_per_page(layout: &CardLayout) -> usize {
    let room = layout.first_card_y() - layout.min_bottom;
    if room < 0.0 || layout.pitch() <= 0.0 {
        return 1;
    }
    1 + (room / layout.pitch()).floor() as usize
}

/// Assign a slot to each of `count` cards and group them by page.
///
/// Pages are only created for cards that exist, so the result has
/// `ceil(count / cards_per_page)` entries and none of them is empty.
pub fn plan(count: usize, layout: &CardLayout) -> Vec<Vec<CardSlot>> {
    let (pages, _) = (0..count).fold(
        (Vec::<Vec<CardSlot>>::new(), PageCursor::new(layout)),
        |(mut pages, cursor), _| {
            if pages.len() <= cursor.page {
                pages.push(Vec::new());
            }
            pages[cursor.page].push(cursor.slot(layout));
            (pages, cursor.advance(layout))
        },
    );
    pages
}
