//! Query per koleksi, ditempel sebagai method di [`crate::database::Database`].

mod groups;
mod messages;
mod settings;
mod users;

pub use messages::MessageTypeStats;
pub use users::{CheckinResult, CHECKIN_BASE_POINTS, CHECKIN_MAX_STREAK_BONUS};

use mongodb::options::FindOptions;
use mongodb::bson::Document;

/// Paging sederhana gaya skip/limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: i64,
}

impl Page {
    pub fn new(skip: u64, limit: i64) -> Self {
        Self { skip, limit }
    }

    fn options(self, sort: Option<Document>) -> FindOptions {
        FindOptions::builder()
            .skip(self.skip)
            .limit(self.limit)
            .sort(sort)
            .build()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}
