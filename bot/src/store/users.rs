use chrono::{Duration, NaiveDate, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use super::Page;
use crate::database::{is_duplicate_key, Database};
use crate::error::{Error, Result};
use crate::models::{PointsEntry, User, UserSettings};

pub const CHECKIN_BASE_POINTS: i64 = 5;
pub const CHECKIN_MAX_STREAK_BONUS: i64 = 30;

const CHECKIN_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinResult {
    AlreadyCheckedIn { streak: i32 },
    CheckedIn { streak: i32, reward: i64, total_points: i64 },
}

/// Hitung streak baru dan hadiah poin. `None` kalau hari ini sudah check-in.
pub(crate) fn next_checkin(settings: &UserSettings, today: NaiveDate) -> Option<(UserSettings, i64)> {
    // Tanggal rusak dianggap belum pernah check-in
    let last = settings
        .last_checkin
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, CHECKIN_DATE_FORMAT).ok());

    if last == Some(today) {
        return None;
    }

    let streak = match last {
        Some(day) if day + Duration::days(1) == today => settings.checkin_streak + 1,
        _ => 1,
    };
    let reward = CHECKIN_BASE_POINTS + i64::from(streak).min(CHECKIN_MAX_STREAK_BONUS);

    let updated = UserSettings {
        last_checkin: Some(today.format(CHECKIN_DATE_FORMAT).to_string()),
        checkin_streak: streak,
    };
    Some((updated, reward))
}

impl Database {
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "user_id": user_id }, None).await?)
    }

    /// Buat user baru; kalau sudah ada, kembalikan yang lama.
    pub async fn create_user(&self, user: User) -> Result<User> {
        if let Some(existing) = self.get_user(user.user_id).await? {
            return Ok(existing);
        }
        let user_id = user.user_id;
        match self.users().insert_one(&user, None).await {
            Ok(_) => {}
            // Kalah balapan dengan insert lain, tidak masalah
            Err(e) if is_duplicate_key(&e) => log::debug!("User {} sudah dibuat proses lain", user_id),
            Err(e) => return Err(e.into()),
        }
        self.get_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))
    }

    /// `$set` parsial; `last_activity` selalu diperbarui.
    pub async fn update_user(&self, user_id: i64, mut update: Document) -> Result<Option<User>> {
        update.insert("last_activity", bson::DateTime::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .users()
            .find_one_and_update(doc! { "user_id": user_id }, doc! { "$set": update }, options)
            .await?)
    }

    /// Tambah (atau kurangi) poin dan catat di `points_history`.
    /// Mengembalikan `false` kalau user tidak ada.
    pub async fn add_points(&self, user_id: i64, points: i64, source: &str, description: &str) -> Result<bool> {
        let result = self
            .users()
            .update_one(doc! { "user_id": user_id }, doc! { "$inc": { "points": points } }, None)
            .await?;

        if result.matched_count == 0 {
            log::warn!("User {} tidak ada, poin tidak diperbarui", user_id);
            return Ok(false);
        }

        let entry = PointsEntry {
            id: None,
            user_id,
            points,
            source: source.to_string(),
            description: description.to_string(),
            date: Utc::now(),
        };
        self.points_history().insert_one(entry, None).await?;
        Ok(true)
    }

    pub async fn points_history_for(&self, user_id: i64, limit: i64) -> Result<Vec<PointsEntry>> {
        let options = FindOptions::builder().sort(doc! { "date": -1 }).limit(limit).build();
        let cursor = self.points_history().find(doc! { "user_id": user_id }, options).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Check-in harian. User yang belum terdaftar dibuat dulu.
    ///
    /// Update bersyarat pada `settings.last_checkin != hari ini`, jadi dua
    /// check-in bersamaan di hari yang sama hanya memberi poin sekali.
    pub async fn checkin(&self, user_id: i64, today: NaiveDate) -> Result<CheckinResult> {
        let user = self.create_user(User::new(user_id)).await?;

        let Some((settings, reward)) = next_checkin(&user.settings, today) else {
            return Ok(CheckinResult::AlreadyCheckedIn { streak: user.settings.checkin_streak });
        };
        let day = settings.last_checkin.as_deref().unwrap_or_default();

        // field di-set satu per satu; key lain di `settings` tetap utuh
        let result = self
            .users()
            .update_one(
                doc! { "user_id": user_id, "settings.last_checkin": { "$ne": day } },
                doc! { "$set": {
                    "settings.last_checkin": day,
                    "settings.checkin_streak": settings.checkin_streak,
                } },
                None,
            )
            .await?;

        if result.modified_count != 1 {
            log::debug!("User {} sudah check-in lewat proses lain", user_id);
            let streak = self
                .get_user(user_id)
                .await?
                .map_or(settings.checkin_streak, |u| u.settings.checkin_streak);
            return Ok(CheckinResult::AlreadyCheckedIn { streak });
        }

        let description = format!("Check-in hari ke-{} berturut-turut", settings.checkin_streak);
        self.add_points(user_id, reward, "checkin", &description).await?;

        let total_points = self.get_user(user_id).await?.map(|u| u.points).unwrap_or(reward);
        Ok(CheckinResult::CheckedIn {
            streak: settings.checkin_streak,
            reward,
            total_points,
        })
    }

    pub async fn list_users(&self, page: Page) -> Result<Vec<User>> {
        let cursor = self.users().find(None, page.options(None)).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn top_users_by_points(&self, limit: i64) -> Result<Vec<User>> {
        let options = Page::new(0, limit).options(Some(doc! { "points": -1 }));
        let cursor = self.users().find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn admin_users(&self) -> Result<Vec<User>> {
        let cursor = self.users().find(doc! { "is_admin": true }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_users(&self) -> Result<u64> {
        Ok(self.users().count_documents(None, None).await?)
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = self.users().delete_one(doc! { "user_id": user_id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, CHECKIN_DATE_FORMAT).unwrap()
    }

    fn settings(last: Option<&str>, streak: i32) -> UserSettings {
        UserSettings {
            last_checkin: last.map(str::to_string),
            checkin_streak: streak,
        }
    }

    #[test]
    fn first_checkin_starts_streak() {
        let (next, reward) = next_checkin(&UserSettings::default(), day("2024-03-01")).unwrap();
        assert_eq!(next, settings(Some("2024-03-01"), 1));
        assert_eq!(reward, 6);
    }

    #[test]
    fn same_day_checkin_is_rejected() {
        assert_eq!(next_checkin(&settings(Some("2024-03-01"), 4), day("2024-03-01")), None);
    }

    #[test]
    fn consecutive_day_extends_streak() {
        let (next, reward) = next_checkin(&settings(Some("2024-02-29"), 4), day("2024-03-01")).unwrap();
        assert_eq!(next.checkin_streak, 5);
        assert_eq!(reward, 10);
    }

    #[test]
    fn gap_resets_streak() {
        let (next, _) = next_checkin(&settings(Some("2024-02-27"), 9), day("2024-03-01")).unwrap();
        assert_eq!(next.checkin_streak, 1);
    }

    #[test]
    fn streak_bonus_is_capped() {
        let (next, reward) = next_checkin(&settings(Some("2024-02-29"), 45), day("2024-03-01")).unwrap();
        assert_eq!(next.checkin_streak, 46);
        assert_eq!(reward, CHECKIN_BASE_POINTS + CHECKIN_MAX_STREAK_BONUS);
    }

    #[test]
    fn garbage_last_checkin_counts_as_first() {
        let (next, _) = next_checkin(&settings(Some("kemarin"), 3), day("2024-03-01")).unwrap();
        assert_eq!(next.checkin_streak, 1);
    }
}
