use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Document};

use super::Page;
use crate::database::{is_duplicate_key, Database};
use crate::error::{Error, Result};
use crate::models::Group;

fn active_filter(active_only: bool) -> Option<Document> {
    active_only.then(|| doc! { "is_active": true })
}

impl Database {
    pub async fn get_group(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(self.groups().find_one(doc! { "group_id": group_id }, None).await?)
    }

    /// Sama seperti user: grup yang sudah ada dikembalikan apa adanya.
    pub async fn create_group(&self, mut group: Group) -> Result<Group> {
        if let Some(existing) = self.get_group(group.group_id).await? {
            return Ok(existing);
        }
        group.is_active = true;
        let group_id = group.group_id;
        match self.groups().insert_one(&group, None).await {
            Ok(_) => {}
            Err(e) if is_duplicate_key(&e) => log::debug!("Grup {} sudah dibuat proses lain", group_id),
            Err(e) => return Err(e.into()),
        }
        self.get_group(group_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("group {}", group_id)))
    }

    pub async fn update_group(&self, group_id: i64, update: Document) -> Result<Option<Group>> {
        let result = self
            .groups()
            .update_one(doc! { "group_id": group_id }, doc! { "$set": update }, None)
            .await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        self.get_group(group_id).await
    }

    pub async fn list_groups(&self, page: Page, active_only: bool) -> Result<Vec<Group>> {
        let cursor = self.groups().find(active_filter(active_only), page.options(None)).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_groups(&self, active_only: bool) -> Result<u64> {
        Ok(self.groups().count_documents(active_filter(active_only), None).await?)
    }

    /// Tandai grup tidak aktif (bot keluar), tanpa menghapus datanya.
    pub async fn deactivate_group(&self, group_id: i64) -> Result<bool> {
        let result = self
            .groups()
            .update_one(
                doc! { "group_id": group_id },
                doc! { "$set": { "is_active": false, "left_date": bson::DateTime::now() } },
                None,
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    pub async fn delete_group(&self, group_id: i64) -> Result<bool> {
        let result = self.groups().delete_one(doc! { "group_id": group_id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    /// Jumlah user yang `groups`-nya memuat grup ini.
    pub async fn group_members_count(&self, group_id: i64) -> Result<u64> {
        Ok(self.users().count_documents(doc! { "groups": group_id }, None).await?)
    }

    pub async fn refresh_members_count(&self, group_id: i64) -> Result<u64> {
        let count = self.group_members_count(group_id).await?;
        self.groups()
            .update_one(
                doc! { "group_id": group_id },
                doc! { "$set": { "members_count": (count as i64) } },
                None,
            )
            .await?;
        Ok(count)
    }
}
