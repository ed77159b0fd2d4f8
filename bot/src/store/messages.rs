use std::collections::BTreeMap;

use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};

use super::Page;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::models::StoredMessage;

/// Jumlah pesan per `message_type`.
pub type MessageTypeStats = BTreeMap<String, i64>;

fn newest_first() -> Option<Document> {
    Some(doc! { "date": -1 })
}

/// Filter pencarian teks case-insensitive; input diperlakukan literal.
fn search_filter(text: &str) -> Document {
    doc! { "text": { "$regex": regex::escape(text), "$options": "i" } }
}

fn count_from(value: Option<&Bson>) -> i64 {
    match value {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        _ => 0,
    }
}

impl Database {
    pub async fn save_message(&self, message: StoredMessage) -> Result<StoredMessage> {
        let (message_id, chat_id) = (message.message_id, message.chat_id);
        self.messages().insert_one(message, None).await?;
        self.get_message(message_id, chat_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("message {} in chat {}", message_id, chat_id)))
    }

    pub async fn get_message(&self, message_id: i64, chat_id: i64) -> Result<Option<StoredMessage>> {
        Ok(self
            .messages()
            .find_one(doc! { "message_id": message_id, "chat_id": chat_id }, None)
            .await?)
    }

    pub async fn chat_messages(&self, chat_id: i64, page: Page) -> Result<Vec<StoredMessage>> {
        let cursor = self
            .messages()
            .find(doc! { "chat_id": chat_id }, page.options(newest_first()))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn user_messages(&self, user_id: i64, page: Page) -> Result<Vec<StoredMessage>> {
        let cursor = self
            .messages()
            .find(doc! { "user_id": user_id }, page.options(newest_first()))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn group_messages(&self, group_ids: &[i64], page: Page) -> Result<Vec<StoredMessage>> {
        let cursor = self
            .messages()
            .find(doc! { "chat_id": { "$in": group_ids.to_vec() } }, page.options(newest_first()))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn search_messages(&self, text: &str, page: Page) -> Result<Vec<StoredMessage>> {
        let cursor = self
            .messages()
            .find(search_filter(text), page.options(newest_first()))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_messages(&self, filter: Option<Document>) -> Result<u64> {
        Ok(self.messages().count_documents(filter, None).await?)
    }

    pub async fn delete_message(&self, message_id: i64, chat_id: i64) -> Result<bool> {
        let result = self
            .messages()
            .delete_one(doc! { "message_id": message_id, "chat_id": chat_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn message_type_stats(&self) -> Result<MessageTypeStats> {
        let pipeline = [doc! { "$group": { "_id": "$message_type", "count": { "$sum": 1 } } }];
        let mut cursor = self.messages().aggregate(pipeline, None).await?;

        let mut stats = MessageTypeStats::new();
        while let Some(row) = cursor.try_next().await? {
            let kind = match row.get("_id") {
                Some(Bson::String(s)) => s.clone(),
                _ => "unknown".to_string(),
            };
            *stats.entry(kind).or_insert(0) += count_from(row.get("count"));
        }
        Ok(stats)
    }
}
