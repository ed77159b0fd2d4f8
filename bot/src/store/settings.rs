use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::database::Database;
use crate::error::{Error, Result};
use crate::models::{BotSettings, SettingsPatch, SETTINGS_ID};

fn patch_document(patch: &SettingsPatch) -> Document {
    let mut set = Document::new();
    if let Some(enabled) = patch.auto_delete_messages {
        set.insert("auto_delete_messages", enabled);
    }
    if let Some(minutes) = patch.auto_delete_interval {
        set.insert("auto_delete_interval", minutes);
    }
    if let Some(welcome) = &patch.welcome_message {
        set.insert("welcome_message", welcome.as_str());
    }
    set.insert("updated_at", bson::DateTime::now());
    set
}

impl Database {
    pub async fn get_settings(&self) -> Result<Option<BotSettings>> {
        Ok(self.settings().find_one(doc! { "_id": SETTINGS_ID }, None).await?)
    }

    /// Ubah settings singleton. Dokumen harus sudah dibuat oleh bootstrap.
    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<BotSettings> {
        if patch.auto_delete_interval.is_some_and(|m| m <= 0) {
            return Err(Error::Config("auto_delete_interval harus lebih dari 0 menit".to_string()));
        }
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.settings()
            .find_one_and_update(doc! { "_id": SETTINGS_ID }, doc! { "$set": patch_document(patch) }, options)
            .await?
            .ok_or_else(|| Error::NotFound(format!("settings `{}` (jalankan `tgbot init-db`)", SETTINGS_ID)))
    }
}
