use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// Id tetap dokumen settings (singleton per deployment).
pub const SETTINGS_ID: &str = "bot_settings";

pub const DEFAULT_WELCOME_MESSAGE: &str = "👋 欢迎加入本群！请查看群组规则，并友好交流。";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct UserSettings {
    /// Tanggal check-in terakhir, format `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checkin: Option<String>,
    #[serde(default)]
    pub checkin_streak: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub language_code: Option<String>,
    // dokumen dari check-in lama tidak punya kedua tanggal ini
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub join_date: DateTime<Utc>,
    #[serde(default = "Utc::now", with = "chrono_datetime_as_bson_datetime")]
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub groups: Vec<i64>,
    #[serde(default)]
    pub settings: UserSettings,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub muted_until: Option<mongodb::bson::DateTime>,
}

impl User {
    pub fn new(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            user_id,
            username: None,
            first_name: None,
            last_name: None,
            is_admin: false,
            is_bot: false,
            language_code: None,
            join_date: now,
            last_activity: now,
            groups: Vec::new(),
            settings: UserSettings::default(),
            points: 0,
            is_banned: false,
            is_muted: false,
            muted_until: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PointsEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: i64,
    pub points: i64,
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoredMessage {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub message_id: i64,
    pub chat_id: i64,
    /// `None` untuk pesan tanpa pengirim (misal post channel).
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    /// text, photo, video, document, system, ...
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub reply_to_message_id: Option<i64>,
    #[serde(default)]
    pub forwarded_from: Option<i64>,
}

fn default_message_type() -> String {
    "text".to_string()
}

impl StoredMessage {
    pub fn text(message_id: i64, chat_id: i64, user_id: i64, text: impl Into<String>) -> Self {
        Self {
            id: None,
            message_id,
            chat_id,
            user_id: Some(user_id),
            text: Some(text.into()),
            date: Utc::now(),
            message_type: default_message_type(),
            file_id: None,
            reply_to_message_id: None,
            forwarded_from: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Group {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub group_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub left_date: Option<mongodb::bson::DateTime>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub members_count: i64,
}

fn default_true() -> bool {
    true
}

impl Group {
    pub fn new(group_id: i64, title: impl Into<String>) -> Self {
        Self {
            id: None,
            group_id,
            title: title.into(),
            description: None,
            join_date: Utc::now(),
            left_date: None,
            is_active: true,
            members_count: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BotSettings {
    #[serde(rename = "_id")]
    pub id: String,
    pub auto_delete_messages: bool,
    /// Menit.
    pub auto_delete_interval: i32,
    pub welcome_message: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<mongodb::bson::DateTime>,
}

impl BotSettings {
    pub fn seed(auto_delete_messages: bool, auto_delete_interval: i32) -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            auto_delete_messages,
            auto_delete_interval,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Perubahan parsial untuk settings; field `None` tidak disentuh.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub auto_delete_messages: Option<bool>,
    pub auto_delete_interval: Option<i32>,
    pub welcome_message: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.auto_delete_messages.is_none() && self.auto_delete_interval.is_none() && self.welcome_message.is_none()
    }
}
