use std::time::Duration;

use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use crate::error::Result;
use crate::models::{BotSettings, Group, PointsEntry, StoredMessage, User};

pub const USERS_COLLECTION: &str = "users";
pub const MESSAGES_COLLECTION: &str = "messages";
pub const GROUPS_COLLECTION: &str = "groups";
pub const SETTINGS_COLLECTION: &str = "settings";
pub const POINTS_HISTORY_COLLECTION: &str = "points_history";

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
}

impl Database {
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.app_name = Some("tgbot".to_string());
        client_options.max_pool_size = Some(20);
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    pub async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.db.name()
    }

    pub fn inner(&self) -> &mongodb::Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn run_command(&self, command: Document) -> Result<Document> {
        Ok(self.db.run_command(command, None).await?)
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection(USERS_COLLECTION)
    }

    pub fn messages(&self) -> Collection<StoredMessage> {
        self.db.collection(MESSAGES_COLLECTION)
    }

    pub fn groups(&self) -> Collection<Group> {
        self.db.collection(GROUPS_COLLECTION)
    }

    pub fn settings(&self) -> Collection<BotSettings> {
        self.db.collection(SETTINGS_COLLECTION)
    }

    pub fn points_history(&self) -> Collection<PointsEntry> {
        self.db.collection(POINTS_HISTORY_COLLECTION)
    }

    /// Akses mentah, dipakai bootstrap untuk index dan upsert.
    pub fn raw(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

/// Pelanggaran unique index (kode 11000).
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
