//! Provisi database pertama kali: user aplikasi, koleksi, index, dan
//! dokumen settings singleton.
//!
//! Kebijakan re-run dipilih lewat [`BootstrapPolicy`]: default `Idempotent`
//! melewati objek yang sudah ada; `Strict` memeriksa dulu (read-only) dan
//! gagal sebelum mengubah apa pun bila ada objek yang sudah ada.

use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::{IndexOptions, UpdateOptions};
use mongodb::IndexModel;

use crate::config::Config;
use crate::database::{
    Database, GROUPS_COLLECTION, MESSAGES_COLLECTION, SETTINGS_COLLECTION, USERS_COLLECTION,
};
use crate::error::{Error, Result};
use crate::models::{BotSettings, SETTINGS_ID};

pub const COLLECTIONS: [&str; 4] = [USERS_COLLECTION, MESSAGES_COLLECTION, GROUPS_COLLECTION, SETTINGS_COLLECTION];

pub const APP_USER_ROLE: &str = "readWrite";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub field: &'static str,
    pub unique: bool,
}

impl IndexSpec {
    pub fn name(&self) -> String {
        if self.unique {
            format!("{}_unique", self.field)
        } else {
            format!("{}_1", self.field)
        }
    }

    fn keys(&self) -> Document {
        let mut keys = Document::new();
        keys.insert(self.field, 1);
        keys
    }

    /// Pola `{field: 1}`; angka 1 boleh int maupun double (hasil mongosh).
    fn matches_keys(&self, keys: &Document) -> bool {
        let ascending = match keys.get(self.field) {
            Some(Bson::Int32(v)) => *v == 1,
            Some(Bson::Int64(v)) => *v == 1,
            Some(Bson::Double(v)) => *v == 1.0,
            _ => false,
        };
        keys.len() == 1 && ascending
    }

    fn model(&self) -> IndexModel {
        let options = IndexOptions::builder().name(self.name()).unique(self.unique).build();
        IndexModel::builder().keys(self.keys()).options(options).build()
    }
}

pub const INDEXES: [IndexSpec; 5] = [
    IndexSpec { collection: USERS_COLLECTION, field: "user_id", unique: true },
    IndexSpec { collection: MESSAGES_COLLECTION, field: "message_id", unique: false },
    IndexSpec { collection: MESSAGES_COLLECTION, field: "chat_id", unique: false },
    IndexSpec { collection: MESSAGES_COLLECTION, field: "date", unique: false },
    IndexSpec { collection: GROUPS_COLLECTION, field: "group_id", unique: true },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapPolicy {
    #[default]
    Idempotent,
    Strict,
}

/// Kredensial user aplikasi yang akan dibuat.
#[derive(Debug, Clone)]
pub struct AppUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapPlan {
    pub app_user: Option<AppUser>,
    pub settings: BotSettings,
}

impl BootstrapPlan {
    pub fn from_config(config: &Config) -> Self {
        // Tanpa password tidak ada user yang bisa dibuat
        let app_user = (!config.mongo.password.is_empty()).then(|| AppUser {
            username: config.mongo.username.clone(),
            password: config.mongo.password.clone(),
        });
        Self {
            app_user,
            settings: BotSettings::seed(config.auto_delete_messages, config.auto_delete_interval),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

impl BootstrapReport {
    fn mark_created(&mut self, what: String) {
        log::info!("✅ Dibuat: {}", what);
        self.created.push(what);
    }

    fn mark_skipped(&mut self, what: String) {
        log::info!("⏭️ Sudah ada, dilewati: {}", what);
        self.skipped.push(what);
    }

    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

/// Index yang sudah ada di server, apa pun namanya.
#[derive(Debug, Clone)]
struct ExistingIndex {
    collection: String,
    name: String,
    keys: Document,
    unique: bool,
}

impl ExistingIndex {
    fn from_model(collection: &str, model: IndexModel) -> Self {
        let options = model.options.unwrap_or_default();
        Self {
            collection: collection.to_string(),
            name: options.name.unwrap_or_default(),
            keys: model.keys,
            unique: options.unique.unwrap_or(false),
        }
    }
}

/// Keadaan database saat ini, dibaca tanpa mengubah apa pun.
#[derive(Debug, Default)]
struct Existing {
    user: bool,
    collections: Vec<String>,
    indexes: Vec<ExistingIndex>,
    settings: bool,
}

impl Existing {
    fn has_collection(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c == name)
    }

    /// Index dengan pola key yang sama, dicocokkan tanpa melihat nama.
    fn find_index(&self, spec: &IndexSpec) -> Option<&ExistingIndex> {
        self.indexes
            .iter()
            .find(|i| i.collection == spec.collection && spec.matches_keys(&i.keys))
    }

    /// Index dengan key sama tapi opsi `unique` berbeda; membuatnya ulang pasti ditolak server.
    fn mismatched_indexes(&self) -> Vec<String> {
        INDEXES
            .iter()
            .filter_map(|spec| {
                let found = self.find_index(spec)?;
                (found.unique != spec.unique).then(|| {
                    format!(
                        "index `{}.{}` (unique={}, diharapkan unique={})",
                        found.collection, found.name, found.unique, spec.unique
                    )
                })
            })
            .collect()
    }

    /// Daftar objek yang sudah ada, untuk pesan error mode strict.
    fn conflicts(&self, plan: &BootstrapPlan) -> Vec<String> {
        let mut out = Vec::new();
        if let (true, Some(user)) = (self.user, &plan.app_user) {
            out.push(format!("user `{}`", user.username));
        }
        out.extend(
            COLLECTIONS
                .iter()
                .filter(|c| self.has_collection(c))
                .map(|c| format!("collection `{}`", c)),
        );
        out.extend(
            INDEXES
                .iter()
                .filter_map(|s| self.find_index(s))
                .map(|i| format!("index `{}.{}`", i.collection, i.name)),
        );
        if self.settings {
            out.push(format!("settings `{}`", SETTINGS_ID));
        }
        out
    }
}

async fn user_exists(db: &Database, username: &str) -> Result<bool> {
    let reply = db.run_command(doc! { "usersInfo": username }).await?;
    Ok(matches!(reply.get("users"), Some(Bson::Array(users)) if !users.is_empty()))
}

async fn inspect(db: &Database, plan: &BootstrapPlan) -> Result<Existing> {
    let mut existing = Existing {
        collections: db.inner().list_collection_names(None).await?,
        ..Default::default()
    };
    if let Some(user) = &plan.app_user {
        existing.user = user_exists(db, &user.username).await?;
    }
    let present: Vec<&str> = COLLECTIONS.into_iter().filter(|c| existing.has_collection(c)).collect();
    for name in present {
        let models: Vec<IndexModel> = db.raw(name).list_indexes(None).await?.try_collect().await?;
        existing
            .indexes
            .extend(models.into_iter().map(|model| ExistingIndex::from_model(name, model)));
    }
    if existing.has_collection(SETTINGS_COLLECTION) {
        existing.settings = db.raw(SETTINGS_COLLECTION).find_one(doc! { "_id": SETTINGS_ID }, None).await?.is_some();
    }
    Ok(existing)
}

pub async fn run(db: &Database, plan: &BootstrapPlan, policy: BootstrapPolicy) -> Result<BootstrapReport> {
    log::info!("🚀 Bootstrap database `{}` (policy: {:?})", db.name(), policy);

    let existing = inspect(db, plan).await?;
    let mismatched = existing.mismatched_indexes();
    if !mismatched.is_empty() {
        return Err(Error::IndexMismatch(mismatched.join(", ")));
    }
    if policy == BootstrapPolicy::Strict {
        let conflicts = existing.conflicts(plan);
        if !conflicts.is_empty() {
            return Err(Error::AlreadyProvisioned(conflicts.join(", ")));
        }
    }

    let mut report = BootstrapReport::default();

    if let Some(user) = &plan.app_user {
        let label = format!("user `{}` ({})", user.username, APP_USER_ROLE);
        if existing.user {
            report.mark_skipped(label);
        } else {
            db.run_command(doc! {
                "createUser": user.username.as_str(),
                "pwd": user.password.as_str(),
                "roles": [{ "role": APP_USER_ROLE, "db": db.name() }],
            })
            .await?;
            report.mark_created(label);
        }
    }

    for name in COLLECTIONS {
        let label = format!("collection `{}`", name);
        if existing.has_collection(name) {
            report.mark_skipped(label);
        } else {
            db.inner().create_collection(name, None).await?;
            report.mark_created(label);
        }
    }

    for spec in INDEXES.iter() {
        match existing.find_index(spec) {
            Some(found) => report.mark_skipped(format!("index `{}.{}`", found.collection, found.name)),
            None => {
                db.raw(spec.collection).create_index(spec.model(), None).await?;
                report.mark_created(format!("index `{}.{}`", spec.collection, spec.name()));
            }
        }
    }

    let label = format!("settings `{}`", SETTINGS_ID);
    if existing.settings {
        report.mark_skipped(label);
    } else {
        // $setOnInsert: dokumen yang sudah ada tidak pernah ditimpa
        let seed = settings_seed_document(&plan.settings)?;
        let options = UpdateOptions::builder().upsert(true).build();
        db.raw(SETTINGS_COLLECTION)
            .update_one(doc! { "_id": SETTINGS_ID }, doc! { "$setOnInsert": seed }, options)
            .await?;
        report.mark_created(label);
    }

    log::info!(
        "Bootstrap selesai: {} dibuat, {} dilewati",
        report.created.len(),
        report.skipped.len()
    );
    Ok(report)
}

fn settings_seed_document(settings: &BotSettings) -> Result<Document> {
    let mut seed = bson::to_document(settings)?;
    // _id sudah ada di filter upsert
    seed.remove("_id");
    Ok(seed)
}
