use std::time::{SystemTime, UNIX_EPOCH};

use tgbot::Database;

pub const MONGO_URI_VAR: &str = "TGBOT_TEST_MONGO_URI";

/// Database sekali pakai. `None` (test dilewati) kalau `TGBOT_TEST_MONGO_URI` tidak di-set.
pub async fn scratch_db(label: &str) -> Option<Database> {
    let uri = match std::env::var(MONGO_URI_VAR) {
        Ok(uri) if !uri.trim().is_empty() => uri,
        _ => {
            eprintln!("{} tidak di-set, test `{}` dilewati", MONGO_URI_VAR, label);
            return None;
        }
    };
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
    let name = format!("tgbot_it_{}_{}_{}", label, std::process::id(), nanos);
    let db = Database::connect(&uri, &name).await.expect("connect");
    db.ping().await.expect("ping");
    Some(db)
}

pub async fn drop_db(db: Database) {
    db.inner().drop(None).await.expect("drop database");
}
