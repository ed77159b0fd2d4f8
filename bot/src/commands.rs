use std::io;

use serde_json::json;

use crate::bootstrap::{self, BootstrapPlan, BootstrapPolicy};
use crate::cli::{Cli, Commands, SettingsAction};
use crate::config::Config;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::models::SettingsPatch;
use crate::patch;
use crate::publish::{self, PublishOptions};
use crate::runner::SystemRunner;

async fn connect(uri: &str, config: &Config) -> Result<Database> {
    let db = Database::connect(uri, &config.mongo.database).await?;
    db.ping().await?;
    log::info!("Terhubung ke MongoDB `{}`", config.mongo.database);
    Ok(db)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| Error::Io(e.into()))?;
    println!("{}", text);
    Ok(())
}

pub async fn execute(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::InitDb { strict } => {
            let policy = if strict { BootstrapPolicy::Strict } else { BootstrapPolicy::Idempotent };
            let db = connect(&config.mongo_root_uri(), &config).await?;
            let plan = BootstrapPlan::from_config(&config);
            let report = bootstrap::run(&db, &plan, policy).await?;
            if report.is_noop() {
                println!("Database `{}` sudah terprovisi, tidak ada perubahan.", db.name());
            } else {
                println!("Dibuat: {}", report.created.join(", "));
            }
        }
        Commands::Settings { action } => {
            let db = connect(&config.mongo_uri(), &config).await?;
            let settings = match action {
                SettingsAction::Show => db
                    .get_settings()
                    .await?
                    .ok_or_else(|| Error::NotFound("settings (jalankan `tgbot init-db`)".to_string()))?,
                SettingsAction::Set { auto_delete, interval, welcome } => {
                    let patch = SettingsPatch {
                        auto_delete_messages: auto_delete,
                        auto_delete_interval: interval,
                        welcome_message: welcome,
                    };
                    if patch.is_empty() {
                        return Err(Error::Config("tidak ada field yang diubah".to_string()));
                    }
                    db.update_settings(&patch).await?
                }
            };
            // relaxed extended JSON: tanggal tampil sebagai ISO-8601
            print_json(&mongodb::bson::to_bson(&settings)?.into_relaxed_extjson())?;
        }
        Commands::Stats => {
            let db = connect(&config.mongo_uri(), &config).await?;
            let stats = json!({
                "users": db.count_users().await?,
                "groups_active": db.count_groups(true).await?,
                "groups_total": db.count_groups(false).await?,
                "messages": db.count_messages(None).await?,
                "message_types": db.message_type_stats().await?,
            });
            print_json(&stats)?;
        }
        Commands::Config => print_json(&config.redacted())?,
        Commands::Publish { namespace, registry, image, tag, yes } => {
            let options = PublishOptions {
                docker: cli.docker,
                local_image: image,
                registry,
                namespace,
                tag,
                assume_yes: yes,
            };
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            let target = publish::publish(&SystemRunner, &options, &mut input, &mut output).await?;
            println!("{}", target);
        }
        Commands::PatchBaseUrl { container, template, local } => {
            let replaced = match (local, container) {
                (Some(path), _) => patch::patch_local(&path).await?,
                (None, Some(container)) => patch::patch_container(&SystemRunner, &cli.docker, &container, &template).await?,
                (None, None) => return Err(Error::Config("--container atau --local wajib diisi".to_string())),
            };
            println!("{} base URL diganti", replaced);
        }
    }
    Ok(())
}
