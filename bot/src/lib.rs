//! tgbot: alat operasional untuk deployment bot Telegram + dashboard web:
//! bootstrap MongoDB, publish image container, dan patch template.

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod patch;
pub mod prompt;
pub mod publish;
pub mod runner;
pub mod store;

pub use config::Config;
pub use database::Database;
pub use error::{Error, Result};
