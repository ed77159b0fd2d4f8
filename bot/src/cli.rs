use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::patch::DEFAULT_TEMPLATE_PATH;
use crate::publish::DEFAULT_LOCAL_IMAGE;

#[derive(Parser, Debug)]
#[command(name = "tgbot")]
#[command(author, version, about = "Alat operasional deployment tgbot: bootstrap MongoDB, publish image, patch template", long_about = None)]
pub struct Cli {
    /// Binary docker yang dipakai publish dan patch
    #[arg(long, global = true, env = "DOCKER_BIN", default_value = "docker")]
    pub docker: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provisi database: user aplikasi, koleksi, index, dan settings default
    InitDb {
        /// Gagal (tanpa mengubah apa pun) kalau ada objek yang sudah ada
        #[arg(long)]
        strict: bool,
    },

    /// Lihat atau ubah settings bot
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Ringkasan jumlah user, grup, dan pesan
    Stats,

    /// Tampilkan konfigurasi aktif (rahasia disamarkan)
    Config,

    /// Tag image lokal ke namespace registry lalu push
    Publish {
        /// Namespace registry; ditanyakan kalau kosong
        #[arg(short, long)]
        namespace: Option<String>,

        /// Host registry, misal registry.example.com
        #[arg(long)]
        registry: Option<String>,

        /// Image lokal yang akan dipublikasi
        #[arg(long, default_value = DEFAULT_LOCAL_IMAGE)]
        image: String,

        /// Tag target (default: tag image lokal)
        #[arg(long)]
        tag: Option<String>,

        /// Jangan tanya konfirmasi
        #[arg(short, long)]
        yes: bool,
    },

    /// Kosongkan base URL klien yang ter-hardcode di template web
    PatchBaseUrl {
        /// Nama container yang sedang berjalan
        #[arg(long, required_unless_present = "local", conflicts_with = "local")]
        container: Option<String>,

        /// Path template di dalam container
        #[arg(long, default_value = DEFAULT_TEMPLATE_PATH)]
        template: String,

        /// Patch file lokal, bukan container
        #[arg(long)]
        local: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Cetak dokumen settings sebagai JSON
    Show,
    /// Ubah sebagian field settings
    Set {
        #[arg(long)]
        auto_delete: Option<bool>,

        /// Interval hapus otomatis, dalam menit
        #[arg(long)]
        interval: Option<i32>,

        #[arg(long)]
        welcome: Option<String>,
    },
}

impl Commands {
    /// Perintah yang membaca MongoDB atau mencetak konfigurasi; env tidak valid berarti gagal.
    pub fn requires_config(&self) -> bool {
        matches!(
            self,
            Commands::InitDb { .. } | Commands::Settings { .. } | Commands::Stats | Commands::Config
        )
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
