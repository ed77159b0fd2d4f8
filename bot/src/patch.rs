//! Kosongkan base URL klien yang ter-hardcode di template web, supaya
//! browser memakai origin yang sama dengan halaman.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::runner::{run_checked, CommandRunner};

pub const DEFAULT_TEMPLATE_PATH: &str = "/app/templates/base.html";

static BASE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<key>\b(?:API_BASE_URL|BASE_URL|apiBaseUrl|baseURL|baseUrl)\s*[:=]\s*)(?P<value>"[^"\n]*"|'[^'\n]*'|`[^`\n]*`)"#,
    )
    .expect("base url regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub replaced: usize,
}

/// Ganti nilai setiap assignment base URL dengan string kosong (kutip dipertahankan).
/// Nilai yang sudah kosong tidak dihitung.
pub fn rewrite_base_url(text: &str) -> Rewrite {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = 0;

    for caps in BASE_URL_RE.captures_iter(text) {
        let (Some(whole), Some(key), Some(value)) = (caps.get(0), caps.name("key"), caps.name("value")) else {
            continue;
        };
        if value.as_str().len() == 2 {
            continue;
        }
        let quote = &value.as_str()[..1];
        out.push_str(&text[last..whole.start()]);
        out.push_str(key.as_str());
        out.push_str(quote);
        out.push_str(quote);
        last = whole.end();
        replaced += 1;
    }
    out.push_str(&text[last..]);

    Rewrite { text: out, replaced }
}

pub async fn patch_local(path: &Path) -> Result<usize> {
    let original = tokio::fs::read_to_string(path).await?;
    let rewrite = rewrite_base_url(&original);
    if rewrite.replaced == 0 {
        log::warn!("Tidak ada base URL yang perlu diganti di {}", path.display());
        return Ok(0);
    }
    tokio::fs::write(path, rewrite.text).await?;
    log::info!("✅ {} base URL dikosongkan di {}", rewrite.replaced, path.display());
    Ok(rewrite.replaced)
}

/// Baca template lewat `docker exec`, tulis balik lewat stdin.
pub async fn patch_container(runner: &dyn CommandRunner, docker: &str, container: &str, path: &str) -> Result<usize> {
    let read_args: Vec<String> = ["exec", container, "cat", path].iter().map(|s| s.to_string()).collect();
    let output = run_checked(runner, docker, &read_args, None).await?;
    let original = String::from_utf8(output.stdout)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let rewrite = rewrite_base_url(&original);
    if rewrite.replaced == 0 {
        log::warn!("Tidak ada base URL yang perlu diganti di {}:{}", container, path);
        return Ok(0);
    }

    // path dioper sebagai $1, bukan disisipkan ke skrip shell
    let write_args: Vec<String> = ["exec", "-i", container, "sh", "-c", "cat > \"$1\"", "sh", path]
        .iter()
        .map(|s| s.to_string())
        .collect();
    run_checked(runner, docker, &write_args, Some(rewrite.text.into_bytes())).await?;

    log::info!("✅ {} base URL dikosongkan di {}:{}", rewrite.replaced, container, path);
    Ok(rewrite.replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::{ok, RecordingRunner};
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrites_common_assignments() {
        let template = r#"<script>
const API_BASE_URL = "http://192.168.1.10:7000";
let cfg = { baseURL: 'http://localhost:7000/api', timeout: 5000 };
</script>"#;
        let rewrite = rewrite_base_url(template);
        assert_eq!(rewrite.replaced, 2);
        assert_eq!(
            rewrite.text,
            r#"<script>
const API_BASE_URL = "";
let cfg = { baseURL: '', timeout: 5000 };
</script>"#
        );
    }

    #[test]
    fn leaves_other_identifiers_and_comparisons_alone() {
        let template = r#"var MY_BASE_URL = "x"; if (baseUrl == "y") {} const BASE_URL = "";"#;
        let rewrite = rewrite_base_url(template);
        assert_eq!(rewrite.replaced, 0);
        assert_eq!(rewrite.text, template);
    }

    #[test]
    fn second_pass_is_a_noop() {
        let once = rewrite_base_url("window.apiBaseUrl = `https://bot.example.com`;");
        assert_eq!(once.text, "window.apiBaseUrl = ``;");
        assert_eq!(rewrite_base_url(&once.text).replaced, 0);
    }

    #[tokio::test]
    async fn patch_local_writes_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.html");
        tokio::fs::write(&path, "const BASE_URL = 'http://old';").await.unwrap();

        assert_eq!(patch_local(&path).await.unwrap(), 1);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "const BASE_URL = '';");
        assert_eq!(patch_local(&path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn patch_container_reads_then_writes_back() {
        let runner = RecordingRunner::with_replies(vec![ok("const API_BASE_URL = \"http://x\";")]);
        let replaced = patch_container(&runner, "docker", "tgbot", "/app/templates/base.html")
            .await
            .unwrap();
        assert_eq!(replaced, 1);

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, vec!["exec", "tgbot", "cat", "/app/templates/base.html"]);
        assert_eq!(calls[1].1[..3], ["exec".to_string(), "-i".to_string(), "tgbot".to_string()]);
        assert_eq!(calls[1].1.last().map(String::as_str), Some("/app/templates/base.html"));
        assert_eq!(calls[1].2.as_deref(), Some(&b"const API_BASE_URL = \"\";"[..]));
    }

    #[tokio::test]
    async fn patch_container_skips_write_without_match() {
        let runner = RecordingRunner::with_replies(vec![ok("<html></html>")]);
        assert_eq!(patch_container(&runner, "docker", "tgbot", "/t.html").await.unwrap(), 0);
        assert_eq!(runner.calls().len(), 1);
    }
}
