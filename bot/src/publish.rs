//! Tag image lokal ke namespace registry lalu push, dengan konfirmasi operator.

use std::io::{BufRead, Write};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::prompt;
use crate::runner::{run_checked, CommandRunner};

pub const DEFAULT_LOCAL_IMAGE: &str = "tgbot:latest";

// Aturan nama repository docker (disederhanakan)
static NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*(?:/[a-z0-9]+(?:[._-][a-z0-9]+)*)*$").expect("namespace regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("tag regex"));

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub docker: String,
    pub local_image: String,
    pub registry: Option<String>,
    pub namespace: Option<String>,
    pub tag: Option<String>,
    /// Lewati prompt konfirmasi.
    pub assume_yes: bool,
}

/// `tgbot:1.2` -> (`tgbot`, `1.2`). Tag default `latest`.
fn split_image(image: &str) -> (&str, &str) {
    let name_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[name_start..].rfind(':') {
        Some(i) => (&image[name_start..name_start + i], &image[name_start + i + 1..]),
        None => (&image[name_start..], "latest"),
    }
}

/// `[registry/]namespace/name:tag`
pub fn target_reference(local_image: &str, registry: Option<&str>, namespace: &str, tag: Option<&str>) -> Result<String> {
    let namespace = namespace.trim().trim_matches('/');
    if !NAMESPACE_RE.is_match(namespace) {
        return Err(Error::Config(format!("namespace registry tidak valid: `{}`", namespace)));
    }
    let (name, local_tag) = split_image(local_image.trim());
    if name.is_empty() {
        return Err(Error::Config(format!("nama image tidak valid: `{}`", local_image)));
    }
    let tag = tag.unwrap_or(local_tag);
    if !TAG_RE.is_match(tag) {
        return Err(Error::Config(format!("tag image tidak valid: `{}`", tag)));
    }

    let prefix = registry
        .map(|r| r.trim().trim_end_matches('/'))
        .filter(|r| !r.is_empty())
        .map(|r| format!("{}/", r))
        .unwrap_or_default();
    Ok(format!("{}{}/{}:{}", prefix, namespace, name, tag))
}

/// Jalankan alur publish. Jawaban negatif -> [`Error::Aborted`] tanpa
/// menjalankan `docker tag` maupun `docker push`.
pub async fn publish<R: BufRead, W: Write>(
    runner: &dyn CommandRunner,
    options: &PublishOptions,
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    let namespace = match options.namespace.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(ns) => ns.to_string(),
        None => prompt::ask(input, output, "Namespace registry: ")?,
    };
    if namespace.is_empty() {
        return Err(Error::Config("namespace registry wajib diisi".to_string()));
    }

    let target = target_reference(
        &options.local_image,
        options.registry.as_deref(),
        &namespace,
        options.tag.as_deref(),
    )?;

    writeln!(output, "Image lokal : {}", options.local_image)?;
    writeln!(output, "Target      : {}", target)?;
    if !options.assume_yes && !prompt::confirm(input, output, "Tag dan push image ini?")? {
        log::warn!("Publish dibatalkan, tidak ada tag/push yang dijalankan");
        return Err(Error::Aborted);
    }

    log::info!("🏷️ docker tag {} {}", options.local_image, target);
    let tag_args = vec!["tag".to_string(), options.local_image.clone(), target.clone()];
    run_checked(runner, &options.docker, &tag_args, None).await?;

    log::info!("📦 docker push {}", target);
    let push_args = vec!["push".to_string(), target.clone()];
    let pushed = run_checked(runner, &options.docker, &push_args, None).await?;
    log::debug!("{}", String::from_utf8_lossy(&pushed.stdout));

    log::info!("✅ Image terpublikasi: {}", target);
    Ok(target)
}
