mod cli;
mod error;

use crate::cli::{Cli, Commands};
use crate::error::{ErrorKind, Result};
use ampstory_catalog::{Database, Repository};
use ampstory_config::Config;
use ampstory_content::models::StoryPage;
use ampstory_fetch::{FetchOptions, HttpFetcher};
use ampstory_library::{Context, ImportReport, import_all, render_story};
use ampstory_storage::backend::LocalBackend;
use clap::Parser;
use exn::{OptionExt, ResultExt};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };
    init_logging(&config, cli.verbose);

    let result = match cli.command {
        Commands::Import { story } => import(&config, &story).await,
        Commands::Render { slug } => render(&config, &slug).await,
        Commands::Scan { file } => scan(&file).await,
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).or_raise(|| ErrorKind::Config)
}

/// Logs go to stderr so rendered documents can be piped from stdout.
fn init_logging(config: &Config, verbose: u8) {
    let directive = match verbose {
        0 => config.log.filter.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn context(config: &Config) -> Result<(Context, Database)> {
    let backend = LocalBackend::new("media", &config.media.root).or_raise(|| ErrorKind::Setup("media storage"))?;
    if let Some(parent) = config.database.path.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Setup("database directory"))?;
    }
    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Setup("catalog"))?;
    let options = FetchOptions {
        timeout: config.fetch.timeout(),
        user_agent: config.fetch.user_agent.clone(),
        max_body_bytes: config.fetch.max_body_bytes,
    };
    let fetcher = HttpFetcher::new(&options).or_raise(|| ErrorKind::Setup("http client"))?;
    tracing::debug!(database = %config.database.path.display(), media = %config.media.root.display(), "Opened media library");
    let ctx = Context::new(Arc::new(backend), Repository::from(&db), Arc::new(fetcher), config.media.url.as_str());
    Ok((ctx, db))
}

async fn read_story(path: &Path) -> Result<StoryPage> {
    let text = tokio::fs::read_to_string(path).await.or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let mut story: StoryPage = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&text).or_raise(|| ErrorKind::StoryFile(path.to_path_buf()))?,
        _ => serde_json::from_str(&text).or_raise(|| ErrorKind::StoryFile(path.to_path_buf()))?,
    };
    story.ensure_slug();
    story.validate().or_raise(|| ErrorKind::InvalidStory)?;
    Ok(story)
}

async fn import(config: &Config, path: &Path) -> Result<ExitCode> {
    let mut story = read_story(path).await?;
    let (ctx, db) = context(config).await?;
    let imported = import_all(&ctx, &mut story).await;
    // Whatever was rewritten before a fatal error is kept.
    let saved = ctx.catalog().save_story(&story).await.or_raise(|| ErrorKind::Catalog);
    db.close().await;
    let report = imported.or_raise(|| ErrorKind::Import)?;
    let id = saved?;
    tracing::info!(slug = %story.slug, story_id = %id, "Saved story");

    print_report(&report)?;
    Ok(if report.is_complete() { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

fn print_report(report: &ImportReport) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for imported in &report.imported {
        writeln!(out, "{:<8} {:<40} {}", imported.outcome, imported.asset, imported.url).or_raise(|| ErrorKind::Output)?;
    }
    for failed in &report.failed {
        writeln!(out, "{:<8} {:<40} {}", "failed", failed.error, failed.url).or_raise(|| ErrorKind::Output)?;
    }
    Ok(())
}

async fn render(config: &Config, slug: &str) -> Result<ExitCode> {
    let (ctx, db) = context(config).await?;
    let story = ctx
        .catalog()
        .get_story_by_slug(slug)
        .await
        .or_raise(|| ErrorKind::Catalog)?
        .ok_or_raise(|| ErrorKind::NotFound(slug.to_string()))?;
    let html = render_story(&ctx, &story).await;
    db.close().await;
    let html = html.or_raise(|| ErrorKind::Render)?;
    std::io::stdout().lock().write_all(html.as_bytes()).or_raise(|| ErrorKind::Output)?;
    Ok(ExitCode::SUCCESS)
}

/// One JSON object per reference, in document order.
async fn scan(path: &Path) -> Result<ExitCode> {
    let html = tokio::fs::read_to_string(path).await.or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let mut out = std::io::stdout().lock();
    for reference in ampstory_content::scan(&html) {
        let line = serde_json::to_string(&reference).or_raise(|| ErrorKind::Output)?;
        writeln!(out, "{line}").or_raise(|| ErrorKind::Output)?;
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const STORY_JSON: &str = r#"{
        "title": "Wagtail spotting",
        "publisher": "Torchbox",
        "publisher_logo_src_original": "https://example.com/torchbox.png",
        "pages": [{"id": "cover", "html": "<amp-story-page id=\"cover\"></amp-story-page>"}]
    }"#;

    const STORY_TOML: &str = r#"
        title = "Wagtail spotting"
        publisher = "Torchbox"
        publisher_logo_src_original = "https://example.com/torchbox.png"

        [[pages]]
        id = "cover"
        html = '<amp-story-page id="cover"></amp-story-page>'
    "#;

    #[rstest]
    #[case::json("story.json", STORY_JSON)]
    #[case::toml("story.toml", STORY_TOML)]
    #[tokio::test]
    async fn test_read_story(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();

        let story = read_story(&path).await.unwrap();
        assert_eq!(story.slug, "wagtail-spotting");
        assert_eq!(story.publisher_logo_src_original(), Some("https://example.com/torchbox.png"));
        assert_eq!(story.pages.len(), 1);
        assert_eq!(story.pages[0].id, "cover");
    }

    #[rstest]
    #[case::syntax("story.json", "{", "could not parse")]
    #[case::no_title("story.json", r#"{"publisher": "Torchbox"}"#, "not valid")]
    #[tokio::test]
    async fn test_read_story_rejects(#[case] name: &str, #[case] contents: &str, #[case] message: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();

        let err = read_story(&path).await.unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }

    #[tokio::test]
    async fn test_read_story_missing_file() {
        let err = read_story(Path::new("/definitely/not/here.json")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Read(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/ampstory.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config));
        assert_eq!(err.to_string(), "could not load configuration");
    }
}
