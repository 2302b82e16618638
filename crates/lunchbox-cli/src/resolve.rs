//! `lunchbox-cli resolve` — runs the title resolver against an indexed
//! games database from the command line.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use lunchbox_core::resolver::{
    resolve, MediaType, Resolution, ResolverConfig, SqlxCorpusAccessor, TagFilter, TagOperator,
};

fn parse_media_type(s: &str) -> MediaType {
    match s.to_ascii_lowercase().as_str() {
        "movie" => MediaType::Movie,
        "application" | "app" => MediaType::Application,
        _ => MediaType::Game,
    }
}

/// Parses a `--tag` flag value: `type:value`, `+type:value`, `or:type:value`,
/// or `not:type:value`.
fn parse_tag_arg(raw: &str) -> Result<TagFilter> {
    let (operator, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (TagOperator::And, rest)
    } else if let Some(rest) = raw.strip_prefix("or:") {
        (TagOperator::Or, rest)
    } else if let Some(rest) = raw.strip_prefix("not:") {
        (TagOperator::Not, rest)
    } else {
        (TagOperator::And, raw)
    };

    let (tag_type, value) = rest
        .split_once(':')
        .with_context(|| format!("tag filter `{raw}` must be `type:value`"))?;

    Ok(TagFilter::new(tag_type, value, operator))
}

pub async fn cmd_resolve(
    database: &Path,
    system: &str,
    title: &str,
    tag_args: &[String],
    media_type: &str,
    json: bool,
) -> Result<()> {
    let db_url = format!("sqlite:{}?mode=ro", database.display());
    let pool = SqlitePool::connect(&db_url)
        .await
        .with_context(|| format!("opening games database at {}", database.display()))?;

    let tag_filters = tag_args
        .iter()
        .map(|raw| parse_tag_arg(raw))
        .collect::<Result<Vec<_>>>()?;

    let accessor = SqlxCorpusAccessor::new(pool);
    let config = ResolverConfig::default();
    let cancel = CancellationToken::new();

    let resolution = resolve(
        system,
        title,
        &tag_filters,
        parse_media_type(media_type),
        &config,
        &accessor,
        &cancel,
    )
    .await?;

    if json {
        print_json(&resolution);
    } else {
        print_human(title, &resolution);
    }

    Ok(())
}

fn print_human(title: &str, resolution: &Resolution) {
    match resolution {
        Resolution::Match { result, confidence, strategy_id, low_confidence } => {
            println!("\"{title}\" -> {}", result.media.name);
            println!("  file:        {}", result.file_path);
            println!("  strategy:    {strategy_id}");
            println!("  confidence:  {confidence:.3}{}", if *low_confidence { " (low)" } else { "" });
        }
        Resolution::NoMatch => {
            println!("\"{title}\" -> no match");
        }
    }
}

fn print_json(resolution: &Resolution) {
    match resolution {
        Resolution::Match { result, confidence, strategy_id, low_confidence } => {
            println!(
                "{{\"matched\":true,\"name\":{:?},\"file_path\":{:?},\"strategy_id\":{:?},\"confidence\":{:.6},\"low_confidence\":{}}}",
                result.media.name, result.file_path, strategy_id, confidence, low_confidence
            );
        }
        Resolution::NoMatch => {
            println!("{{\"matched\":false}}");
        }
    }
}
