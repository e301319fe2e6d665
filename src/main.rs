use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::{
    cli::{Cli, Command, CreateOpts, LogsCommand},
    error::CiteError,
    extract::PageMetadata,
    fields::Field,
    store::LogStore,
    style::{Citation, RenderOptions},
};

mod cli;
mod error;
mod extract;
mod fields;
mod store;
mod style;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    match args.command {
        Command::Create { url, opts } => {
            let overrides = opts.parsed_overrides()?;
            let citation = generate(&url, &opts, &overrides)?;
            if opts.dump() {
                println!("{}", citation.rendered);
            }
            if opts.log() {
                let store = LogStore::open(&db_path(&opts.db))?;
                store.append(&citation)?;
            }
            if opts.copy() {
                copy_to_clipboard(&citation.rendered);
            }
        }
        Command::Batch { file, opts } => {
            let overrides = opts.parsed_overrides()?;
            let urls: Vec<String> = std::fs::read_to_string(&file)
                .map_err(CiteError::Io)?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();

            let store = if opts.log() {
                Some(LogStore::open(&db_path(&opts.db))?)
            } else {
                None
            };

            let pb = ProgressBar::new(urls.len() as u64).with_style(
                ProgressStyle::with_template("{pos}/{len} {wide_bar} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let mut rendered = Vec::new();
            let mut failed = 0usize;
            for url in &urls {
                pb.set_message(url.clone());
                // A store write failure counts against this URL only; the
                // rest of the batch still runs.
                let result = generate(url, &opts, &overrides).and_then(|citation| {
                    if let Some(store) = &store {
                        store.append(&citation)?;
                    }
                    Ok(citation)
                });
                match result {
                    Ok(citation) => {
                        if opts.dump() {
                            pb.suspend(|| println!("{}", citation.rendered));
                        }
                        rendered.push(citation.rendered);
                    }
                    Err(e) => {
                        pb.suspend(|| eprintln!("{} {url}: {e}", "✗".red()));
                        failed += 1;
                    }
                }
                pb.inc(1);
            }
            pb.finish_and_clear();
            let ok = rendered.len();
            eprintln!("{} {ok} {} {failed}", "✓".green(), "✗".red());
            if opts.copy() && !rendered.is_empty() {
                copy_to_clipboard(&rendered.join("\n"));
            }
            if ok == 0 {
                std::process::exit(1);
            }
        }
        Command::Logs { command } => match command {
            LogsCommand::List { count, query, db } => {
                let store = LogStore::open(&db_path(&db))?;
                for record in store.list(count, query.as_deref())? {
                    println!(
                        "[{}] {}  {}",
                        record.id,
                        record.created_at.format("%Y-%m-%d %H:%M").dimmed(),
                        record.rendered
                    );
                }
            }
            LogsCommand::Path { db } => {
                println!("{}", db_path(&db).display());
            }
        },
    }
    Ok(())
}

fn db_path(db: &Option<PathBuf>) -> PathBuf {
    db.clone().unwrap_or_else(LogStore::default_path)
}

/// Best effort: headless sessions have no clipboard to talk to, and a
/// citation that printed fine should not fail over it.
fn copy_to_clipboard(text: &str) {
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        let _ = clipboard.set_text(text);
    }
}

/// Fetch, extract, apply overrides, render.
fn generate(
    url: &str,
    opts: &CreateOpts,
    overrides: &[(Field, &str)],
) -> Result<Citation, CiteError> {
    let meta = PageMetadata::resolve(url)?;
    let access_date =
        (!opts.no_date).then(|| Utc::now().format("%d %B %Y").to_string());
    let mut fields = meta.into_fields(url, access_date);
    for (field, value) in overrides {
        fields.apply_override(*field, value);
    }
    let render_opts = RenderOptions {
        omit_date: opts.no_date,
        omit_url: opts.no_url,
    };
    Ok(Citation::new(opts.fmt, fields, &render_opts))
}
