use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use uuid::Uuid;

mod cli;
mod config;
mod context;
mod devices;
mod diagnosis;
mod errors;
mod locale;
mod log;
mod prompt;
mod provider;
mod session;
mod ux;
mod validate;
mod wire;
mod wizard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let config_path = args
        .config
        .as_ref()
        .map(PathBuf::from)
        .or_else(config::Config::default_path);
    let mut cfg = match &config_path {
        Some(path) => config::Config::load(path)?,
        None => config::Config::default(),
    };
    // Persist only what the user toggles in-session, not one-off flags.
    let saved = cfg.clone();
    cfg.apply_args(&args);

    let ctx = context::AppContext::load(cfg.language, cfg.theme)
        .context("loading bundled catalogs")?;

    if args.debug {
        println!("debug: flag enabled");
        println!(
            "debug: provider {:?}, model {}",
            cfg.provider,
            cfg.model
                .as_deref()
                .unwrap_or_else(|| provider::default_model(cfg.provider))
        );
    }

    let prov = provider::make_provider(
        cfg.provider,
        cfg.model.clone(),
        cfg.timeout_secs,
        cfg.base_url.clone(),
    )?;

    let mut client = diagnosis::DiagnosisClient::new(prov).with_debug(args.debug);
    if args.save_transcript {
        let run_id = Uuid::new_v4();
        let dir = Path::new(&cfg.transcript_dir).to_path_buf();
        if args.debug {
            log::print_planned_paths(&dir, run_id);
        }
        client = client.with_transcript(dir, run_id);
    }

    let wiz = wizard::Wizard::new(ctx, cfg.order_prefix.clone());
    let mut prefs = saved;
    prefs.language = cfg.language;
    prefs.theme = cfg.theme;
    session::Session::new(wiz, &client, prefs, config_path)
        .run()
        .await
}
