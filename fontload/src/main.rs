use std::{
    collections::HashSet,
    env,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use fontload::{Config, FontDbSubsystem, FontLoadCache, FontSources, PlatformFontLoadError};
use futures_util::future;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The path of config file.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective config and exit.
    #[arg(long, default_missing_value = "true")]
    dump_config: bool,

    /// Fonts to load, e.g. "16px CustomFont" or "italic bold 12px Georgia, serif".
    #[arg(value_name = "FONT")]
    fonts: Vec<String>,
}

fn config_path(args: &Args) -> Result<PathBuf> {
    let path = if let Ok(path) = env::var("FONTLOAD_CONFIG") {
        Path::new(&path).to_path_buf()
    } else if let Some(path) = &args.config {
        path.clone()
    } else if let Ok(home_path) = env::var("HOME") {
        let mut buf = PathBuf::new();
        buf.push(home_path);
        buf.push(".config/fontload/config.toml");
        buf
    } else {
        anyhow::bail!("can't get the path of config file, specify it by -c or FONTLOAD_CONFIG");
    };
    Ok(path)
}

/// Config fonts first, then the command line ones, each font once.
fn fonts_to_load(preload: &[String], args: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    preload
        .iter()
        .chain(args.iter())
        .filter(|font| seen.insert(font.as_str()))
        .cloned()
        .collect()
}

/// One line per font, and whether every font loaded.
fn report(
    fonts: &[String],
    results: Vec<Result<(), PlatformFontLoadError>>,
) -> (Vec<String>, bool) {
    let mut all_loaded = true;
    let lines = fonts
        .iter()
        .zip(results)
        .map(|(font, res)| match res {
            Ok(()) => format!("loaded\t{font}"),
            Err(e) => {
                all_loaded = false;
                format!("failed\t{font}\t{}", e.kind())
            }
        })
        .collect();
    (lines, all_loaded)
}

fn exit_code(outcome: &Result<bool>) -> i32 {
    match outcome {
        Ok(true) => 0,
        Ok(false) | Err(_) => 1,
    }
}

/// Returns false if any font failed to load.
async fn run(args: Args) -> Result<bool> {
    let config = Config::new(&config_path(&args)?)?;
    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(true);
    }

    let _log_guard = fontload_common::log::init_log(
        config.log_directives(),
        config.log_timestamp().unwrap_or(false),
    )?;

    let platform = Arc::new(FontDbSubsystem::new(FontSources::from(&config)));
    let cache = FontLoadCache::with_policy(platform.clone(), config.failure_policy());

    let fonts = fonts_to_load(config.preload_fonts(), &args.fonts);
    if fonts.is_empty() {
        anyhow::bail!("no font to load, pass FONT or set preload_fonts in the config");
    }

    let loads = future::join_all(fonts.iter().map(|font| cache.load(font)));
    let results = tokio::select! {
        results = loads => results,
        signal = fontload_common::signal::termination() => {
            signal?;
            anyhow::bail!(
                "interrupted with {} of {} fonts loaded",
                cache.loaded_fonts().len(),
                fonts.len()
            );
        }
    };
    tracing::debug!(
        "{} faces known, loaded fonts: {:?}",
        platform.face_count(),
        cache.loaded_fonts()
    );

    let (lines, all_loaded) = report(&fonts, results);
    for line in lines {
        println!("{line}");
    }
    Ok(all_loaded)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let outcome = run(args).await;
    if let Err(e) = &outcome {
        eprintln!("run command failed: {e}");
    }
    process::exit(exit_code(&outcome));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn config_fonts_come_first_without_duplicates() {
        let preload = strings(&["16px CustomFont", "bold 12px serif", "16px CustomFont"]);
        let args = strings(&["12px Arial", "bold 12px serif", "12px Arial"]);
        assert_eq!(
            fonts_to_load(&preload, &args),
            strings(&["16px CustomFont", "bold 12px serif", "12px Arial"])
        );
        assert!(fonts_to_load(&[], &[]).is_empty());
    }

    #[test]
    fn any_failure_fails_the_run() {
        let fonts = strings(&["16px A", "16px Missing"]);
        let (lines, all_loaded) = report(
            &fonts,
            vec![
                Ok(()),
                Err(PlatformFontLoadError::no_matching_face("16px Missing")),
            ],
        );
        assert_eq!(
            lines,
            strings(&["loaded\t16px A", "failed\t16px Missing\tno matching font face"])
        );
        assert!(!all_loaded);
        assert_eq!(exit_code(&Ok(all_loaded)), 1);
    }

    #[test]
    fn exit_codes() {
        let (_, all_loaded) = report(&strings(&["16px A"]), vec![Ok(())]);
        assert!(all_loaded);
        assert_eq!(exit_code(&Ok(all_loaded)), 0);
        assert_eq!(exit_code(&Err(anyhow::anyhow!("no font to load"))), 1);
    }
}
