//! `speedway minify`: write `.min` siblings for stylesheets and scripts.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use rayon::prelude::*;

use super::MinifyArgs;
use super::common::{collect_files, plural_count};
use crate::config::Config;
use crate::log;
use crate::minify::{is_minifiable, write_minified};

pub fn minify_files(args: &MinifyArgs, config: &Config) -> Result<()> {
    let files = collect_files(&args.paths, config.document_root(), is_minifiable)?;
    if files.is_empty() {
        log!("minify"; "no stylesheets or scripts found");
        return Ok(());
    }

    let engine = config.minify.engine;
    let written = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    files.par_iter().for_each(|path| match write_minified(path, engine) {
        Ok(Some(_)) => {
            written.fetch_add(1, Ordering::Relaxed);
        }
        Ok(None) => {}
        Err(e) => {
            failed.fetch_add(1, Ordering::Relaxed);
            log!("minify"; "{:#}", e);
        }
    });

    let failed = failed.into_inner();
    log!(
        "minify";
        "wrote {} ({:?} engine){}",
        plural_count(written.into_inner(), "file"),
        engine,
        if failed > 0 { format!(", {failed} failed") } else { String::new() }
    );
    Ok(())
}
