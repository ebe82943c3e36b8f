//! Reduce command implementation.
//!
//! Wires the configured fetcher, minifier and store into a queue, submits one
//! job and waits for it to land in the repository or fail.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use crossbeam::channel::{self, RecvTimeoutError};

use crate::asset::{CssMinifier, HttpFetcher, UriBuilder};
use crate::cache::ReductionRepository;
use crate::cli::args::ReduceArgs;
use crate::config::ReduceConfig;
use crate::reducer::{Reducer, ReducingQueue, split_urls};
use crate::utils::hash::ContentHash;

/// How often to check the repository while the job runs.
const WAIT_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_reduce(args: &ReduceArgs, config: &ReduceConfig) -> Result<()> {
    crate::logger::set_verbose(args.verbose);

    if split_urls(&args.urls).next().is_none() {
        bail!("no stylesheet urls given");
    }
    let key = args
        .key
        .as_deref()
        .map(|hex| {
            ContentHash::from_hex(hex).ok_or_else(|| anyhow!("`{hex}` is not a 32-digit hex key"))
        })
        .transpose()?;

    let reducer = Reducer::new(
        Arc::new(HttpFetcher::new(config.fetch.timeout())),
        Arc::new(CssMinifier),
        config.open_store()?,
        UriBuilder::from_config(&config.content),
        config.sprite.size_limit(),
    );
    let repository = Arc::new(ReductionRepository::new());
    let queue = ReducingQueue::new(Arc::new(reducer), Arc::clone(&repository));

    let (errors, failed) = channel::unbounded();
    queue.set_error_handler(move |e| {
        let _ = errors.send(e);
    });

    match key {
        Some(key) => queue.enqueue_with_key(key, args.urls.as_str()),
        None => queue.enqueue(args.urls.as_str()),
    }

    let fingerprint = ContentHash::of(&args.urls);
    loop {
        if let Some(url) = repository.find(fingerprint) {
            println!("{url}");
            return Ok(());
        }
        match failed.recv_timeout(WAIT_INTERVAL) {
            Ok(e) => return Err(anyhow::Error::new(e).context("reduction failed")),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => bail!("reduction worker stopped"),
        }
    }
}
