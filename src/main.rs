//! Entry point for the minisym inspection tool.
//!
//! 1. Parse command-line arguments using `clap`.
//! 2. Load every input as one or more containers.
//! 3. Resolve each requested address and print the symbol found.
//! 4. Unload all containers, which invalidates the handles minted in step 3.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use std::fs::File;
use tracing_subscriber::EnvFilter;

use minisym::config::Config;
use minisym::layout::Placement;
use minisym::{loader, Error, SessionOptions, SymbolSession};

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut session = SymbolSession::with_options(SessionOptions {
        handle_limit: config.handle_limit,
    });
    let mut placement = Placement::new(config.base);

    for path in &config.inputs {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mmap = unsafe { Mmap::map(&file)? };
        let name = path.display().to_string();
        for image in loader::load_images(&name, &mmap, &mut placement)? {
            let image_name = image.name.clone();
            session
                .notify_container_loaded(image)
                .with_context(|| format!("failed to load {image_name}"))?;
        }
    }

    let mut handles = Vec::new();
    for &address in &config.addresses {
        match session.resolve(address) {
            Ok(handle) => {
                println!(
                    "0x{address:x}: {} at 0x{:x}",
                    session.display(&handle)?,
                    session.address(&handle)?
                );
                handles.push(handle);
            }
            Err(Error::NotFound { .. }) => println!("0x{address:x}: no symbol"),
            Err(e) => return Err(e.into()),
        }
    }

    let ids: Vec<_> = session.containers().map(|(id, _)| id).collect();
    for id in ids {
        session.notify_container_unloaded(id);
    }
    let stale = handles.iter().filter(|h| !session.is_valid(h)).count();
    tracing::debug!("{stale} of {} handles invalidated on unload", handles.len());

    Ok(())
}
