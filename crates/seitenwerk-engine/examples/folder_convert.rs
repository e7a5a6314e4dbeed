// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch-convert every PDF in a folder to PNG page images, printing job
// events as they arrive:
//
//     cargo run --example folder_convert -- ./pdfs ./out

use std::path::PathBuf;

use seitenwerk_core::types::{JobEventKind, TargetFormat};
use seitenwerk_engine::EngineServices;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: folder_convert <input-dir> <output-dir>");
        std::process::exit(2);
    };

    let (services, events) = EngineServices::init()?;
    services.enqueue_batch(
        PathBuf::from(input),
        PathBuf::from(output),
        TargetFormat::Png,
        None,
    );

    for event in events {
        match event.kind {
            JobEventKind::Started => println!("[{}] started", event.job_id),
            JobEventKind::Progress(percent) => println!("[{}] {percent}%", event.job_id),
            JobEventKind::Finished { status, message } => {
                println!("[{}] {status:?}: {message}", event.job_id);
                break;
            }
        }
    }

    Ok(())
}
