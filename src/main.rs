// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use branchline::config::{load_and_validate_topology, TaskRegistry};
use branchline::data::PipelineData;
use branchline::engine::Pipeline;
use branchline::errors::BranchFailure;
use branchline::tasks::text::{TokenCounts, TOKEN_COUNTS_KEY};
use branchline::traits::PipelineObserver;

const RETRY_INTERVAL: Duration = Duration::from_millis(5);

/// Prints the result of every branch round.
struct PrintingObserver;

impl PipelineObserver<String> for PrintingObserver {
    fn on_output(&self, branch_id: &str, data: &Arc<PipelineData<String>>) {
        match data.meta().get_attachment::<TokenCounts>(TOKEN_COUNTS_KEY) {
            Some(counts) => println!(
                "[round {}] {:<16} {:?}  (chars={}, words={}, lines={})",
                data.round(),
                branch_id,
                data.payload(),
                counts.chars,
                counts.words,
                counts.lines
            ),
            None => println!(
                "[round {}] {:<16} {:?}",
                data.round(),
                branch_id,
                data.payload()
            ),
        }
    }

    fn on_failure(&self, failure: &BranchFailure) {
        eprintln!("[round {}] {}", failure.round, failure);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <topology.yaml> <input>...", args[0]);
        eprintln!("Example: {} configs/text-fanout.yaml \"hello world\"", args[0]);
        std::process::exit(1);
    }

    let topology_file = &args[1];
    let inputs = &args[2..];

    let topology = load_and_validate_topology(topology_file)
        .with_context(|| format!("loading {}", topology_file))?;
    let registry = TaskRegistry::with_text_tasks();
    let pipeline = Pipeline::construct(&topology, &registry)?;

    println!("Pipeline:  {}", pipeline.name());
    println!("Policy:    {}", pipeline.sync_policy());
    for branch_id in pipeline.branch_ids() {
        let nodes = pipeline.branch_nodes(branch_id).unwrap_or_default();
        println!("Branch:    {} [{}]", branch_id, nodes.join(" -> "));
    }
    println!();

    pipeline.register_observer(Arc::new(PrintingObserver));

    for input in inputs {
        // Back-pressure: the root branch takes one round at a time.
        let mut attempts = 0_u32;
        while !pipeline.add_process_data(input.clone()) {
            attempts += 1;
            if attempts > 2_000 {
                pipeline.stop().await;
                bail!("root branch never became idle for input {:?}", input);
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    pipeline.wait_until_idle().await;
    pipeline.stop().await;
    Ok(())
}
