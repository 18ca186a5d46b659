mod apply;
mod args;
mod client;
mod executor;
mod format;
mod interrupt;
mod plan;
mod report;
mod timing;

use std::process;

use anyhow::{Context, Result};
use apply::confirm;
use args::Args;
use clap::Parser;
use client::CqlClient;
use executor::{apply_all, fail_all};
use gcgrace_common::config::{load_descriptor, DescriptorFile};
use gcgrace_common::statement::render_script;
use gcgrace_common::ApplyError;
use plan::PlanOutput;
use report::{Report, EXIT_FATAL, EXIT_OK};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("gcgrace: error: {:#}", e);
            process::exit(EXIT_FATAL);
        }
    }
}

async fn run() -> Result<i32> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.print_default_descriptor {
        print!("{}", default_descriptor_toml()?);
        return Ok(EXIT_OK);
    }

    let descriptor = load_descriptor(args.descriptor.as_deref(), args.keyspace.as_deref())
        .context("Descriptor rejected, no statements were sent")?;
    debug!(
        "Descriptor: keyspace={} alterations={}",
        descriptor.keyspace(),
        descriptor.len()
    );

    if args.script {
        print!("{}", render_script(&descriptor));
        return Ok(EXIT_OK);
    }

    let mode = args.output_mode();
    let plan = PlanOutput::for_descriptor(&descriptor, &args.hosts);

    if !args.apply {
        print!("{}", plan.render(mode));
        return Ok(EXIT_OK);
    }

    let prompt = format!(
        "Alter {} in keyspace '{}' (risk {})?",
        format::tables(descriptor.len()),
        descriptor.keyspace(),
        plan.risk
    );
    if !confirm(args.yes, &prompt)? {
        eprintln!("Aborted, no tables were altered.");
        return Ok(EXIT_FATAL);
    }

    let results = match CqlClient::connect(&args).await {
        Ok(client) => {
            info!("Connected to {}", client.hosts.join(","));
            let cancel = CancellationToken::new();
            interrupt::spawn_handler(cancel.clone());
            apply_all(&client, &descriptor, &args.executor_options(), &cancel).await
        }
        Err(e) => {
            error!("Could not connect to the cluster: {:#}", e);
            fail_all(&descriptor, &ApplyError::Connection(format!("{:#}", e)))
        }
    };
    let report = Report::new(descriptor.keyspace(), results);
    print!("{}", report.render(mode));

    Ok(report.exit_code())
}

fn default_descriptor_toml() -> Result<String> {
    let file = DescriptorFile::embedded_default().context("Embedded descriptor is invalid")?;
    file.to_toml().context("Could not render the default descriptor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcgrace_common::config::Format;

    #[test]
    fn test_printed_default_descriptor_loads_back() {
        let rendered = default_descriptor_toml().unwrap();
        let printed = DescriptorFile::parse(&rendered, Format::Toml)
            .unwrap()
            .into_descriptor(None)
            .unwrap();
        let embedded = load_descriptor(None, None).unwrap();

        assert_eq!(printed.keyspace(), "otter");
        assert_eq!(render_script(&printed), render_script(&embedded));
    }
}
