use std::io;
use std::process::ExitCode;

use clap::Parser;
use radius_core::RadiusApi;
use radius_demo::{DemoOptions, PLACEHOLDER_KEY, PLACEHOLDER_URL};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "radius-demo")]
#[command(about = "Exercise every operation of the RADIUS user management API", long_about = None)]
struct Args {
    #[arg(long, env = "RADIUS_API_URL", default_value = PLACEHOLDER_URL, help = "Base URL of the API")]
    url: String,

    #[arg(
        long,
        env = "RADIUS_API_KEY",
        default_value = PLACEHOLDER_KEY,
        hide_env_values = true,
        help = "Bearer API key"
    )]
    api_key: String,

    #[arg(long, help = "Delete the sample user at the end")]
    delete: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let api = RadiusApi::new(&args.url, &args.api_key);
    let options = DemoOptions {
        delete_sample: args.delete,
    };

    let completed = radius_demo::run(&api, &options, &mut io::stdout().lock())?;
    Ok(if completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
