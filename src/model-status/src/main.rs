use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

use log::info;

use court_serve::{await_ready, ProviderConfig, RekognitionClient, RetryPolicy};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "model-status",
    about = "Inspect the custom recognition model and save its identifier"
)]
struct CmdArgs {
    #[structopt(long, env = "COURT_DETECT_ENDPOINT", help = "Recognition endpoint")]
    endpoint: String,

    #[structopt(long, env = "COURT_MODEL_ARN", help = "Custom-model identifier")]
    model_arn: String,

    #[structopt(
        long,
        default_value = "model_arn.txt",
        help = "Where to save the identifier of a usable model"
    )]
    output: PathBuf,

    #[structopt(long, help = "Block until the model reports RUNNING")]
    wait: bool,

    #[structopt(long, default_value = "30", help = "Polling attempts when waiting")]
    attempts: u32,

    #[structopt(long, default_value = "10", help = "Seconds between polls")]
    interval_secs: u64,

    #[structopt(long, default_value = "300", help = "Overall waiting deadline in seconds")]
    timeout_secs: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CmdArgs::from_args();

    let config = ProviderConfig::new(&args.endpoint).with_model_arn(&args.model_arn);
    let client = RekognitionClient::new(config)?;

    let mut saved = false;
    for version in client.describe_versions()? {
        println!("{}  {}", version.status, version.arn);

        if version.status.is_usable() && !saved {
            fs::write(&args.output, &version.arn)?;
            info!("identifier saved to {}", args.output.display());
            saved = true;
        }
    }

    if args.wait {
        let policy = RetryPolicy {
            max_attempts: args.attempts,
            interval: Duration::from_secs(args.interval_secs),
            timeout: Duration::from_secs(args.timeout_secs),
        };

        let status = await_ready(&client, &policy)?;
        println!("model is {}", status);
    }

    Ok(())
}
