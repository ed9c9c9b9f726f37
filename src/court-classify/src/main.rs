use std::error::Error;
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;

use log::info;

use court_serve::{ProviderConfig, RekognitionClient, SurfaceDetector};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "court-classify",
    about = "CLI app to classify a tennis-court surface from an image"
)]
struct CmdArgs {
    #[structopt(help = "Image to classify: a local path or an http(s) URL")]
    image: String,

    #[structopt(long, env = "COURT_DETECT_ENDPOINT", help = "Recognition endpoint")]
    endpoint: String,

    #[structopt(long, env = "COURT_MODEL_ARN", help = "Custom-model identifier")]
    model_arn: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CmdArgs::from_args();

    let mut config = ProviderConfig::new(&args.endpoint);
    if let Some(arn) = &args.model_arn {
        config = config.with_model_arn(arn);
    }

    let detector = SurfaceDetector::new(RekognitionClient::new(config)?);

    let classification = if args.image.starts_with("http://") || args.image.starts_with("https://")
    {
        detector.detect_from_url(&args.image)?
    } else {
        info!("reading image from {}", args.image);
        let data = fs::read(PathBuf::from(&args.image))?;
        detector.detect_from_raw(&data)?
    };

    println!("{}", serde_json::to_string(&classification)?);

    Ok(())
}
