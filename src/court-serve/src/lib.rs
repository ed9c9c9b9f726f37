pub mod classifier;
pub mod detector;
pub mod error;
pub mod model;
pub mod provider;
pub mod request;
pub mod timer;

pub use classifier::{Classification, Label, ScoreTable, Surface, Verdict};
pub use detector::SurfaceDetector;
pub use error::{DetectError, Result};
pub use model::{await_ready, ModelProbe, ModelStatus, ModelVersion, RetryPolicy};
pub use provider::{LabelSource, ProviderConfig, RekognitionClient};
pub use request::image_from_body;
pub use timer::Timer;
