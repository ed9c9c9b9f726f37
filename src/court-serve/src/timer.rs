use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

pub struct Timer {
    name: String,
    tstamp: Option<DateTime<Utc>>,
    duration: Option<Duration>,
}

impl Timer {
    /// Create a new timer
    pub fn new(name: &str) -> Self {
        Timer {
            name: name.to_owned(),
            tstamp: None,
            duration: None,
        }
    }

    pub fn new_start(name: &str) -> Self {
        let mut t = Timer::new(name);
        t.start();
        t
    }

    /// Start the timer
    pub fn start(&mut self) {
        info!("{}: starting", self.name);

        self.tstamp = Some(Utc::now());
        self.duration = None;
    }

    /// Stop the timer
    pub fn stop(&mut self) {
        match self.tstamp {
            None => debug!("{}: not running!", self.name),
            Some(tstamp) => {
                let d = Utc::now() - tstamp;

                self.duration = Some(d);
                self.tstamp = None;
                info!("{} duration: {} msec", self.name, d.num_milliseconds());
            }
        }
    }

    /// Stop the timer and get the elapsed milliseconds
    pub fn stop_ms(&mut self) -> i64 {
        self.stop();
        self.duration()
    }

    /// Get duration in milliseconds
    pub fn duration(&self) -> i64 {
        match self.duration {
            None => 0,
            Some(dur) => dur.num_milliseconds(),
        }
    }
}
