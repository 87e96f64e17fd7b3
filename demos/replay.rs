use std::io::BufRead;

use proxtrack::{Config, DepthMap, Detection, Frame, Pipeline};
use serde_derive::Deserialize;

#[derive(Deserialize)]
struct Tick {
    timestamp: u64,
    detections: Vec<Detection>,
    // uniform disparity standing in for the depth model
    #[serde(default = "default_disparity")]
    disparity: f32,
}

fn default_disparity() -> f32 {
    500.0
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("proxtrack=debug")
        .init();

    let mut args = std::env::args().skip(1);
    let ticks_file = args.next().expect("expected ticks file name");

    let config = match args.next() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let pipeline = Pipeline::from_config(config.clone())?;
    let reader = std::io::BufReader::new(std::fs::File::open(ticks_file)?);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let tick: Tick = match serde_json::from_str(&line) {
            Ok(tick) => tick,
            Err(err) => {
                eprintln!("wrong file format: {}", err);
                continue;
            }
        };

        let depth = DepthMap::uniform(tick.disparity, &config.depth);
        let frame = Frame::new(tick.timestamp, tick.detections, depth);

        let Some(out) = pipeline.try_process(frame)? else {
            continue;
        };

        for t in out.tracks.iter() {
            println!(
                "{} {} {:?} {:.1} {:.1} {:.2} {} ({:.1}, {:.1})",
                out.timestamp,
                t.track_id,
                t.state,
                t.position.0,
                t.position.1,
                t.distance_m,
                t.range.label(),
                t.velocity.0,
                t.velocity.1,
            );
        }

        for alert in &out.alerts {
            println!("{} ALERT {}", out.timestamp, alert);
        }
    }

    let stats = pipeline.stats();
    println!(
        "processed {} dropped {} alerts {}",
        stats.processed, stats.dropped, stats.alerts
    );

    Ok(())
}
