use image::ImageReader;
use linetrack::{GroundProjection, Perception, PerceptionConfig};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <projection.json> <frame0.png> <frame1.png> [...]", args[0]);
        std::process::exit(2);
    }

    let projection = GroundProjection::from_json_file(Path::new(&args[1]))?;
    let mut config = PerceptionConfig::default();
    config.odometry.pattern_seed = Some(0);
    let mut perception = Perception::new(config, projection)?;

    for path in &args[2..] {
        let frame = ImageReader::open(path)?.decode()?.to_luma8();
        let odo = perception.estimate_odometry(&frame);
        if odo.flow.is_empty() {
            println!("{path}: {} features, no flow", odo.n_features);
            continue;
        }
        let n = odo.flow.len() as f64;
        let mean = odo
            .flow
            .iter()
            .fold([0.0, 0.0], |acc, v| [acc[0] + v.delta[0], acc[1] + v.delta[1]]);
        println!(
            "{path}: {} flow vectors, mean ground delta ({:.1}, {:.1})",
            odo.flow.len(),
            mean[0] / n,
            mean[1] / n
        );
    }
    Ok(())
}
