use image::ImageReader;
use linetrack::{GroundProjection, Perception, PerceptionConfig};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <projection.json> <image.png> [lookahead]", args[0]);
        std::process::exit(2);
    }

    let projection = GroundProjection::from_json_file(Path::new(&args[1]))?;
    let image = ImageReader::open(&args[2])?.decode()?.to_luma8();
    let config = PerceptionConfig::default();
    let lookahead: f64 = match args.get(3) {
        Some(s) => s.parse()?,
        None => config.line.lookahead,
    };

    let mut perception = Perception::new(config, projection)?;
    let estimate = perception.estimate_line(&image);
    match &estimate.curve {
        Some(curve) => println!(
            "confidence {:.2}, coeffs {:?}, curvature {:.6} at {}",
            estimate.confidence,
            curve.coeffs,
            perception.steering_curvature(curve, lookahead),
            lookahead
        ),
        None => println!(
            "no curve ({} of {} rows found the line)",
            estimate.n_candidates(),
            estimate.rows.len()
        ),
    }
    Ok(())
}
