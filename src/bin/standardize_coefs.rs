//! Run the full coefficient standardization pipeline from a JSON config.

use coef_standardizer_rust::{Pipeline, PipelineConfig};
use std::path::Path;
use std::time::Instant;

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());

    println!("Coefficient standardization pipeline");
    println!("Config: {}\n", config_path);

    let start = Instant::now();
    let result = PipelineConfig::load(Path::new(&config_path))
        .and_then(Pipeline::new)
        .and_then(|pipeline| pipeline.run());

    match result {
        Ok(output) => {
            println!("\nDone: {} output rows in {:.2?}", output.height(), start.elapsed());
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}
