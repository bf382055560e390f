use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src/api.rs");
    println!("cargo:rerun-if-changed=src/dashboard.rs");
    println!("cargo:rerun-if-changed=src/climatology.rs");
    println!("cargo:rerun-if-changed=src/chart.rs");
    println!("cargo:rerun-if-changed=assets/dashboard.html");
    println!("cargo:rerun-if-changed=assets/dashboard.js");

    // The real document is written by the generate-openapi binary
    let openapi_path = Path::new("openapi.json");

    if !openapi_path.exists() {
        let placeholder = r#"{
  "note": "Run 'cargo run --bin generate-openapi' to generate the OpenAPI spec"
}"#;
        fs::write(openapi_path, placeholder).expect("Failed to create openapi.json placeholder");
    }
}
