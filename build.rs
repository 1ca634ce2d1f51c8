use std::path::PathBuf;

const PROTOS: &[&str] = &[
    "proto/custos/identity.proto",
    "proto/custos/tenant.proto",
    "proto/custos/group.proto",
];

fn main() {
    let out_dir = PathBuf::from("src/api/generated");
    // Ensure directory exists
    std::fs::create_dir_all(&out_dir).unwrap();

    tonic_prost_build::configure()
        .out_dir(&out_dir)
        .compile_protos(PROTOS, &["proto"])
        .unwrap();

    // Add SPDX header to generated files
    for name in ["identity.rs", "tenant.rs", "group.rs"] {
        let generated_file = out_dir.join(name);
        if generated_file.exists() {
            let content = std::fs::read_to_string(&generated_file).unwrap();
            if !content.starts_with("// SPDX") {
                let new_content = format!(
                    "// SPDX-License-Identifier: MIT OR Apache-2.0\n// DO NOT EDIT\n{}",
                    content
                );
                std::fs::write(generated_file, new_content).unwrap();
            }
        }
    }

    // Rerun if protos change
    for proto in PROTOS {
        println!("cargo:rerun-if-changed={proto}");
    }
}
