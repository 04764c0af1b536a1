fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/reddit_implementation/v1/reddit_service.proto");
    println!("cargo:rerun-if-changed=proto");

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(
            &["proto/reddit_implementation/v1/reddit_service.proto"],
            &["proto"],
        )?;

    Ok(())
}
