//! Compiles `coins.proto` into the tonic server and client stubs.
//!
//! The descriptor set is produced by `protox`, so no system `protoc` is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=coins.proto");

    let descriptors = protox::compile(["coins.proto"], ["."])?;
    tonic_build::configure().compile_fds(descriptors)?;

    Ok(())
}
