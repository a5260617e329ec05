fn main() {
    // Stamp the binary with its build time for `gradualflow --version` output
    let build_date = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    println!("cargo:rustc-env=GRADUALFLOW_BUILD_DATE={}", build_date);
    println!("cargo:rerun-if-changed=build.rs");
}
