fn main() {
    // opencv's binding generator needs libclang; on macOS fall back to the CLT copy
    if std::env::var_os("LIBCLANG_PATH").is_none() && cfg!(target_os = "macos") {
        std::env::set_var("LIBCLANG_PATH", "/Library/Developer/CommandLineTools/usr/lib");
        std::env::set_var("DYLD_FALLBACK_LIBRARY_PATH", "/Library/Developer/CommandLineTools/usr/lib");
    }

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=LIBCLANG_PATH");
}
