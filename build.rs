fn main() {
    // Only the rich backend links against a native image library; the basic
    // backend builds libwebp from source through the `webp` crate.
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_VIPS");
    if std::env::var_os("CARGO_FEATURE_VIPS").is_some() {
        link_libvips();
    }
}

fn link_libvips() {
    // ── libvips linking ──────────────────────────────────────────────────────
    //
    // The libvips-rs bindings crate ships no build script of its own, so cargo
    // needs to be told where the import library lives.
    //
    // The VIPS_DIR environment variable overrides the default location
    // (<crate-root>/vendor/libvips-native) used for Windows and macOS bundles.
    println!("cargo:rerun-if-env-changed=VIPS_DIR");

    let vips_dir = std::env::var("VIPS_DIR").unwrap_or_else(|_| {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("vendor")
            .join("libvips-native")
            .to_string_lossy()
            .to_string()
    });

    let lib_dir = std::path::Path::new(&vips_dir).join("lib");

    if cfg!(target_os = "windows") {
        if lib_dir.exists() {
            // rustc-link-arg with absolute paths reaches both the lib and the
            // bin targets; rustc-link-lib does not propagate to the binary.
            let link_arg = |name: &str| {
                println!("cargo:rustc-link-arg={}", lib_dir.join(name).display());
            };
            link_arg("libvips.lib");
            // GLib symbols called directly by libvips-rs.
            link_arg("libglib-2.0.lib");
            link_arg("libgobject-2.0.lib");
        } else {
            println!("cargo:warning=libvips not found at '{vips_dir}', set VIPS_DIR.");
        }
    } else if cfg!(target_os = "macos") {
        if lib_dir.exists() {
            println!("cargo:rustc-link-search=native={}", lib_dir.display());
        }
        println!("cargo:rustc-link-lib=dylib=vips");
    } else {
        // Linux: system libvips-dev package is sufficient.
        println!("cargo:rustc-link-lib=dylib=vips");
    }
}
