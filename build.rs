use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the FT232H backend needs the vendor libraries
    if env::var_os("CARGO_FEATURE_FTDI").is_none() {
        return;
    }

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let project_root = PathBuf::from(&manifest_dir);

    // MPSSE_LIB_DIR / D2XX_LIB_DIR override the vendored Win32 layout
    let mpsse_lib_path = env::var("MPSSE_LIB_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| project_root.join("FTDI MPSSE").join("build").join("Win32").join("DLL"));
    let d2xx_lib_path = env::var("D2XX_LIB_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| project_root.join("FTDI-D2XX-Drivers-Win-2.12.36.20U").join("x86"));

    println!("cargo:rustc-link-search=native={}", mpsse_lib_path.display());
    println!("cargo:rustc-link-search=native={}", d2xx_lib_path.display());

    // libmpsse depends on FTD2XX, which is resolved at runtime
    println!("cargo:rustc-link-lib=dylib=libmpsse");

    println!("cargo:rerun-if-env-changed=MPSSE_LIB_DIR");
    println!("cargo:rerun-if-env-changed=D2XX_LIB_DIR");

    // Copy runtime DLLs next to the executable on Windows builds
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    if let (Ok(profile), Ok(target)) = (env::var("PROFILE"), env::var("TARGET")) {
        let target_dir = project_root.join("target").join(&target).join(&profile);

        if target_dir.exists() {
            let _ = fs::copy(mpsse_lib_path.join("libmpsse.dll"), target_dir.join("libmpsse.dll"));
            let _ = fs::copy(d2xx_lib_path.join("FTD2XX.dll"), target_dir.join("FTD2XX.dll"));

            println!("cargo:warning=Copied runtime DLLs to {}", target_dir.display());
        }
    }
}
