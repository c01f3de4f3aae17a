use std::env;

const SHIM_LIB: &str = "cbc_bridge";
const COIN_LIBS: [&str; 7] = [
    "CbcSolver",
    "Cbc",
    "Cgl",
    "OsiClp",
    "Clp",
    "Osi",
    "CoinUtils",
];

fn main() {
    println!("cargo:rerun-if-env-changed=CBC_BRIDGE_LIB_DIR");
    println!("cargo:rerun-if-env-changed=COIN_LIB_DIR");

    // Without the `link` feature the declarations are inert and nothing is linked.
    if env::var_os("CARGO_FEATURE_LINK").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("CBC_BRIDGE_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }
    match env::var_os("COIN_LIB_DIR") {
        Some(dir) => println!("cargo:rustc-link-search=native={}", dir.to_string_lossy()),
        None => println!("cargo:rustc-link-search=native=/usr/local/lib"),
    }

    println!("cargo:rustc-link-lib={SHIM_LIB}");
    for lib in COIN_LIBS {
        println!("cargo:rustc-link-lib={lib}");
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let cxx = if target_os == "macos" { "c++" } else { "stdc++" };
    println!("cargo:rustc-link-lib={cxx}");
}
