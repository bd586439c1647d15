use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // The linker script only applies to the real target; host builds of
    // the workspace produce a stub binary with the default layout.
    let target = env::var("TARGET").unwrap();
    if target.starts_with("arm") {
        // Put the linker script somewhere the linker can find it.
        let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
        fs::copy("link.x", out.join("link.x")).unwrap();
        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rustc-link-arg=-Tlink.x");
    }
    println!("cargo:rerun-if-changed=link.x");
}
