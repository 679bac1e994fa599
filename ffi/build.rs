use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = crate_dir.join("include");

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        println!("cargo:warning=could not create {}: {e}", out_dir.display());
        return;
    }

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("APPKIT_H")
        .with_pragma_once(true)
        .with_documentation(true)
        .generate();

    match generated {
        Ok(bindings) => {
            bindings.write_to_file(out_dir.join("appkit.h"));
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}
