// Copies the ffmpeg/ffprobe binaries named by FFBOX_EMBED_FFMPEG and
// FFBOX_EMBED_FFPROBE into OUT_DIR so they can be embedded with include_bytes!.
// Unset variables produce empty payloads; a ".gz" source is embedded compressed.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    for tool in ["ffmpeg", "ffprobe"] {
        let var = format!("FFBOX_EMBED_{}", tool.to_uppercase());
        println!("cargo:rerun-if-env-changed={}", var);

        let target = out_dir.join(format!("{}.payload", tool));
        let gzip = match env::var_os(&var) {
            Some(source) if !source.is_empty() => {
                let source = PathBuf::from(source);
                println!("cargo:rerun-if-changed={}", source.display());
                fs::copy(&source, &target).unwrap_or_else(|e| {
                    panic!("failed to embed {} from {}: {}", tool, source.display(), e)
                });
                source.extension().map(|ext| ext == "gz").unwrap_or(false)
            }
            _ => {
                fs::write(&target, b"").expect("failed to write empty payload");
                false
            }
        };

        println!(
            "cargo:rustc-env=FFBOX_{}_GZIP={}",
            tool.to_uppercase(),
            if gzip { "1" } else { "0" }
        );
    }
}
