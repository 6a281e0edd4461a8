use std::env;
use std::path::PathBuf;

fn main() {
	let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
	let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

	//Only the bare-metal image needs the memory layout; host builds are stubs
	if target_os == "none" {
		let script = crate_dir.join("link.ld");
		println!("cargo:rustc-link-arg-bins=-T{}", script.display());
	}
	println!("cargo:rerun-if-changed=link.ld");
}
