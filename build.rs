use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use vergen::{BuildBuilder, CargoBuilder, Emitter, RustcBuilder};
use vergen_gitcl::{Emitter as GitEmitter, GitclBuilder};

/// Profiles shipped next to the binary for each cargo profile
const RELEASE_PROFILES: &[&str] = &["release"];
const DEBUG_PROFILES: &[&str] = &["debug", "release"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_timestamp(true).build()?;

    let cargo = CargoBuilder::default()
        .opt_level(true)
        .target_triple(true)
        .build()?;

    let rustc = RustcBuilder::default()
        .semver(true)
        .channel(true)
        .build()?;

    // Git metadata is optional: builds from a source tarball have no repository
    let gitcl = GitclBuilder::default()
        .sha(true)
        .branch(true)
        .dirty(true)
        .build()?;

    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?
        .emit()?;

    GitEmitter::default().add_instructions(&gitcl)?.emit()?;

    copy_profiles()?;

    Ok(())
}

/// Copies `config/{profile}.toml` into `target/{cargo profile}/config`
fn copy_profiles() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let cargo_profile = env::var("PROFILE")?;

    // OUT_DIR is target/{profile}/build/bridge-shell-xxx/out
    let target_dir = out_dir
        .ancestors()
        .nth(3)
        .ok_or("Could not determine target directory")?;

    let config_out_dir = target_dir.join("config");
    fs::create_dir_all(&config_out_dir)?;

    let profiles = if cargo_profile == "release" {
        RELEASE_PROFILES
    } else {
        DEBUG_PROFILES
    };

    for profile in profiles {
        let file_name = format!("{profile}.toml");
        let source = Path::new("config").join(&file_name);
        if source.exists() {
            fs::copy(&source, config_out_dir.join(&file_name))?;
            println!("cargo:rerun-if-changed={}", source.display());
        }
    }

    Ok(())
}
