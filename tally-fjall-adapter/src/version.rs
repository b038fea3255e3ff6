use cargo_toml::{Dependency, Manifest};

#[inline]
pub(crate) fn fjall_version() -> Result<String, String> {
    dependency_version(include_str!("../Cargo.toml"), "fjall")
}

fn dependency_version(manifest: &str, name: &str) -> Result<String, String> {
    let manifest =
        Manifest::from_str(manifest).map_err(|e| format!("Failed to parse Cargo.toml: {}", e))?;

    let dependency = manifest
        .dependencies
        .get(name)
        .ok_or_else(|| format!("{} dependency not found in Cargo.toml", name))?;

    match dependency {
        Dependency::Simple(version) => Ok(version.clone()),
        Dependency::Detailed(d) => d
            .version
            .clone()
            .ok_or_else(|| format!("{} dependency version not specified", name)),
        Dependency::Inherited(_) => Err(format!("Inherited {} dependency not supported", name)),
    }
}
