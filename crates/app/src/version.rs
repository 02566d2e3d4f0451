use std::fmt;

use serde::Serialize;

/// Compile-time build metadata, filled in by `build.rs`
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        target: option_env!("BUILD_TARGET"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "boxfs {} ({})", env!("CARGO_PKG_VERSION"), self.version)?;
        writeln!(f, "profile:  {}", self.build_profile)?;
        writeln!(f, "features: {}", self.build_features)?;
        writeln!(f, "built:    {}", self.build_timestamp)?;
        write!(f, "rustc:    {}", self.rust_version)?;
        if let Some(target) = self.target {
            write!(f, "\ntarget:   {}", target)?;
        }
        Ok(())
    }
}
