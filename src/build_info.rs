// The file has been placed there by the build script.

mod internal {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

use internal::{
    BUILT_TIME_UTC, CI_PLATFORM, FEATURES, GIT_COMMIT_HASH_SHORT, GIT_HEAD_REF, PKG_VERSION,
    PROFILE, RUSTC_VERSION,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub git_commit: String,
    pub git_ref: String,
    pub build_time_utc: String,
}

pub fn print_version_info() {
    println!("version:        {}", PKG_VERSION);
    println!("commit:         {}", GIT_COMMIT_HASH_SHORT.unwrap_or_default());
    println!("branch:         {}", GIT_HEAD_REF.unwrap_or_default());
    println!("build_platform: {:?}", CI_PLATFORM);
    println!("build_time:     {}", BUILT_TIME_UTC);
    println!("features:       {:?}", FEATURES);
    println!("profile:        {}", PROFILE);
    println!("rustc:          {}", RUSTC_VERSION);
}

pub fn mev_api_version() -> Version {
    let git_commit = GIT_COMMIT_HASH_SHORT.unwrap_or("unknown").to_string();
    let git_ref = GIT_HEAD_REF.unwrap_or("unknown").to_string();

    Version {
        git_commit,
        git_ref,
        build_time_utc: BUILT_TIME_UTC.to_string(),
    }
}

/// Version string published in mev_params.
pub fn version_string() -> String {
    match GIT_COMMIT_HASH_SHORT {
        Some(commit) => format!("{}-{}", PKG_VERSION, commit),
        None => PKG_VERSION.to_string(),
    }
}
