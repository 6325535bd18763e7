mod config;
mod fs_utils;
mod install;
mod layout;
mod registry;
mod switch;
mod uninstall;

pub use config::{PvmConfig, DOWNLOAD_URL_ENV, RELEASES_URL_ENV};
pub use install::{
    copy_production_ini, extract_zip_archive, install_version, InstallOutcome, ACTIVE_INI_NAME,
    PRODUCTION_INI_NAME,
};
pub use layout::{PvmLayout, INTERPRETER_FILE_NAME, LINK_PATH_ENV, ROOT_ENV};
pub use registry::{
    current_version, current_version_with_runner, installed_versions, is_installed,
    list_installed,
};
pub use switch::{
    probe_privilege, relaunch_elevated, replace_active_link, switch_active_version_with,
    ElevationRequest, Privilege, SwitchOptions, SwitchOutcome,
};
pub use uninstall::uninstall_version;
