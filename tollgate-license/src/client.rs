//! The license client: the single owner of the cached license.
//!
//! The cache is one `RwLock<Option<License>>` cell. Readers clone a
//! snapshot out under the read lock; writers take the write lock only to
//! swap in a new license, after verification and file I/O have finished.

use crate::config::LicenseConfig;
use crate::error::{LicenseError, LicenseResult};
use crate::license::License;
use crate::logger::{LicenseLogger, NoopLogger};
use crate::status::LicenseStatus;
use crate::validator::validate;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offline license client.
///
/// Build one per process, call [`LicenseClient::init`] at startup, call
/// [`LicenseClient::activate`] once with the code issued to the customer,
/// and guard features with [`LicenseClient::check_license`] or
/// [`LicenseClient::check_module`]. The client is `Send + Sync`; share it
/// through an `Arc`.
pub struct LicenseClient {
    config: LicenseConfig,
    logger: Arc<dyn LicenseLogger>,
    current: RwLock<Option<License>>,
}

impl LicenseClient {
    /// Creates a client that owns `config`. Nothing is loaded until
    /// [`LicenseClient::init`] or [`LicenseClient::activate`] runs.
    #[must_use]
    pub fn new(config: LicenseConfig) -> Self {
        let logger = config
            .logger
            .clone()
            .unwrap_or_else(|| Arc::new(NoopLogger));
        Self {
            config,
            logger,
            current: RwLock::new(None),
        }
    }

    /// Returns the configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// Runs startup validation if licensing is enabled and it was requested.
    ///
    /// # Errors
    ///
    /// Returns the load, validation, not-found or expired error from startup
    /// validation, unless `allow_start_when_expired` is set.
    pub fn init(&self) -> LicenseResult<()> {
        if !self.config.enabled {
            self.logger.log_line("license validation disabled");
            return Ok(());
        }
        if self.config.validate_on_startup {
            return self.perform_startup_validation();
        }
        Ok(())
    }

    fn perform_startup_validation(&self) -> LicenseResult<()> {
        let allow = self.config.allow_start_when_expired;

        if let Err(err) = self.load_license_from_file() {
            self.logger
                .log_fmt(format_args!("license initialization failed: {err}"));
            return if allow { Ok(()) } else { Err(err) };
        }

        match self.current_license() {
            None => {
                self.logger.log_line(
                    "system not activated - please upload a license activation code to activate",
                );
                if allow { Ok(()) } else { Err(LicenseError::LicenseNotFound) }
            }
            Some(license) if license.is_expired(Utc::now()) => {
                self.logger.log_fmt(format_args!(
                    "license expired - customer: {}, expiry: {}",
                    license.customer_name,
                    format_expiry(license.expire_at),
                ));
                if allow { Ok(()) } else { Err(LicenseError::LicenseExpired) }
            }
            Some(license) => {
                self.logger.log_fmt(format_args!(
                    "license validation successful - customer: {}, product: {}, expiry: {}, days left: {}",
                    license.customer_name,
                    license.product_name,
                    format_expiry(license.expire_at),
                    license.days_left,
                ));
                Ok(())
            }
        }
    }

    /// Validates `activation_code`, persists it and caches the license.
    ///
    /// The raw code string is written to storage, not the decoded payload.
    /// Nothing is persisted or cached unless the code verifies and is
    /// unexpired.
    ///
    /// # Errors
    ///
    /// Returns the validation error unchanged, [`LicenseError::LicenseExpired`]
    /// for an expired license, or [`LicenseError::StorageFailure`] if the
    /// code cannot be written.
    pub fn activate(&self, activation_code: &str) -> LicenseResult<License> {
        self.logger.log_line("starting license activation");

        let license = validate(&self.config.public_key, activation_code)?;
        if license.is_expired(Utc::now()) {
            return Err(LicenseError::LicenseExpired);
        }

        self.save_license_to_file(activation_code)?;
        self.replace(license.clone());

        self.logger.log_fmt(format_args!(
            "license activated successfully: {}",
            license.customer_name
        ));
        Ok(license)
    }

    /// Checks that a license is cached and unexpired.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::LicenseNotFound`] or
    /// [`LicenseError::LicenseExpired`].
    pub fn check_license(&self) -> LicenseResult<()> {
        check(self.current_license().as_ref(), Utc::now()).map(|_| ())
    }

    /// Checks the license and that it grants `module`.
    ///
    /// # Errors
    ///
    /// Returns the [`LicenseClient::check_license`] error, or
    /// [`LicenseError::ModuleUnauthorized`] naming `module`.
    pub fn check_module(&self, module: &str) -> LicenseResult<()> {
        let snapshot = self.current_license();
        let license = check(snapshot.as_ref(), Utc::now())?;
        if license.has_module(module) {
            Ok(())
        } else {
            Err(LicenseError::ModuleUnauthorized {
                module: module.to_string(),
            })
        }
    }

    /// Classifies the cached license without changing it.
    ///
    /// Meant to be called on the host's own schedule. The error is `None`
    /// exactly when the status is [`LicenseStatus::Valid`].
    pub fn check_license_status(&self) -> (LicenseStatus, Option<LicenseError>) {
        match check(self.current_license().as_ref(), Utc::now()) {
            Ok(_) => (LicenseStatus::Valid, None),
            Err(err @ LicenseError::LicenseExpired) => {
                self.logger.log_line("periodic check: license expired");
                (LicenseStatus::Expired, Some(err))
            }
            Err(err) => {
                self.logger.log_line("skipping check: not activated");
                (LicenseStatus::NotActivated, Some(err))
            }
        }
    }

    /// Returns true if a license is cached and unexpired.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.check_license().is_ok()
    }

    /// Returns true if a license is cached and lists `module`.
    ///
    /// Expiry is not considered; use [`LicenseClient::check_module`] for
    /// that.
    #[must_use]
    pub fn has_module(&self, module: &str) -> bool {
        self.read(|current| current.is_some_and(|l| l.has_module(module)))
    }

    /// Returns a copy of the cached license.
    #[must_use]
    pub fn current_license(&self) -> Option<License> {
        self.read(|current| current.cloned())
    }

    fn load_license_from_file(&self) -> LicenseResult<()> {
        let Some(path) = self.config.storage_path() else {
            debug!("No storage path configured, skipping license load");
            return Ok(());
        };

        // Non-UTF-8 content fails in the base64 step like any malformed code.
        let code = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.logger.log_fmt(format_args!(
                    "license file does not exist: {}",
                    path.display()
                ));
                return Ok(());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read license file");
                return Err(LicenseError::storage("failed to load license file", e));
            }
        };

        let license = validate(&self.config.public_key, &code)?;
        self.replace(license);
        self.logger.log_line("license loaded successfully from file");
        Ok(())
    }

    fn save_license_to_file(&self, activation_code: &str) -> LicenseResult<()> {
        let Some(path) = self.config.storage_path() else {
            return Err(LicenseError::storage(
                "failed to save license",
                io::Error::new(io::ErrorKind::InvalidInput, "storage path is empty"),
            ));
        };

        write_owner_only(path, activation_code.as_bytes()).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to write license file");
            LicenseError::storage("failed to save license", e)
        })?;

        self.logger
            .log_fmt(format_args!("license saved: {}", path.display()));
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(Option<&License>) -> T) -> T {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }

    fn replace(&self, license: License) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(license);
    }
}

impl Default for LicenseClient {
    fn default() -> Self {
        Self::new(LicenseConfig::default())
    }
}

impl std::fmt::Debug for LicenseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseClient")
            .field("config", &self.config)
            .field("current", &self.current_license())
            .finish()
    }
}

fn check(current: Option<&License>, now: DateTime<Utc>) -> LicenseResult<&License> {
    match current {
        None => Err(LicenseError::LicenseNotFound),
        Some(license) if license.is_expired(now) => Err(LicenseError::LicenseExpired),
        Some(license) => Ok(license),
    }
}

fn format_expiry(expire_at: Option<DateTime<Utc>>) -> String {
    expire_at.map_or_else(
        || "never".to_string(),
        |exp| exp.format(EXPIRY_FORMAT).to_string(),
    )
}

/// Writes `contents` to `path`, creating parent directories, and restricts
/// the file to owner read/write.
///
/// The contents go to a sibling temporary file that is renamed over `path`
/// once synced, so a failed write leaves any previous file intact.
fn write_owner_only(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => {
            create_dir_all(dir)?;
            dir
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

fn create_dir_all(dir: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
    }

    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir)
    }
}
