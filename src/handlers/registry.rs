//! Handler module discovery
//!
//! Handler modules are listed in a registry instead of being scanned from
//! disk. Each module is loaded in isolation: a module that fails (error or
//! panic) is logged and skipped, and a module that exports no handler
//! factory is skipped with a warning. Neither stops the remaining modules
//! from loading.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use tracing::{error, info, warn};

use crate::config::HandlersConfig;
use crate::utils::errors::{MiniBotError, Result};
use super::{CommandHandler, HandlerSet};

thread_local! {
    /// Site and backtrace of the latest panic on this thread
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static PANIC_CAPTURE: Once = Once::new();

struct PanicSite {
    location: String,
    backtrace: String,
}

/// Chain a hook that records where a panic happened; the previous hook
/// still runs.
fn install_panic_capture() {
    PANIC_CAPTURE.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let site = PanicSite {
                location: info.location().map(|l| l.to_string()).unwrap_or_default(),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(site));
            previous(info);
        }));
    });
}

/// Builds the handler a module exports
pub type HandlerFactory = Box<dyn FnOnce() -> Arc<dyn CommandHandler> + Send>;

/// What a module exposes once loaded
#[derive(Default)]
pub struct ModuleExports {
    pub command_handler: Option<HandlerFactory>,
}

impl ModuleExports {
    /// Exports with a handler factory
    pub fn with_handler<F>(factory: F) -> Self
    where
        F: FnOnce() -> Arc<dyn CommandHandler> + Send + 'static,
    {
        Self {
            command_handler: Some(Box::new(factory)),
        }
    }
}

/// Registry entry for one independently authored handler module
#[derive(Clone, Copy)]
pub struct HandlerModule {
    pub name: &'static str,
    pub load: fn() -> Result<ModuleExports>,
}

impl std::fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerModule").field("name", &self.name).finish()
    }
}

/// Outcome of one discovery pass
#[derive(Debug, Default)]
pub struct LoadReport {
    pub handlers: HandlerSet,
    /// Modules that loaded but exported no handler factory
    pub skipped: Vec<String>,
    /// Modules whose load or factory failed
    pub failed: Vec<String>,
}

/// Discovers and instantiates handlers from a module registry
#[derive(Debug, Clone)]
pub struct HandlerLoader {
    modules: Vec<HandlerModule>,
    disabled: Vec<String>,
}

impl HandlerLoader {
    pub fn new(modules: Vec<HandlerModule>, config: &HandlersConfig) -> Self {
        Self {
            modules,
            disabled: config.disabled.clone(),
        }
    }

    /// Load every enabled module in registry order
    pub fn load(&self) -> LoadReport {
        install_panic_capture();
        let mut report = LoadReport::default();

        for module in &self.modules {
            if self.disabled.iter().any(|name| name == module.name) {
                info!(module = module.name, "Handler module disabled by configuration");
                continue;
            }

            match Self::load_module(module) {
                Ok(Some(handler)) => {
                    info!(module = module.name, handler = handler.name(), "Handler registered");
                    report.handlers.push(handler);
                }
                Ok(None) => {
                    warn!(module = module.name, "Module does not export a command handler, skipping");
                    report.skipped.push(module.name.to_string());
                }
                Err(e) => {
                    error!(
                        module = module.name,
                        error = %e,
                        causes = ?e.causes(),
                        "Failed to load handler module"
                    );
                    report.failed.push(module.name.to_string());
                }
            }
        }

        info!(
            loaded = report.handlers.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Handler discovery finished"
        );
        report
    }

    fn load_module(module: &HandlerModule) -> Result<Option<Arc<dyn CommandHandler>>> {
        let exports = panic::catch_unwind(module.load)
            .map_err(|payload| Self::panic_error(module.name, payload))??;

        let Some(factory) = exports.command_handler else {
            return Ok(None);
        };

        let handler = panic::catch_unwind(AssertUnwindSafe(factory))
            .map_err(|payload| Self::panic_error(module.name, payload))?;
        Ok(Some(handler))
    }

    fn panic_error(module: &str, payload: Box<dyn Any + Send>) -> MiniBotError {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        let reason = match LAST_PANIC.with(|slot| slot.borrow_mut().take()) {
            Some(site) => {
                error!(module = module, location = %site.location, "Handler module panicked\n{}", site.backtrace);
                format!("panicked at {}: {}", site.location, reason)
            }
            None => format!("panicked: {}", reason),
        };

        MiniBotError::HandlerLoad {
            module: module.to_string(),
            reason,
        }
    }
}
