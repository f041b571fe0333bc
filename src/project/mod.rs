//! Top-level pipeline orchestration: config → resolve entry member →
//! preprocess → assemble → persist.

use tracing::warn;

use crate::assemble::Assembler;
use crate::config::Config;
use crate::persist::{InsertSummary, PersistError, PersistenceAdapter};
use crate::preprocess::Preprocessor;
use crate::resolve::{FilesystemResolver, LibraryResolver, NativePdsResolver};

/// The outcome of processing one project's entry member: `None` when the
/// entry member could not be resolved (§7: "entry member unresolved: silent
/// skip, no project row written").
pub type ProcessOutcome = Option<InsertSummary>;

/// Resolve and process `cfg.file` under `cfg.project`, persisting the
/// result via `adapter`. Returns `Ok(None)` when the entry member is
/// unresolvable; I/O and parse errors inside the deck are non-fatal and are
/// only logged (§7).
pub fn process(cfg: &Config, adapter: &mut dyn PersistenceAdapter) -> Result<ProcessOutcome, PersistError> {
    let Some(file) = &cfg.file else {
        warn!("no FILE configured, nothing to process");
        return Ok(None);
    };
    let Some(project) = &cfg.project else {
        warn!("no PROJECT configured, nothing to process");
        return Ok(None);
    };

    let libs = cfg.library_roots();
    let resolver: Box<dyn LibraryResolver> = if cfg.is_native_pds() {
        Box::new(NativePdsResolver)
    } else {
        Box::new(FilesystemResolver { ext: cfg.ext.clone() })
    };

    let Some(text) = load_entry_member(resolver.as_ref(), file, &libs) else {
        warn!(member = file.as_str(), "entry member unresolved, skipping project");
        return Ok(None);
    };

    let mut pp = Preprocessor::new(libs, resolver.as_ref());
    let events = pp.process_text(&text);
    let steps = Assembler::assemble(&events);

    adapter.insert_project(project, &steps).map(Some)
}

fn load_entry_member(resolver: &dyn LibraryResolver, file: &str, libs: &[String]) -> Option<String> {
    let resolved = resolver.resolve(file, libs)?;
    std::fs::read_to_string(&resolved.path).ok()
}
