//! Command implementations

pub mod diagnose;
pub mod install;
pub mod rollback;

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::classify::ClassifiedError;
use crate::output::json;

/// Print a classified failure in the active output mode and hand it back
/// so `main` can map it to an exit code.
///
/// # Errors
///
/// Always returns `err`, wrapped for propagation.
pub(crate) fn report_failure(app: &AppContext, err: ClassifiedError) -> Result<()> {
    if app.is_json() {
        println!("{}", json::format_classified(&err)?);
    } else {
        app.renderer()
            .render_error(&err, &app.settings.layout.state_file(), app.verbose);
    }
    Err(anyhow::Error::new(err))
}
