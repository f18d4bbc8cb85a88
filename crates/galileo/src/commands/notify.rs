//! `notify`: message the job owner from inside a running job.

use galileo_core::LzNotifier;

use crate::cli::{GlobalOpts, NotifyArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: NotifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let notifier = LzNotifier::from_env()?;
    notifier.send(&args.message).await?;
    output::notice("Notification sent", global.quiet);
    Ok(())
}
