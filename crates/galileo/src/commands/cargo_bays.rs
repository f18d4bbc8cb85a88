//! Cargo bay (storage) command handlers.

use tabled::Tabled;

use galileo_core::Galileo;
use galileo_core::models::CargoBay;

use crate::cli::{CargoBaysArgs, CargoBaysCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct CargoBayRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Storage")]
    storage_type: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&CargoBay> for CargoBayRow {
    fn from(b: &CargoBay) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            storage_type: output::or_dash(b.storage_type.as_deref()),
            created: output::or_dash(b.creation_date.as_deref()),
        }
    }
}

pub async fn handle(
    galileo: &Galileo,
    args: CargoBaysArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CargoBaysCommand::List => {
            let found = galileo.cargo_bays().list().await?;
            let out = output::render_list(
                &global.output,
                &found,
                |b| CargoBayRow::from(b),
                |b| b.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
