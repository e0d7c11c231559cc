//! Upload flow: place a generated OB under the right run container and
//! push its templates with create-then-update calls.

use tracing::info;

use crate::error::{Error, SyncError};
use crate::ob::ObservingBlock;
use crate::remote::{ItemKind, ItemRecord, ProposalService};

/// Upload one generated OB to the proposal service.
///
/// Finds the run declared in the setup, finds or creates the folder (and
/// the optional concatenation inside it), creates the service-side OB,
/// attaches the resolved target and syncs every template. Any service
/// failure aborts this OB immediately; nothing is retried.
pub fn upload_ob(service: &dyn ProposalService, ob: &mut ObservingBlock) -> Result<(), Error> {
    let setup = ob.setup().clone();

    let run = service
        .list_runs()?
        .into_iter()
        .find(|r| r.prog_id == setup.run_id)
        .ok_or_else(|| SyncError::RunNotFound(setup.run_id.clone()))?;

    let folder = find_or_create(service, run.container_id, &setup.folder, ItemKind::Folder)?;
    let parent = match &setup.concatenation {
        Some(name) => find_or_create(service, folder.id, name, ItemKind::Concatenation)?,
        None => folder,
    };

    let created = service.create_ob(parent.id, ob.label())?;
    service.set_ob_target(created.id, &ob.target_record())?;
    ob.sync(service, created.id)?;

    info!(ob = %ob.label(), run = %setup.run_id, folder = %setup.folder, "OB uploaded");
    Ok(())
}

fn find_or_create(
    service: &dyn ProposalService,
    container_id: i64,
    name: &str,
    kind: ItemKind,
) -> Result<ItemRecord, SyncError> {
    if let Some(item) = service.find_item(container_id, name, Some(kind))? {
        return Ok(item);
    }
    match kind {
        ItemKind::Folder => service.create_folder(container_id, name),
        ItemKind::Concatenation => service.create_concatenation(container_id, name),
        ItemKind::Ob => service.create_ob(container_id, name),
    }
}
