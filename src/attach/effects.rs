//! Effect implementations referenced by the attachment tables.
//!
//! Effects receive the event and the state they were invoked in purely for
//! tracing. If an effect feels like it needs to branch on the state, the
//! branch belongs in the tables instead.

use crate::attach::coordinator::Context;
use crate::attach::state::{AttachEvent, AttachState};
use crate::attach::Status;
use crate::core::{Event, State};
use crate::engine::EffectError;
use crate::radio::Peripheral;
use crate::store::AttachedRecord;
use chrono::Utc;

/// Entry effect of `Scanning`: start a scan filtered to the target
/// service.
pub(crate) fn perform_scan(
    ctx: &mut Context,
    event: &AttachEvent,
    state: &AttachState,
) -> Result<(), EffectError> {
    tracing::debug!(event = event.name(), state = state.name(), "starting scan");
    let radio = ctx
        .radio
        .as_ref()
        .ok_or(EffectError::MissingDependency("radio manager"))?;
    let service = ctx
        .target
        .service
        .ok_or(EffectError::MissingDependency("target service"))?;
    radio.scan(service)?;
    Ok(())
}

/// Entry effect of `Retrieving`: look up previously attached devices for
/// the target service and reconnect them. An empty result is not a
/// failure - it re-routes as `RetrieveFailed` so the machine falls back to
/// scanning.
pub(crate) fn perform_retrieve(
    ctx: &mut Context,
    event: &AttachEvent,
    state: &AttachState,
) -> Result<(), EffectError> {
    tracing::debug!(
        event = event.name(),
        state = state.name(),
        "retrieving previously attached devices"
    );
    let radio = ctx
        .radio
        .clone()
        .ok_or(EffectError::MissingDependency("radio manager"))?;
    let service = ctx
        .target
        .service
        .ok_or(EffectError::MissingDependency("target service"))?;

    let records = ctx.store.load_attached(&service)?;
    if records.is_empty() {
        tracing::info!(service = %service, "no previously attached devices, falling back to scan");
        ctx.requeue(AttachEvent::RetrieveFailed);
        return Ok(());
    }

    ctx.roster = records
        .iter()
        .map(|record| Peripheral {
            id: record.device,
            name: None,
        })
        .collect();
    for record in &records {
        radio.connect(record.device)?;
    }
    Ok(())
}

/// Transition action of `Scanning + ScanSucceeded`: request a connection
/// to every rostered peripheral. Completions come back later as
/// occurrences.
pub(crate) fn perform_connect(
    ctx: &mut Context,
    event: &AttachEvent,
    state: &AttachState,
) -> Result<(), EffectError> {
    tracing::debug!(
        event = event.name(),
        state = state.name(),
        peripherals = ctx.roster.len(),
        "connecting rostered peripherals"
    );
    let radio = ctx
        .radio
        .as_ref()
        .ok_or(EffectError::MissingDependency("radio manager"))?;
    for peripheral in &ctx.roster {
        radio.connect(peripheral.id)?;
    }
    Ok(())
}

/// Entry effect of `Ready`: mark the target attached, persist a record for
/// every rostered peripheral, and publish the `Ready` status.
pub(crate) fn perform_notify_attached(
    ctx: &mut Context,
    event: &AttachEvent,
    state: &AttachState,
) -> Result<(), EffectError> {
    tracing::debug!(event = event.name(), state = state.name(), "attached");
    ctx.target.attached = true;
    if let Some(service) = ctx.target.service {
        let now = Utc::now();
        let records: Vec<AttachedRecord> = ctx
            .roster
            .iter()
            .map(|peripheral| AttachedRecord {
                device: peripheral.id,
                service,
                attached_at: now,
            })
            .collect();
        if !records.is_empty() {
            ctx.store.save_attached(&records)?;
        }
    }
    ctx.publish(Status::Ready);
    Ok(())
}

/// Error-policy action shared by every state.
pub(crate) fn trace_recovery(
    _ctx: &mut Context,
    event: &AttachEvent,
    state: &AttachState,
) -> Result<(), EffectError> {
    tracing::warn!(
        event = event.name(),
        state = state.name(),
        "recovering to fallback state"
    );
    Ok(())
}
