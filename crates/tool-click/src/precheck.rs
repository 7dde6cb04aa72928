use tokio_util::sync::CancellationToken;
use tracing::warn;
use waymark_core_types::{ElementHandle, PageSession};

use crate::errors::ClickError;
use crate::model::DomState;
use crate::policy::ClickPolicyView;
use crate::ports::DomStateInspector;
use crate::runner::pause;

/// Disabled aborts before any tier. Busy gets one bounded wait and a recheck;
/// a control that is still busy afterwards is clicked anyway.
pub(crate) async fn run_preflight(
    inspector: &dyn DomStateInspector,
    session: &dyn PageSession,
    element: &ElementHandle,
    policy: &ClickPolicyView,
    cancel: &CancellationToken,
) -> Result<DomState, ClickError> {
    let mut state = inspect(inspector, session, element).await;
    if state.disabled {
        return Err(ClickError::TargetDisabled);
    }
    if state.busy {
        pause(cancel, policy.busy_wait()).await?;
        state = inspect(inspector, session, element).await;
        if state.disabled {
            return Err(ClickError::TargetDisabled);
        }
        if state.busy {
            warn!("target still busy after wait, proceeding");
        }
    }
    Ok(state)
}

async fn inspect(
    inspector: &dyn DomStateInspector,
    session: &dyn PageSession,
    element: &ElementHandle,
) -> DomState {
    match inspector.inspect(session, element).await {
        Ok(state) => state,
        Err(err) => {
            warn!(%err, "dom state inspection failed, assuming enabled");
            DomState::default()
        }
    }
}
