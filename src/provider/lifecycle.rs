//! Create/Read/Update/Delete/Import flows shared by every resource.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::diag::{
    Diagnostics, CONFIG_CLEAR_UNLOCK_WARNING_SUMMARY, CONFIG_COMMIT_ERROR_SUMMARY,
    CONFIG_COMMIT_WARNING_SUMMARY, CONFIG_DEL_ERROR_SUMMARY, CONFIG_LOCK_ERROR_SUMMARY,
    CONFIG_READ_ERROR_SUMMARY, CONFIG_SET_ERROR_SUMMARY, DUPLICATE_CONFIG_ERROR_SUMMARY,
    IMPORT_ERROR_SUMMARY, INCORRECT_VALUE_TYPE_SUMMARY, NOT_FOUND_ERROR_SUMMARY,
    POST_CHECK_ERROR_SUMMARY, PRE_CHECK_ERROR_SUMMARY, START_SESS_ERROR_SUMMARY,
};
use super::resource::{AttributeError, ResourceData};
use super::ProviderData;
use crate::junos::Session;

/// Outcome of a lifecycle operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct LifecycleResponse {
    /// New state, `None` when the resource is gone or the operation failed
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl LifecycleResponse {
    pub fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    fn from_state<R: Serialize>(state: Option<R>, mut diagnostics: Diagnostics) -> Self {
        let state = match state.map(serde_json::to_value).transpose() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.add_error(INCORRECT_VALUE_TYPE_SUMMARY, e);
                None
            }
        };
        Self { state, diagnostics }
    }

    /// Prepend diagnostics gathered before the operation ran
    pub fn with_diagnostics(mut self, mut earlier: Diagnostics) -> Self {
        earlier.extend(self.diagnostics);
        self.diagnostics = earlier;
        self
    }
}

pub(crate) fn add_set_error(diags: &mut Diagnostics, err: AttributeError) {
    if err.path.is_empty() {
        diags.add_error(CONFIG_SET_ERROR_SUMMARY, err.message);
    } else {
        diags.add_attribute_error(err.path, CONFIG_SET_ERROR_SUMMARY, err.message);
    }
}

async fn start_session(data: &ProviderData, diags: &mut Diagnostics) -> Option<Arc<dyn Session>> {
    match data.start_session().await {
        Ok(sess) => Some(sess),
        Err(e) => {
            diags.add_error(START_SESS_ERROR_SUMMARY, e);
            None
        }
    }
}

async fn close_session(sess: &dyn Session) {
    if let Err(e) = sess.close().await {
        debug!(device = %sess.identifier(), error = %e, "Failed to close session");
    }
}

async fn clear(sess: &dyn Session, diags: &mut Diagnostics) {
    if let Err(e) = sess.config_clear().await {
        warn!(device = %sess.identifier(), error = %e, "Failed to clear candidate configuration");
        diags.add_warning(CONFIG_CLEAR_UNLOCK_WARNING_SUMMARY, e);
    }
}

async fn lock(sess: &dyn Session, diags: &mut Diagnostics) -> bool {
    match sess.config_lock().await {
        Ok(()) => true,
        Err(e) => {
            diags.add_error(CONFIG_LOCK_ERROR_SUMMARY, e);
            false
        }
    }
}

async fn commit(sess: &dyn Session, log: &str, diags: &mut Diagnostics) -> bool {
    match sess.commit_conf(log).await {
        Ok(warnings) => {
            for warning in warnings {
                diags.add_warning(CONFIG_COMMIT_WARNING_SUMMARY, warning);
            }
            true
        }
        Err(e) => {
            diags.add_error(CONFIG_COMMIT_ERROR_SUMMARY, e);
            clear(sess, diags).await;
            false
        }
    }
}

/// Write lines to the fake-create set file.
async fn write_set_file(sess: &dyn Session, lines: &[String], diags: &mut Diagnostics) -> bool {
    match sess.config_set(lines).await {
        Ok(()) => true,
        Err(e) => {
            diags.add_error(CONFIG_SET_ERROR_SUMMARY, e);
            false
        }
    }
}

pub async fn create<R: ResourceData>(data: &ProviderData, mut plan: R) -> LifecycleResponse {
    let mut diags = Diagnostics::new();

    if let Some(set_file) = data.fake_create_session() {
        let lines = match plan.set_lines() {
            Ok(lines) => lines,
            Err(e) => {
                add_set_error(&mut diags, e);
                return LifecycleResponse::failed(diags);
            }
        };
        if !write_set_file(&*set_file, &lines, &mut diags).await {
            return LifecycleResponse::failed(diags);
        }
        plan.fill_id();
        return LifecycleResponse::from_state(Some(plan), diags);
    }

    let Some(sess) = start_session(data, &mut diags).await else {
        return LifecycleResponse::failed(diags);
    };
    let state = create_on(&*sess, plan, &mut diags).await;
    close_session(&*sess).await;
    LifecycleResponse::from_state(state, diags)
}

async fn create_on<R: ResourceData>(
    sess: &dyn Session,
    mut plan: R,
    diags: &mut Diagnostics,
) -> Option<R> {
    if !lock(sess, diags).await {
        return None;
    }

    if let Err(e) = plan.pre_create_check(sess, diags).await {
        diags.add_error(PRE_CHECK_ERROR_SUMMARY, e);
    }
    if !diags.has_error() {
        match plan.exists(sess).await {
            Ok(true) => diags.add_error(
                DUPLICATE_CONFIG_ERROR_SUMMARY,
                format!("{} already exists", plan.display_name()),
            ),
            Ok(false) => {}
            Err(e) => diags.add_error(PRE_CHECK_ERROR_SUMMARY, e),
        }
    }
    if diags.has_error() {
        clear(sess, diags).await;
        return None;
    }

    let lines = match plan.set_lines() {
        Ok(lines) => lines,
        Err(e) => {
            add_set_error(diags, e);
            clear(sess, diags).await;
            return None;
        }
    };
    if let Err(e) = sess.config_set(&lines).await {
        diags.add_error(CONFIG_SET_ERROR_SUMMARY, e);
        clear(sess, diags).await;
        return None;
    }

    if !commit(sess, &format!("create resource {}", R::type_name()), diags).await {
        return None;
    }

    match plan.exists(sess).await {
        Ok(true) => {}
        Ok(false) => {
            diags.add_error(
                NOT_FOUND_ERROR_SUMMARY,
                format!(
                    "{} not exists after commit => check your config",
                    plan.display_name()
                ),
            );
            return None;
        }
        Err(e) => {
            diags.add_error(POST_CHECK_ERROR_SUMMARY, e);
            return None;
        }
    }

    plan.fill_id();
    info!(resource = %R::type_name(), id = %plan.key_id(), "Resource created");
    Some(plan)
}

pub async fn read<R: ResourceData>(data: &ProviderData, state: R) -> LifecycleResponse {
    let mut diags = Diagnostics::new();
    let Some(sess) = start_session(data, &mut diags).await else {
        return LifecycleResponse::failed(diags);
    };

    let result = state.read(&*sess).await;
    close_session(&*sess).await;

    match result {
        Ok(Some(mut current)) => {
            current.fill_id();
            LifecycleResponse::from_state(Some(current), diags)
        }
        Ok(None) => {
            info!(resource = %R::type_name(), id = %state.key_id(), "Resource not found, removing from state");
            LifecycleResponse::from_state(None::<R>, diags)
        }
        Err(e) => {
            diags.add_error(CONFIG_READ_ERROR_SUMMARY, e);
            LifecycleResponse::from_state(Some(state), diags)
        }
    }
}

pub async fn update<R: ResourceData>(data: &ProviderData, prior: R, mut plan: R) -> LifecycleResponse {
    let mut diags = Diagnostics::new();

    if data.fake_update_also() {
        if let Some(set_file) = data.fake_create_session() {
            let lines = match plan.set_lines() {
                Ok(lines) => lines,
                Err(e) => {
                    add_set_error(&mut diags, e);
                    return LifecycleResponse::failed(diags);
                }
            };
            let mut all = prior.update_del_lines();
            all.extend(lines);
            if !write_set_file(&*set_file, &all, &mut diags).await {
                return LifecycleResponse::failed(diags);
            }
            plan.fill_id();
            return LifecycleResponse::from_state(Some(plan), diags);
        }
    }

    let Some(sess) = start_session(data, &mut diags).await else {
        return LifecycleResponse::failed(diags);
    };
    let state = update_on(&*sess, &prior, plan, &mut diags).await;
    close_session(&*sess).await;
    LifecycleResponse::from_state(state, diags)
}

async fn update_on<R: ResourceData>(
    sess: &dyn Session,
    prior: &R,
    mut plan: R,
    diags: &mut Diagnostics,
) -> Option<R> {
    if !lock(sess, diags).await {
        return None;
    }

    if let Err(e) = sess.config_set(&prior.update_del_lines()).await {
        diags.add_error(CONFIG_DEL_ERROR_SUMMARY, e);
        clear(sess, diags).await;
        return None;
    }

    let lines = match plan.set_lines() {
        Ok(lines) => lines,
        Err(e) => {
            add_set_error(diags, e);
            clear(sess, diags).await;
            return None;
        }
    };
    if let Err(e) = sess.config_set(&lines).await {
        diags.add_error(CONFIG_SET_ERROR_SUMMARY, e);
        clear(sess, diags).await;
        return None;
    }

    if !commit(sess, &format!("update resource {}", R::type_name()), diags).await {
        return None;
    }

    plan.fill_id();
    info!(resource = %R::type_name(), id = %plan.key_id(), "Resource updated");
    Some(plan)
}

pub async fn delete<R: ResourceData>(data: &ProviderData, state: R) -> LifecycleResponse {
    let mut diags = Diagnostics::new();

    if data.fake_delete_also() {
        if let Some(set_file) = data.fake_create_session() {
            if !write_set_file(&*set_file, &state.del_lines(), &mut diags).await {
                return LifecycleResponse::from_state(Some(state), diags);
            }
            return LifecycleResponse::failed(diags);
        }
    }

    let Some(sess) = start_session(data, &mut diags).await else {
        return LifecycleResponse::failed(diags);
    };

    if lock(&*sess, &mut diags).await {
        match sess.config_set(&state.del_lines()).await {
            Ok(()) => {
                if commit(&*sess, &format!("delete resource {}", R::type_name()), &mut diags).await {
                    info!(resource = %R::type_name(), id = %state.key_id(), "Resource deleted");
                }
            }
            Err(e) => {
                diags.add_error(CONFIG_DEL_ERROR_SUMMARY, e);
                clear(&*sess, &mut diags).await;
            }
        }
    }
    close_session(&*sess).await;

    if diags.has_error() {
        // deletion failed, the resource stays in state
        return LifecycleResponse::from_state(Some(state), diags);
    }
    LifecycleResponse::failed(diags)
}

pub async fn import<R: ResourceData>(data: &ProviderData, id: &str) -> LifecycleResponse {
    let mut diags = Diagnostics::new();

    let Some(keys) = R::from_id(id) else {
        diags.add_error(
            IMPORT_ERROR_SUMMARY,
            format!("invalid id '{}' (id must be {})", id, R::id_format()),
        );
        return LifecycleResponse::failed(diags);
    };

    let Some(sess) = start_session(data, &mut diags).await else {
        return LifecycleResponse::failed(diags);
    };
    let result = keys.read(&*sess).await;
    close_session(&*sess).await;

    match result {
        Ok(Some(mut current)) => {
            current.fill_id();
            LifecycleResponse::from_state(Some(current), diags)
        }
        Ok(None) => {
            diags.add_error(
                NOT_FOUND_ERROR_SUMMARY,
                format!(
                    "don't find {} with id '{}' (id must be {})",
                    keys.display_name(),
                    id,
                    R::id_format()
                ),
            );
            LifecycleResponse::failed(diags)
        }
        Err(e) => {
            diags.add_error(CONFIG_READ_ERROR_SUMMARY, e);
            LifecycleResponse::failed(diags)
        }
    }
}
