use axum::{extract::State, routing::get, Extension, Json, Router};

use millwork_catalog::PresetValues;
use millwork_core::Permission;

use crate::{error::AppError, middleware::auth::UserClaims, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/settings/presets", get(get_presets).put(update_presets))
}

/// GET /v1/settings/presets
async fn get_presets(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> Result<Json<PresetValues>, AppError> {
    claims.require(Permission::ViewCatalog)?;
    Ok(Json(state.presets.read().await.clone()))
}

/// PUT /v1/settings/presets
async fn update_presets(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    Json(presets): Json<PresetValues>,
) -> Result<Json<PresetValues>, AppError> {
    claims.require(Permission::ManageSettings)?;
    presets.validate()?;

    *state.presets.write().await = presets.clone();
    tracing::info!(user = %claims.sub, "Preset values updated");
    Ok(Json(presets))
}
