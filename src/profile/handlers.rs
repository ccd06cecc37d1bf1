use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};
use tracing::instrument;

use crate::{auth::jwt::AuthUser, auth::repo::User, crypto, error::ApiError, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/user/profile", get(get_profile))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    // Clients consume this as `encryptedProfile`
    #[serde(rename = "encryptedProfile")]
    pub encrypted_profile: String,
}

const JOINED_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

fn joined_date(created_at: OffsetDateTime) -> Result<String, ApiError> {
    created_at
        .format(JOINED_FORMAT)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("format joined date: {e}")))
}

/// Returns the caller's profile fields, sealed with the caller's derived
/// key before they cross the trust boundary. The plaintext never appears
/// in the response or the logs.
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let payload = json!({
        "email": user.email,
        "joined": joined_date(user.created_at)?,
    });

    let key = crypto::derive_profile_key(&state.config.encrypt_key, user.id);
    let encrypted_profile = crypto::encrypt(&payload, &key)?;

    Ok(Json(ProfileResponse { encrypted_profile }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    #[test]
    fn response_serializes_as_encrypted_profile_camel_case() {
        let resp = ProfileResponse {
            encrypted_profile: "aa:bb:cc".into(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["encryptedProfile"], "aa:bb:cc");
        assert!(json.get("encrypted_profile").is_none());
    }

    #[test]
    fn joined_is_the_date_part_only() {
        let created = datetime!(2024-03-01 15:42:07 UTC);
        assert_eq!(joined_date(created).unwrap(), "2024-03-01");
    }

    #[test]
    fn profile_payload_decrypts_with_the_users_key() {
        let master = [7u8; 32];
        let user_id = Uuid::new_v4();
        let payload = json!({ "email": "a@x.com", "joined": "2024-03-01" });

        let key = crypto::derive_profile_key(&master, user_id);
        let encoded = crypto::encrypt(&payload, &key).expect("encrypt");
        assert_eq!(encoded.matches(':').count(), 2);

        let decoded = crypto::decrypt(&encoded, &key).expect("decrypt");
        assert_eq!(decoded["email"], "a@x.com");
        assert_eq!(decoded["joined"], "2024-03-01");
    }
}
