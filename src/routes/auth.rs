// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Azure AD sign-in and sign-out routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_cookie, verify_jwt, SESSION_COOKIE};
use crate::services::Session;
use crate::time_utils::now_millis;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a sign-in attempt may take before its state is rejected.
const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

pub const NONCE_COOKIE: &str = "planner_oauth_nonce";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signin", get(sign_in))
        .route("/auth/callback", get(callback))
        .route("/auth/signout", post(sign_out))
}

/// Create the signed OAuth state:
/// base64url("nonce|timestamp_hex|signature_hex").
fn sign_state(nonce: &str, timestamp_ms: i64, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", nonce, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the state signature and age. Returns the embedded nonce.
fn verify_state(state: &str, secret: &[u8], now_ms: i64) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let (payload, signature_hex) = state_str.rsplit_once('|')?;
    let (nonce, timestamp_hex) = payload.split_once('|')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued = i64::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms - issued > STATE_MAX_AGE_MS || issued > now_ms {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(nonce.to_string())
}

fn random_nonce() -> Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(bytes))
}

/// Nonce cookie tying the callback to the browser that started sign-in.
fn nonce_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, value))
        .path("/auth/callback")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::milliseconds(STATE_MAX_AGE_MS))
        .build()
}

/// Start sign-in - redirect to the Azure AD authorize endpoint.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let nonce = random_nonce()?;
    let oauth_state = sign_state(&nonce, now_millis(), &state.config.session_secret)?;
    let auth_url = state.identity.authorize_url(&oauth_state);

    tracing::info!(
        client_id = %state.config.client_id,
        "Starting sign-in, redirecting to identity provider"
    );

    let jar = jar.add(nonce_cookie(nonce, state.config.is_https()));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth callback - exchange code for tokens, create session.
async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        tracing::warn!(
            error = %error,
            description = params.error_description.as_deref().unwrap_or(""),
            "Sign-in error from identity provider"
        );
        return Err(AppError::Auth(format!("Sign-in failed: {}", error)));
    }

    let oauth_state = params.state.unwrap_or_default();
    let nonce = verify_state(&oauth_state, &state.config.session_secret, now_millis())
        .ok_or_else(|| AppError::BadRequest("Invalid OAuth state".to_string()))?;

    let nonce_matches = jar
        .get(NONCE_COOKIE)
        .map(|c| bool::from(c.value().as_bytes().ct_eq(nonce.as_bytes())))
        .unwrap_or(false);
    if !nonce_matches {
        tracing::warn!("OAuth state nonce does not match this browser");
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");

    let token = state.identity.exchange_code(&code).await?;
    let credential = token.into_credential(now_millis(), None);

    let profile = state.graph.get_me(&credential.access_token).await?;
    let email = profile
        .login_email()
        .ok_or_else(|| AppError::Auth("Signed-in account has no email".to_string()))?
        .to_string();

    let session_id = state.sessions.create(Session {
        email: email.clone(),
        name: profile.display_name.clone(),
        credential,
    })?;

    let jwt = create_jwt(
        &session_id,
        &email,
        &profile.display_name,
        &state.config.session_secret,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(email = %email, "Sign-in successful");

    let secure = state.config.is_https();
    let jar = jar
        .remove(nonce_cookie(String::new(), secure))
        .add(session_cookie(jwt, secure));
    Ok((jar, Redirect::temporary("/")))
}

/// Sign out - drop the server-side session and clear the cookie.
/// POST only; the Lax session cookie is not sent on cross-site POSTs.
async fn sign_out(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(claims) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| verify_jwt(c.value(), &state.config.session_secret))
    {
        state.sessions.remove(&claims.sub);
    }

    let jar = jar.remove(session_cookie(String::new(), state.config.is_https()));
    (jar, Redirect::temporary("/"))
}
