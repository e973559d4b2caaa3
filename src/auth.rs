use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use actix_web::{
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, HttpMessage, HttpRequest, HttpResponse,
};
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    models::{AuthSession, ROLE_ADMIN},
    state::AppState,
};

pub const AUTH_COOKIE: &str = "auth_token";

/// Stand-in for a network round trip; there is no backend to call.
const LOGIN_DELAY: StdDuration = StdDuration::from_millis(800);

#[derive(Clone, Debug)]
struct Credential {
    username: String,
    name: String,
    role: String,
    password_hash: String,
}

/// Credential check plus the session table. The cookie carries only an
/// opaque token; everything about the user lives server-side, so the
/// "logged in" marker and the session record cannot drift apart.
#[derive(Clone)]
pub struct AuthGate {
    users: Arc<Vec<Credential>>,
    sessions: Arc<Mutex<HashMap<String, AuthSession>>>,
}

impl AuthGate {
    pub fn new(username: &str, password: &str, name: &str) -> Result<Self, password_hash::Error> {
        let credential = Credential {
            username: username.to_string(),
            name: name.to_string(),
            role: ROLE_ADMIN.to_string(),
            password_hash: hash_password(password)?,
        };
        Ok(Self {
            users: Arc::new(vec![credential]),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Admin account from the environment, falling back to the demo pair.
    pub fn from_env() -> Result<Self, password_hash::Error> {
        let username = env::var("ADMIN_USER").unwrap_or_else(|_| "admin@example.com".to_string());
        let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        let name = env::var("ADMIN_DISPLAY_NAME").unwrap_or_else(|_| "Admin User".to_string());
        if password == "admin123" {
            log::warn!("ADMIN_PASSWORD not set. Using the demo password. Set ADMIN_PASSWORD in production.");
        }
        Self::new(&username, &password, &name)
    }

    /// Checks the credential pair and, on success, opens a session and
    /// returns its token. Failure leaves every session untouched.
    pub async fn login(&self, username: &str, password: &str) -> Option<String> {
        tokio::time::sleep(LOGIN_DELAY).await;

        let user = self
            .users
            .iter()
            .find(|user| user.username == username)
            .filter(|user| verify_password(password, &user.password_hash))?;

        let token = new_id();
        let session = AuthSession {
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
        };
        self.sessions.lock().await.insert(token.clone(), session);
        Some(token)
    }

    pub async fn logout(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }

    pub async fn session(&self, token: &str) -> Option<AuthSession> {
        self.sessions.lock().await.get(token).cloned()
    }

    pub async fn is_authenticated(&self, token: &str) -> bool {
        self.sessions.lock().await.contains_key(token)
    }
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = PasswordHash::new(password_hash);
    match parsed_hash {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn auth_cookie(req: &HttpRequest, token: &str) -> Cookie<'static> {
    let mut builder = Cookie::build(AUTH_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(1));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn clear_auth_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(AUTH_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn auth_token(req: &HttpRequest) -> Option<String> {
    req.cookie(AUTH_COOKIE).map(|cookie| cookie.value().to_string())
}

/// Admin-scope middleware: resolves the token cookie to a session and makes
/// it available to handlers, or bounces to the login page.
pub async fn session_guard<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: actix_web::body::MessageBody + 'static,
{
    let session = match req.app_data::<web::Data<AppState>>() {
        Some(state) => match auth_token(req.request()) {
            Some(token) => state.auth.session(&token).await,
            None => None,
        },
        None => None,
    };

    match session {
        Some(session) => {
            req.extensions_mut().insert(session);
            let res = next.call(req).await?;
            Ok(res.map_into_boxed_body())
        }
        None => {
            let login_url = format!("/login?next={}", req.path());
            let response = HttpResponse::SeeOther()
                .append_header((header::LOCATION, login_url))
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .finish();
            Ok(req.into_response(response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AuthGate {
        AuthGate::new("admin@example.com", "admin123", "Admin User").unwrap()
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("admin123").unwrap();
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("admin123", "not-a-hash"));
    }

    #[actix_web::test]
    async fn valid_credentials_open_a_session() {
        let gate = gate();
        let token = gate.login("admin@example.com", "admin123").await.unwrap();
        assert!(gate.is_authenticated(&token).await);
        let session = gate.session(&token).await.unwrap();
        assert_eq!(session.username, "admin@example.com");
        assert_eq!(session.name, "Admin User");
        assert_eq!(session.role, ROLE_ADMIN);
    }

    #[actix_web::test]
    async fn rejected_login_changes_nothing() {
        let gate = gate();
        let token = gate.login("admin@example.com", "admin123").await.unwrap();
        assert!(gate.login("x", "y").await.is_none());
        assert!(gate.login("admin@example.com", "wrong").await.is_none());
        // The earlier session is still there and no new one appeared.
        assert!(gate.is_authenticated(&token).await);
        assert!(!gate.is_authenticated("some-other-token").await);
    }

    #[actix_web::test]
    async fn logout_closes_the_session() {
        let gate = gate();
        let token = gate.login("admin@example.com", "admin123").await.unwrap();
        gate.logout(&token).await;
        assert!(!gate.is_authenticated(&token).await);
        assert!(gate.session(&token).await.is_none());
    }
}
