//! Hosted backend-as-a-service client (GoTrue auth + PostgREST tables)

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{Backend, BackendError, Order, Query};
use crate::models::{
    AuthSession, AuthUser, ExerciseLogRow, NewExerciseLog, NewWorkoutLog, PersonalRecord, Profile,
    SetUpdate, WorkoutLog,
};

#[derive(Deserialize, Debug)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

/// Sign-up answers with a session when confirmation is off, a bare user otherwise
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

#[derive(Deserialize, Debug, Default)]
struct ApiError {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ApiError {
    fn into_message(self) -> String {
        self.error_description
            .or(self.message)
            .or(self.msg)
            .or(self.error)
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[derive(Deserialize)]
struct IdRow {
    id: String,
}

pub struct SupabaseBackend {
    client: Client,
    url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseBackend {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
        }
    }

    /// Resume a stored session so table requests carry the user's token
    pub fn with_session(self, session: Option<AuthSession>) -> Self {
        if let Ok(mut guard) = self.session.write() {
            *guard = session;
        }
        self
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    fn set_session(&self, session: Option<AuthSession>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = session;
        }
    }

    /// User's token if logged in, otherwise the anon key
    fn bearer(&self) -> String {
        self.session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    async fn check(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(ApiError::into_message)
            .unwrap_or(body);
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, BackendError> {
        debug!(table = query.table_name(), "select");
        let resp = self
            .request(Method::GET, &format!("/rest/v1/{}", query.table_name()))
            .query(&query.read_params())
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn insert<B, T>(&self, query: &Query, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(table = query.table_name(), "insert");
        let resp = self
            .request(Method::POST, &format!("/rest/v1/{}", query.table_name()))
            .query(&query.write_params())
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn upsert<B, T>(&self, query: &Query, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(table = query.table_name(), "upsert");
        let resp = self
            .request(Method::POST, &format!("/rest/v1/{}", query.table_name()))
            .query(&query.write_params())
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn update<B>(&self, query: &Query, body: &B) -> Result<(), BackendError>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!(table = query.table_name(), "update");
        let resp = self
            .request(Method::PATCH, &format!("/rest/v1/{}", query.table_name()))
            .query(&query.write_params())
            .json(body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    fn first<T>(rows: Vec<T>, what: &str) -> Result<T, BackendError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(what.to_string()))
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, BackendError> {
        let body = json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name }
        });
        let resp = self
            .client
            .post(format!("{}/auth/v1/signup", self.url))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let user = match Self::check(resp).await?.json::<SignUpResponse>().await? {
            SignUpResponse::Session(s) => s.user,
            SignUpResponse::User(u) => u,
        };
        info!(user_id = %user.id, "Signed up");
        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let resp = self
            .client
            .post(format!("{}/auth/v1/token", self.url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let resp = Self::check(resp).await.map_err(|e| match e {
            BackendError::Api { message, .. } => BackendError::Auth(message),
            other => other,
        })?;
        let session: GoTrueSession = resp.json().await?;
        let session = AuthSession {
            access_token: session.access_token,
            user: AuthUser {
                id: session.user.id,
                email: session.user.email,
            },
        };
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.session().is_some() {
            let resp = self
                .request(Method::POST, "/auth/v1/logout")
                .send()
                .await?;
            Self::check(resp).await?;
        }
        self.set_session(None);
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let rows: Vec<Profile> = self
            .select(&Query::table("profiles").eq("id", user_id).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, BackendError> {
        let rows = self
            .upsert(&Query::table("profiles").on_conflict("id"), profile)
            .await?;
        Self::first(rows, "profile")
    }

    async fn update_current_week(&self, user_id: &str, week: u32) -> Result<(), BackendError> {
        self.update(
            &Query::table("profiles").eq("id", user_id),
            &json!({ "current_week": week }),
        )
        .await
    }

    async fn find_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        week_number: u32,
    ) -> Result<Option<WorkoutLog>, BackendError> {
        let rows: Vec<WorkoutLog> = self
            .select(
                &Query::table("workout_logs")
                    .eq("user_id", user_id)
                    .eq("workout_day_id", workout_day_id)
                    .eq("week_number", week_number)
                    .order("completed_at", Order::Desc)
                    .limit(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn previous_workout_log(
        &self,
        user_id: &str,
        workout_day_id: u32,
        before_week: u32,
    ) -> Result<Option<WorkoutLog>, BackendError> {
        let rows: Vec<WorkoutLog> = self
            .select(
                &Query::table("workout_logs")
                    .eq("user_id", user_id)
                    .eq("workout_day_id", workout_day_id)
                    .lt("week_number", before_week)
                    .order("week_number", Order::Desc)
                    .limit(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_workout_log(&self, log: &NewWorkoutLog) -> Result<WorkoutLog, BackendError> {
        let rows = self.insert(&Query::table("workout_logs"), log).await?;
        Self::first(rows, "workout log")
    }

    async fn complete_workout_log(
        &self,
        id: &str,
        notes: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), BackendError> {
        self.update(
            &Query::table("workout_logs").eq("id", id),
            &json!({ "notes": notes, "completed_at": completed_at }),
        )
        .await
    }

    async fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>, BackendError> {
        self.select(
            &Query::table("workout_logs")
                .eq("user_id", user_id)
                .order("completed_at", Order::Asc),
        )
        .await
    }

    async fn exercise_logs(&self, workout_log_id: &str) -> Result<Vec<ExerciseLogRow>, BackendError> {
        self.select(
            &Query::table("exercise_logs")
                .eq("workout_log_id", workout_log_id)
                .order("exercise_id", Order::Asc)
                .order("set_number", Order::Asc),
        )
        .await
    }

    async fn find_exercise_set(
        &self,
        workout_log_id: &str,
        exercise_id: &str,
        set_number: u32,
    ) -> Result<Option<String>, BackendError> {
        let rows: Vec<IdRow> = self
            .select(
                &Query::table("exercise_logs")
                    .select("id")
                    .eq("workout_log_id", workout_log_id)
                    .eq("exercise_id", exercise_id)
                    .eq("set_number", set_number)
                    .limit(1),
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.id))
    }

    async fn insert_exercise_set(&self, row: &NewExerciseLog) -> Result<(), BackendError> {
        let _: Vec<serde_json::Value> = self.insert(&Query::table("exercise_logs"), row).await?;
        Ok(())
    }

    async fn update_exercise_set(&self, id: &str, update: &SetUpdate) -> Result<(), BackendError> {
        self.update(&Query::table("exercise_logs").eq("id", id), update)
            .await
    }

    async fn personal_records(&self, user_id: &str) -> Result<Vec<PersonalRecord>, BackendError> {
        self.select(&Query::table("personal_records").eq("user_id", user_id))
            .await
    }

    async fn upsert_personal_record(
        &self,
        record: &PersonalRecord,
    ) -> Result<PersonalRecord, BackendError> {
        let rows = self
            .upsert(
                &Query::table("personal_records").on_conflict("user_id,exercise_id"),
                record,
            )
            .await?;
        Self::first(rows, "personal record")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prefers_description() {
        let err: ApiError = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(err.into_message(), "Invalid login credentials");
    }

    #[test]
    fn test_api_error_postgrest_message() {
        let err: ApiError = serde_json::from_str(
            r#"{"code":"23505","message":"duplicate key value","details":null}"#,
        )
        .unwrap();
        assert_eq!(err.into_message(), "duplicate key value");
    }

    #[test]
    fn test_sign_up_response_shapes() {
        let with_session: SignUpResponse = serde_json::from_str(
            r#"{"access_token":"t","user":{"id":"u1","email":"a@b.co"}}"#,
        )
        .unwrap();
        assert!(matches!(with_session, SignUpResponse::Session(_)));

        let bare: SignUpResponse =
            serde_json::from_str(r#"{"id":"u2","email":"c@d.co","role":"authenticated"}"#).unwrap();
        match bare {
            SignUpResponse::User(u) => assert_eq!(u.id, "u2"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let backend = SupabaseBackend::new("https://example.supabase.co/", "anon");
        assert_eq!(backend.bearer(), "anon");
        assert_eq!(backend.url, "https://example.supabase.co");

        let backend = backend.with_session(Some(AuthSession {
            access_token: "user-token".into(),
            user: AuthUser {
                id: "u".into(),
                email: None,
            },
        }));
        assert_eq!(backend.bearer(), "user-token");
    }
}
