//! Runtime configuration - storage paths and backend selection

use std::sync::Arc;

use tracing::info;

use crate::backend::{Backend, BackendError, SqliteBackend, SupabaseBackend};
use crate::local::{LocalError, LocalStore};
use crate::models::AuthSession;

pub const DEFAULT_DB_PATH: &str = "hybrid_athlete.db";
pub const DEFAULT_LOCAL_PATH: &str = "hybrid_athlete_local.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file used when no remote backend is configured
    pub db_path: String,
    /// Client-side store (session, unsaved sets)
    pub local_path: String,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendChoice<'a> {
    Supabase { url: &'a str, anon_key: &'a str },
    Sqlite { path: &'a str },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            local_path: DEFAULT_LOCAL_PATH.to_string(),
            supabase_url: None,
            supabase_anon_key: None,
        }
    }
}

impl Config {
    /// Remote backend only when both URL and key are non-empty
    pub fn backend_choice(&self) -> BackendChoice<'_> {
        match (non_empty(&self.supabase_url), non_empty(&self.supabase_anon_key)) {
            (Some(url), Some(anon_key)) => BackendChoice::Supabase { url, anon_key },
            _ => BackendChoice::Sqlite {
                path: &self.db_path,
            },
        }
    }

    /// Open the configured backend, resuming `session` on the remote one
    pub fn open_backend(
        &self,
        session: Option<AuthSession>,
    ) -> Result<Arc<dyn Backend>, BackendError> {
        match self.backend_choice() {
            BackendChoice::Supabase { url, anon_key } => {
                info!(url, "Using remote backend");
                Ok(Arc::new(
                    SupabaseBackend::new(url, anon_key).with_session(session),
                ))
            }
            BackendChoice::Sqlite { path } => Ok(Arc::new(SqliteBackend::open(path)?)),
        }
    }

    pub fn open_local(&self) -> Result<LocalStore, LocalError> {
        LocalStore::open(&self.local_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_sqlite() {
        let config = Config::default();
        assert_eq!(
            config.backend_choice(),
            BackendChoice::Sqlite {
                path: DEFAULT_DB_PATH
            }
        );
    }

    #[test]
    fn test_remote_needs_url_and_key() {
        let mut config = Config {
            supabase_url: Some("https://x.supabase.co".into()),
            ..Config::default()
        };
        assert!(matches!(config.backend_choice(), BackendChoice::Sqlite { .. }));

        config.supabase_anon_key = Some("  ".into());
        assert!(matches!(config.backend_choice(), BackendChoice::Sqlite { .. }));

        config.supabase_anon_key = Some("anon".into());
        assert_eq!(
            config.backend_choice(),
            BackendChoice::Supabase {
                url: "https://x.supabase.co",
                anon_key: "anon"
            }
        );
    }

    #[test]
    fn test_open_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("db.sqlite").to_string_lossy().into_owned(),
            local_path: dir.path().join("local.sqlite").to_string_lossy().into_owned(),
            ..Config::default()
        };
        assert!(config.open_local().is_ok());
        let backend = config.open_backend(None).unwrap();
        assert_eq!(backend.name(), "sqlite");
    }
}
