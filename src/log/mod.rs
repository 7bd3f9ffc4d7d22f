use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::wire::ChatMessage;

/// stderr subscriber; `RUST_LOG` wins over `--debug`.
pub fn init_tracing(debug: bool) {
    let fallback = if debug { "routine_picker=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Serialize)]
struct Exchange<'a> {
    session: Uuid,
    stage: &'a str,
    at: DateTime<Utc>,
    request: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Writes one request/reply pair per completion call under
/// `<root>/<session>/<stage>-<n>.json`.
pub struct ExchangeLog {
    dir: PathBuf,
    session: Uuid,
    seq: usize,
}

impl ExchangeLog {
    pub fn new(root: &Path, session: Uuid) -> Self {
        Self { dir: root.join(session.to_string()), session, seq: 0 }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(
        &mut self,
        stage: &str,
        request: &[ChatMessage],
        outcome: Result<&str, String>,
    ) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        self.seq += 1;
        let (reply, error) = match outcome {
            Ok(r) => (Some(r), None),
            Err(e) => (None, Some(e)),
        };
        let record = Exchange { session: self.session, stage, at: Utc::now(), request, reply, error };
        let p = self.dir.join(format!("{stage}-{}.json", self.seq));
        fs::write(&p, to_string_pretty(&record)?)?;
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_numbered_stage_files() {
        let root = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let mut log = ExchangeLog::new(root.path(), id);
        let req = vec![ChatMessage::user("hi")];

        let first = log.save("routine", &req, Ok("steps")).unwrap();
        let second = log.save("chat", &req, Err("HTTP error! status: 500".into())).unwrap();

        assert!(first.ends_with(format!("{id}/routine-1.json")));
        assert!(second.ends_with(format!("{id}/chat-2.json")));

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(v["error"], "HTTP error! status: 500");
        assert!(v.get("reply").is_none());
        assert_eq!(v["request"][0]["role"], "user");
    }
}
