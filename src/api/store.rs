use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// On-disk home of the access token, so it outlives the process the way
/// the backend contract expects. One fixed location, cleared on logout.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `FIBU_TOKEN_FILE` wins, otherwise `$HOME/.fibu_token`.
    pub fn from_env() -> Self {
        let path = std::env::var("FIBU_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                Path::new(&home).join(".fibu_token")
            });
        Self { path }
    }

    pub fn store(&self, token: &str) -> io::Result<()> {
        fs::write(&self.path, token)
    }

    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> TokenStore {
        let path = std::env::temp_dir().join(format!("fibu-token-{}-{}", tag, std::process::id()));
        let store = TokenStore::new(path);
        store.clear().unwrap();
        store
    }

    #[test]
    fn store_and_load_roundtrip() {
        let store = temp_store("roundtrip");
        assert_eq!(store.load().unwrap(), None);

        store.store("abc123").unwrap();
        assert_eq!(store.load().unwrap(), Some("abc123".to_string()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = temp_store("clear");
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn blank_file_reads_as_no_token() {
        let store = temp_store("blank");
        store.store("  \n").unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }
}
