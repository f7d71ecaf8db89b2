use dashmap::DashMap;

/// Who is making the request. Resolved once at the adapter boundary and
/// passed explicitly into every engine operation — the engine never reads
/// ambient request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub admin: bool,
}

impl Identity {
    pub fn user(name: &str) -> Self {
        Self {
            user: name.to_string(),
            admin: false,
        }
    }

    pub fn admin(name: &str) -> Self {
        Self {
            user: name.to_string(),
            admin: true,
        }
    }
}

/// Bearer-token table. Token issuance is an external concern; this only
/// resolves already-issued tokens to identities.
#[derive(Default)]
pub struct TokenAuth {
    tokens: DashMap<String, Identity>,
}

impl TokenAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `token=user,token=user:admin,...` (the BELLHOP_TOKENS format).
    /// Malformed entries are skipped with a warning rather than taking the
    /// server down.
    pub fn parse(spec: &str) -> Self {
        let auth = Self::new();
        for entry in spec.split(',').filter(|e| !e.is_empty()) {
            let Some((token, subject)) = entry.split_once('=') else {
                tracing::warn!("skipping malformed token entry");
                continue;
            };
            if token.is_empty() || subject.is_empty() {
                tracing::warn!("skipping malformed token entry");
                continue;
            }
            let identity = match subject.strip_suffix(":admin") {
                Some(name) if !name.is_empty() => Identity::admin(name),
                Some(_) => {
                    tracing::warn!("skipping malformed token entry");
                    continue;
                }
                None => Identity::user(subject),
            };
            auth.tokens.insert(token.to_string(), identity);
        }
        auth
    }

    pub fn insert(&self, token: &str, identity: Identity) {
        self.tokens.insert(token.to_string(), identity);
    }

    pub fn authenticate(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).map(|e| e.value().clone())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
