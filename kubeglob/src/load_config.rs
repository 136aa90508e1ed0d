/// `load_config` module: reads a kubeconfig file and resolves one context into a
/// ready-to-use [`ClusterConfig`].
///
/// This is the only place where kubeconfig YAML is parsed. Everything downstream
/// (the cluster client) works with the resolved, strongly-typed result.
///
/// # Responsibilities
/// - Parse the `clusters` / `contexts` / `users` lists and `current-context`
/// - Pick the requested context (or the current one) and join it with its cluster and user
/// - Inline file references (`certificate-authority`, `client-certificate`, `client-key`,
///   `tokenFile`), resolving relative paths against the kubeconfig's own directory
/// - Decode the base64 `*-data` variants
///
/// # Not supported
/// `exec` and `auth-provider` credential plugins. A user entry relying on one is
/// rejected with a clear error instead of silently connecting anonymously.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Connection settings for one cluster, as resolved from a kubeconfig context.
#[derive(Clone)]
pub struct ClusterConfig {
    pub context: String,
    /// API server base URL, e.g. `https://127.0.0.1:6443`.
    pub server: String,
    /// PEM bundle of extra trusted roots.
    pub certificate_authority: Option<Vec<u8>>,
    pub insecure_skip_tls_verify: bool,
    /// PEM containing the client certificate followed by its private key.
    pub client_identity: Option<Vec<u8>>,
    pub credentials: Credentials,
}

impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("context", &self.context)
            .field("server", &self.server)
            .field("certificate_authority", &self.certificate_authority.is_some())
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("client_identity", &self.client_identity.is_some())
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    None,
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Kubeconfig {
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    users: Vec<NamedUser>,
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterEntry {
    server: String,
    certificate_authority: Option<PathBuf>,
    certificate_authority_data: Option<String>,
    #[serde(default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    #[serde(default)]
    user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct UserEntry {
    token: Option<String>,
    #[serde(rename = "tokenFile")]
    token_file: Option<PathBuf>,
    client_certificate: Option<PathBuf>,
    client_certificate_data: Option<String>,
    client_key: Option<PathBuf>,
    client_key_data: Option<String>,
    username: Option<String>,
    password: Option<String>,
    exec: Option<serde_yaml::Value>,
    auth_provider: Option<serde_yaml::Value>,
}

/// Default kubeconfig location: the first entry of `$KUBECONFIG`, else `$HOME/.kube/config`.
pub fn default_kubeconfig_path() -> PathBuf {
    if let Some(raw) = std::env::var_os("KUBECONFIG") {
        if let Some(first) = std::env::split_paths(&raw).find(|p| !p.as_os_str().is_empty()) {
            return first;
        }
    }
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(".kube").join("config")
}

/// Loads a kubeconfig file and resolves `context` (or `current-context` when `None`).
pub fn load_config<P: AsRef<Path>>(path: P, context: Option<&str>) -> Result<ClusterConfig> {
    let path_ref = path.as_ref();
    info!(kubeconfig = ?path_ref, "Loading kubeconfig");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, kubeconfig = ?path_ref, "Failed to read kubeconfig");
            return Err(anyhow::anyhow!(
                "Failed to read kubeconfig {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: Kubeconfig = match serde_yaml::from_str(&content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, kubeconfig = ?path_ref, "Failed to parse kubeconfig YAML");
            return Err(anyhow::anyhow!("Failed to parse kubeconfig YAML: {e}"));
        }
    };

    let base_dir = path_ref.parent().unwrap_or_else(|| Path::new("."));
    let resolved = resolve(raw, context, base_dir)?;
    info!(
        context = %resolved.context,
        server = %resolved.server,
        "Kubeconfig resolved"
    );
    Ok(resolved)
}

fn resolve(raw: Kubeconfig, context: Option<&str>, base_dir: &Path) -> Result<ClusterConfig> {
    let context_name = match context.or(raw.current_context.as_deref()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => bail!("No context given and kubeconfig has no current-context"),
    };

    let ctx = raw
        .contexts
        .iter()
        .find(|c| c.name == context_name)
        .with_context(|| format!("Context {context_name:?} not found in kubeconfig"))?;

    let cluster = raw
        .clusters
        .iter()
        .find(|c| c.name == ctx.context.cluster)
        .with_context(|| {
            format!(
                "Cluster {:?} (context {context_name:?}) not found in kubeconfig",
                ctx.context.cluster
            )
        })?;

    let user = match ctx.context.user.as_deref() {
        None | Some("") => UserEntry::default(),
        Some(user_name) => {
            let named = raw
                .users
                .into_iter()
                .find(|u| u.name == user_name)
                .with_context(|| {
                    format!("User {user_name:?} (context {context_name:?}) not found in kubeconfig")
                })?;
            named.user
        }
    };

    if user.exec.is_some() || user.auth_provider.is_some() {
        bail!("User of context {context_name:?} relies on an exec or auth-provider plugin, which kubeglob does not support");
    }

    let certificate_authority = inline(
        cluster.cluster.certificate_authority_data.as_deref(),
        cluster.cluster.certificate_authority.as_deref(),
        base_dir,
        "certificate-authority",
    )?;

    let client_certificate = inline(
        user.client_certificate_data.as_deref(),
        user.client_certificate.as_deref(),
        base_dir,
        "client-certificate",
    )?;
    let client_key = inline(
        user.client_key_data.as_deref(),
        user.client_key.as_deref(),
        base_dir,
        "client-key",
    )?;
    let client_identity = match (client_certificate, client_key) {
        (Some(mut cert), Some(key)) => {
            if !cert.ends_with(b"\n") {
                cert.push(b'\n');
            }
            cert.extend_from_slice(&key);
            Some(cert)
        }
        (None, None) => None,
        _ => bail!("User of context {context_name:?} must set both client-certificate and client-key"),
    };

    let token = match (user.token, user.token_file) {
        (Some(token), _) if !token.is_empty() => Some(token),
        (_, Some(file)) => {
            let file = base_dir.join(file);
            let token = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read tokenFile {}", file.display()))?;
            Some(token.trim().to_string())
        }
        _ => None,
    };

    let credentials = match (token, user.username) {
        (Some(token), _) => Credentials::Bearer(token),
        (None, Some(username)) => Credentials::Basic {
            username,
            password: user.password,
        },
        (None, None) => Credentials::None,
    };

    Ok(ClusterConfig {
        context: context_name,
        server: cluster.cluster.server.trim_end_matches('/').to_string(),
        certificate_authority,
        insecure_skip_tls_verify: cluster.cluster.insecure_skip_tls_verify,
        client_identity,
        credentials,
    })
}

/// Prefer inline base64 data over a file reference.
fn inline(data: Option<&str>, file: Option<&Path>, base_dir: &Path, field: &str) -> Result<Option<Vec<u8>>> {
    if let Some(data) = data.filter(|d| !d.is_empty()) {
        let bytes = STANDARD
            .decode(data.trim())
            .with_context(|| format!("{field}-data is not valid base64"))?;
        return Ok(Some(bytes));
    }
    match file {
        Some(file) => {
            let file = base_dir.join(file);
            let bytes = fs::read(&file)
                .with_context(|| format!("Failed to read {field} {}", file.display()))?;
            Ok(Some(bytes))
        }
        None => Ok(None),
    }
}
