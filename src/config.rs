//! Service configuration (§6). Loaded from YAML, mirroring
//! `entity-gateway::config::entity_metadata`'s `GatewayConfig::from_file`/
//! `from_yaml` shape: one top-level struct with a sub-struct per
//! collaborator.

use serde::Deserialize;

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    50051
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_max_lifetime_secs() -> u64 {
    1800
}

/// Root configuration structure for the entity mesh.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub graph: GraphSection,
    #[serde(default)]
    pub document: DocumentSection,
    pub relational: RelationalSection,
}

/// gRPC bind address and per-request deadline (§5, §6).
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            bind_port: default_bind_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Placeholder for the concrete graph engine's connection details
/// (§1: the engine itself is out of scope; only the trait boundary is
/// specified). Present so a deployment has somewhere to put them
/// without touching code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphSection {
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Placeholder for the concrete document engine's connection details,
/// same rationale as `GraphSection`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentSection {
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// `sqlx::PgPoolOptions` bounds for C6 (§5: "pooled-connection
/// requirement").
#[derive(Debug, Clone, Deserialize)]
pub struct RelationalSection {
    pub database_url_env: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
}

impl ServiceConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: ServiceConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// The Postgres connection string, read from the environment
    /// variable `relational.database_url_env` names.
    pub fn database_url(&self) -> Result<String, Box<dyn std::error::Error>> {
        std::env::var(&self.relational.database_url_env).map_err(|e| {
            format!(
                "environment variable '{}' is not set: {e}",
                self.relational.database_url_env
            )
            .into()
        })
    }

    pub fn bind_addr(&self) -> Result<std::net::SocketAddr, Box<dyn std::error::Error>> {
        format!("{}:{}", self.service.bind_host, self.service.bind_port)
            .parse()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_yaml_with_defaults() {
        let yaml = r#"
relational:
  database_url_env: "DATABASE_URL"
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.service.bind_host, "0.0.0.0");
        assert_eq!(config.service.bind_port, 50051);
        assert_eq!(config.relational.max_connections, 10);
        assert_eq!(config.relational.database_url_env, "DATABASE_URL");
    }

    #[test]
    fn parses_full_yaml_overriding_defaults() {
        let yaml = r#"
service:
  bind_host: "127.0.0.1"
  bind_port: 9000
  request_timeout_secs: 5

graph:
  endpoint: "graph.internal:7687"

document:
  endpoint: "documents.internal:27017"

relational:
  database_url_env: "ENTITY_MESH_DATABASE_URL"
  max_connections: 20
  min_connections: 2
  idle_timeout_secs: 60
  max_lifetime_secs: 600
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.service.bind_port, 9000);
        assert_eq!(config.graph.endpoint.as_deref(), Some("graph.internal:7687"));
        assert_eq!(config.relational.max_connections, 20);

        let addr = config.bind_addr().unwrap();
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn missing_database_url_env_value_is_a_readable_error() {
        let yaml = r#"
relational:
  database_url_env: "ENTITY_MESH_DOES_NOT_EXIST"
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        let err = config.database_url().unwrap_err();
        assert!(err.to_string().contains("ENTITY_MESH_DOES_NOT_EXIST"));
    }
}
