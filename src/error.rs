use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to load Kubernetes configuration")]
    Config(#[source] BoxError),

    #[error("failed to initialize Kubernetes client")]
    Client(#[source] kube::Error),

    #[error("namespace is required for {0} lookups")]
    MissingNamespace(&'static str),

    #[error(transparent)]
    Api(kube::Error),

    #[error("failed to read manifest {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest")]
    Parse(#[source] serde_yaml::Error),

    #[error("manifest holds more than one document")]
    MultipleDocuments,

    #[error("manifest is empty")]
    EmptyManifest,

    #[error("manifest has no kind")]
    MissingKind,

    #[error("unsupported kind: {0}")]
    UnsupportedKind(String),

    #[error("failed to decode {kind} manifest")]
    Decode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Create(kube::Error),
}

impl InspectError {
    /// HTTP status code reported by the API server, if the failure came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(kube::Error::Api(response)) | Self::Create(kube::Error::Api(response)) => {
                Some(response.code)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(409)
    }
}
