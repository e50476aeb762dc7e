use crate::domain::Environment;

/// Raised while wiring the environment stores or the transport, before any
/// request is served.
#[derive(thiserror::Error)]
pub enum ConfigurationError {
    #[error("The {environment} store is missing its `{field}` setting.")]
    Missing {
        environment: Environment,
        field: &'static str,
    },
    #[error("The dev and prod stores both resolve to {0}; they must be separate stores.")]
    SharedEndpoint(String),
    #[error("The sender address is invalid: {0}")]
    InvalidSender(String),
}

impl std::fmt::Debug for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// A required argument was missing or unusable. Always raised before any I/O.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("A content record is required.")]
    MissingRecord,
    #[error("The post has no slug.")]
    MissingSlug,
    #[error("Source and target environments must differ (both were {0}).")]
    SameEnvironment(Environment),
    #[error("Only published posts can be promoted; '{0}' is still a draft.")]
    Unpublished(String),
    #[error("No post with slug '{slug}' exists in the {environment} store.")]
    UnknownSlug {
        slug: String,
        environment: Environment,
    },
}

#[derive(thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Failed to render the {0} template.")]
    Template(&'static str, #[source] tera::Error),
}

impl std::fmt::Debug for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Failed to reach the store.")]
    Connection(#[source] anyhow::Error),
    #[error("A store constraint was violated: {0}")]
    Constraint(String),
    #[error("The requested row does not exist.")]
    NotFound,
    #[error("A store query failed.")]
    Query(#[source] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
