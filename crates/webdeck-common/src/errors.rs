use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("url must be absolute: {0}")]
    RelativeUrl(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage path could not be resolved")]
    NoPath,

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("clipboard access denied: {0}")]
    ClipboardDenied(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WebdeckError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("unknown app: {0}")]
    UnknownApp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::InvalidUrl("not a url".into());
        assert_eq!(err.to_string(), "invalid url: not a url");

        let err = ValidationError::RelativeUrl("/settings".into());
        assert_eq!(err.to_string(), "url must be absolute: /settings");
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::NoPath;
        assert_eq!(err.to_string(), "storage path could not be resolved");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::Io {
            path: PathBuf::from("/data/web-os.json"),
            source: io,
        };
        assert!(err.to_string().contains("/data/web-os.json"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn platform_error_display() {
        let err = PlatformError::ClipboardDenied("user refused".into());
        assert_eq!(err.to_string(), "clipboard access denied: user refused");
    }

    #[test]
    fn webdeck_error_from_validation() {
        let err: WebdeckError = ValidationError::InvalidUrl("x".into()).into();
        assert!(matches!(err, WebdeckError::Validation(_)));
        assert!(err.to_string().contains("invalid url"));
    }

    #[test]
    fn webdeck_error_from_storage() {
        let err: WebdeckError = StorageError::NoPath.into();
        assert!(matches!(err, WebdeckError::Storage(_)));
    }

    #[test]
    fn webdeck_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: WebdeckError = io.into();
        assert!(matches!(err, WebdeckError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn webdeck_error_direct_variants() {
        let err = WebdeckError::UnknownApp("abc".into());
        assert_eq!(err.to_string(), "unknown app: abc");

        let err = WebdeckError::Surface("embedder gone".into());
        assert_eq!(err.to_string(), "surface error: embedder gone");
    }
}
